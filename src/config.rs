use std::env;

/// Runtime configuration, loaded once at startup from the environment.
///
/// The JWT secret is a base64-encoded symmetric key shared by token signing
/// and verification. It is read exactly once here and never rotated while
/// the process is running.
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Base64-encoded HMAC secret for signing tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_lifetime: i64,
    /// Refresh token lifetime in seconds. Expected to be much larger than
    /// the access token lifetime.
    pub refresh_token_lifetime: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_lifetime: env::var("JWT_ACCESS_LIFETIME")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("JWT_ACCESS_LIFETIME must be a number of seconds"),
            refresh_token_lifetime: env::var("JWT_REFRESH_LIFETIME")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .expect("JWT_REFRESH_LIFETIME must be a number of seconds"),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

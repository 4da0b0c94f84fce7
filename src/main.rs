use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;

use taskboard::auth::{AuthMiddleware, AuthService, InMemoryRefreshStore, TokenCodec, TokenIssuer};
use taskboard::auth::RefreshStore;
use taskboard::config::Config;
use taskboard::routes;
use taskboard::storage::{PgTaskStore, PgUserStore, TaskStore, UserStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let codec = Arc::new(
        TokenCodec::from_base64_secret(&config.jwt_secret)
            .expect("JWT_SECRET must be a valid base64-encoded key"),
    );
    let issuer = TokenIssuer::new(
        codec.clone(),
        config.access_token_lifetime,
        config.refresh_token_lifetime,
    );

    let user_store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let task_store: Arc<dyn TaskStore> = Arc::new(PgTaskStore::new(pool));
    let refresh_store: Arc<dyn RefreshStore> = Arc::new(InMemoryRefreshStore::new());
    let auth_service = web::Data::new(AuthService::new(
        user_store.clone(),
        issuer,
        refresh_store,
    ));

    log::info!("Starting taskboard server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(auth_service.clone())
            .app_data(web::Data::from(user_store.clone()))
            .app_data(web::Data::from(task_store.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(codec.clone()))
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}

//! Persistence seams for users and tasks.
//!
//! The auth core and the handlers consume these narrow traits only; the
//! Postgres implementations live in [`postgres`] and in-memory doubles for
//! tests and local runs in [`memory`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskFilter, User};

pub use memory::{InMemoryTaskStore, InMemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

/// Owns user identities. The auth core reads identities and delegates
/// creation here; a duplicate username surfaces as `AppError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn save(&self, user: User) -> Result<User, AppError>;
    async fn exists(&self, username: &str) -> Result<bool, AppError>;
}

/// Owns task records and their filtered, paginated listings.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> Result<Task, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    async fn update(&self, task: &Task) -> Result<(), AppError>;
    /// Returns whether a row was actually deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    /// Tasks authored by `username`, narrowed by `filter`.
    async fn list_authored(&self, username: &str, filter: &TaskFilter)
        -> Result<Vec<Task>, AppError>;
    /// Tasks assigned to `username` as executor, narrowed by `filter`.
    async fn list_assigned(&self, username: &str, filter: &TaskFilter)
        -> Result<Vec<Task>, AppError>;
}

//! In-memory store implementations. The integration tests run the full
//! actix app against these, and they are handy for running the server
//! without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskFilter, User};
use crate::storage::{TaskStore, UserStore};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users.get(username).cloned())
    }

    async fn save(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().expect("user store lock poisoned");
        if users.contains_key(&user.username) {
            return Err(AppError::Conflict(format!(
                "User with username '{}' already exists",
                user.username
            )));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn exists(&self, username: &str) -> Result<bool, AppError> {
        let users = self.users.read().expect("user store lock poisoned");
        Ok(users.contains_key(username))
    }
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(task: &Task, filter: &TaskFilter) -> bool {
        if let Some(title) = &filter.title {
            if !task.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = filter.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(executor) = &filter.executor {
            if &task.executor != executor {
                return false;
            }
        }
        true
    }

    fn list_where(
        &self,
        filter: &TaskFilter,
        scope: impl Fn(&Task) -> bool,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().expect("task store lock poisoned");
        let mut matched: Vec<Task> = tasks
            .values()
            .filter(|t| scope(t) && Self::matches(t, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.title.cmp(&b.title));
        // Saturate: an absurd page number means an empty page, not overflow.
        Ok(matched
            .into_iter()
            .skip(filter.page.saturating_mul(filter.size) as usize)
            .take(filter.size as usize)
            .collect())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().expect("task store lock poisoned");
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().expect("task store lock poisoned");
        Ok(tasks.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> Result<(), AppError> {
        let mut tasks = self.tasks.write().expect("task store lock poisoned");
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().expect("task store lock poisoned");
        Ok(tasks.remove(&id).is_some())
    }

    async fn list_authored(
        &self,
        username: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        self.list_where(filter, |t| t.author == username)
    }

    async fn list_assigned(
        &self,
        username: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        self.list_where(filter, |t| t.executor == username)
    }
}

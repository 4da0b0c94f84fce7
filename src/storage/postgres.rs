use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, Task, TaskFilter, User};
use crate::storage::{TaskStore, UserStore};

/// User persistence backed by the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    roles: Vec<String>,
}

impl UserRow {
    fn into_user(self) -> Result<User, AppError> {
        let roles = self
            .roles
            .iter()
            .map(|r| {
                Role::parse(r)
                    .ok_or_else(|| AppError::DatabaseError(format!("Unknown role '{}'", r)))
            })
            .collect::<Result<HashSet<Role>, AppError>>()?;
        Ok(User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            roles,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, roles FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn save(&self, user: User) -> Result<User, AppError> {
        let roles: Vec<String> = user.roles.iter().map(|r| r.as_str().to_owned()).collect();
        // A concurrent insert of the same username trips the unique index,
        // which From<sqlx::Error> maps to Conflict.
        sqlx::query("INSERT INTO users (id, username, password_hash, roles) VALUES ($1, $2, $3, $4)")
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&roles)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    async fn exists(&self, username: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

/// Task persistence backed by the `tasks` table.
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the filtered listing query. `anchor_column` is the column the
    /// listing is scoped by: `author` for owned tasks, `executor` for
    /// assigned ones. Conditions are appended dynamically with positional
    /// parameters, in the same order the values are bound below.
    async fn list_by(
        &self,
        anchor_column: &str,
        username: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        let mut sql = format!(
            "SELECT id, title, description, status, priority, comments, author, executor \
             FROM tasks WHERE {} = $1",
            anchor_column
        );
        let mut param_count = 2;

        if filter.title.is_some() {
            sql.push_str(&format!(" AND title ILIKE ${}", param_count));
            param_count += 1;
        }
        if filter.status.is_some() {
            sql.push_str(&format!(" AND status = ${}", param_count));
            param_count += 1;
        }
        if filter.priority.is_some() {
            sql.push_str(&format!(" AND priority = ${}", param_count));
            param_count += 1;
        }
        if filter.executor.is_some() {
            sql.push_str(&format!(" AND executor = ${}", param_count));
            param_count += 1;
        }
        sql.push_str(&format!(
            " ORDER BY title LIMIT ${} OFFSET ${}",
            param_count,
            param_count + 1
        ));

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(username);
        if let Some(title) = &filter.title {
            query = query.bind(format!("%{}%", title));
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(priority) = filter.priority {
            query = query.bind(priority);
        }
        if let Some(executor) = &filter.executor {
            query = query.bind(executor);
        }
        // Saturate: an absurd page number means an empty page, not overflow.
        query = query
            .bind(filter.size)
            .bind(filter.page.saturating_mul(filter.size));

        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: Task) -> Result<Task, AppError> {
        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, priority, comments, author, executor) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(&task.comments)
        .bind(&task.author)
        .bind(&task.executor)
        .execute(&self.pool)
        .await?;
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, title, description, status, priority, comments, author, executor \
             FROM tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE tasks SET title = $1, description = $2, status = $3, priority = $4, \
             comments = $5, executor = $6 WHERE id = $7",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(&task.comments)
        .bind(&task.executor)
        .bind(task.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_authored(
        &self,
        username: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        self.list_by("author", username, filter).await
    }

    async fn list_assigned(
        &self,
        username: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, AppError> {
        self.list_by("executor", username, filter).await
    }
}

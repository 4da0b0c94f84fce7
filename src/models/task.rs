use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    InProgress,
    Done,
}

impl Status {
    pub const VALUES: [&'static str; 3] = ["PENDING", "IN_PROGRESS", "DONE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }

    pub fn parse(value: &str) -> Option<Status> {
        match value {
            "PENDING" => Some(Status::Pending),
            "IN_PROGRESS" => Some(Status::InProgress),
            "DONE" => Some(Status::Done),
            _ => None,
        }
    }
}

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Priority {
    pub const VALUES: [&'static str; 3] = ["LOW", "NORMAL", "HIGH"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
        }
    }

    pub fn parse(value: &str) -> Option<Priority> {
        match value {
            "LOW" => Some(Priority::Low),
            "NORMAL" => Some(Priority::Normal),
            "HIGH" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A single failed field check produced by the explicit enum-membership
/// validation below.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A task entity as held by the task store.
///
/// `author` and `executor` are usernames. Ownership for authorization
/// purposes is defined as `task.author == principal.username`.
#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub comments: Vec<String>,
    pub author: String,
    pub executor: String,
}

impl Task {
    pub fn to_dto(&self) -> TaskDto {
        TaskDto {
            id: Some(self.id),
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status.as_str().to_string(),
            priority: self.priority.as_str().to_string(),
            comments: self.comments.clone(),
            author: Some(self.author.clone()),
            executor: self.executor.clone(),
        }
    }
}

/// Wire representation of a task for create/update requests and responses.
///
/// `status` and `priority` travel as strings and are checked against the
/// allowed value sets by [`TaskDto::parse_enums`]; `author` is always set
/// by the server from the authenticated principal and is ignored on input.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskDto {
    pub id: Option<Uuid>,
    #[validate(length(min = 1, max = 50, message = "Title length must be from 1 to 50 chars"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 256,
        message = "Description length must be from 1 to 256 chars"
    ))]
    pub description: String,
    pub status: String,
    pub priority: String,
    #[serde(default)]
    pub comments: Vec<String>,
    pub author: Option<String>,
    pub executor: String,
}

impl TaskDto {
    /// Checks the enum-typed string fields against their allowed value sets
    /// and returns the parsed pair, or one error per offending field.
    pub fn parse_enums(&self) -> Result<(Status, Priority), Vec<FieldError>> {
        let mut errors = Vec::new();
        let status = Status::parse(&self.status);
        if status.is_none() {
            errors.push(FieldError::new(
                "status",
                format!("Invalid status, expected one of {:?}", Status::VALUES),
            ));
        }
        let priority = Priority::parse(&self.priority);
        if priority.is_none() {
            errors.push(FieldError::new(
                "priority",
                format!("Invalid priority, expected one of {:?}", Priority::VALUES),
            ));
        }
        match (status, priority) {
            (Some(s), Some(p)) => Ok((s, p)),
            _ => Err(errors),
        }
    }
}

/// Payload for appending a comment to a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CommentDto {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Comment length must be from 1 to 255 chars"
    ))]
    pub comment: String,
}

/// The comment list of a task, returned by the comment endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCommentsDto {
    pub id: Uuid,
    pub comments: Vec<String>,
}

/// Query parameters accepted by the task listing endpoints.
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub executor: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Parsed, typed form of [`TaskQuery`] consumed by the task store.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub executor: Option<String>,
    pub page: i64,
    pub size: i64,
}

impl TaskQuery {
    const DEFAULT_PAGE_SIZE: i64 = 20;

    pub fn into_filter(self) -> Result<TaskFilter, AppError> {
        let status = match &self.status {
            Some(s) => Some(
                Status::parse(s)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid status '{}'", s)))?,
            ),
            None => None,
        };
        let priority = match &self.priority {
            Some(p) => Some(
                Priority::parse(p)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid priority '{}'", p)))?,
            ),
            None => None,
        };
        Ok(TaskFilter {
            title: self.title,
            status,
            priority,
            executor: self.executor,
            page: self.page.unwrap_or(0).max(0),
            size: self
                .size
                .unwrap_or(Self::DEFAULT_PAGE_SIZE)
                .clamp(1, 100),
        })
    }
}

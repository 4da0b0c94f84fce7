use crate::{
    auth::{is_admin, is_owner, AuthenticatedPrincipal},
    error::AppError,
    models::{CommentDto, Task, TaskCommentsDto, TaskDto, TaskQuery},
    storage::{TaskStore, UserStore},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

const FORBIDDEN_MSG: &str = "You do not have permission to access this resource";

async fn require_executor(users: &web::Data<dyn UserStore>, username: &str) -> Result<(), AppError> {
    if users.exists(username).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!(
            "User with username '{}' not found",
            username
        )))
    }
}

async fn find_task(tasks: &web::Data<dyn TaskStore>, id: Uuid) -> Result<Task, AppError> {
    tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))
}

/// Creates a new task. Admin only.
///
/// The authenticated principal becomes the task's author; the executor
/// must name an existing user.
#[post("")]
pub async fn create_task(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    body: web::Json<TaskDto>,
) -> Result<impl Responder, AppError> {
    if !is_admin(&principal) {
        return Err(AppError::Forbidden(FORBIDDEN_MSG.into()));
    }
    body.validate()?;
    let (status, priority) = body.parse_enums()?;
    require_executor(&users, &body.executor).await?;

    let task = Task {
        id: Uuid::new_v4(),
        title: body.title.clone(),
        description: body.description.clone(),
        status,
        priority,
        comments: body.comments.clone(),
        author: principal.username.clone(),
        executor: body.executor.clone(),
    };
    let created = tasks.insert(task).await?;
    Ok(HttpResponse::Created().json(created.to_dto()))
}

/// Lists tasks authored by the current user, filtered and paginated.
#[get("/my")]
pub async fn my_tasks(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.into_inner().into_filter()?;
    let list = tasks.list_authored(&principal.username, &filter).await?;
    Ok(HttpResponse::Ok().json(list.iter().map(Task::to_dto).collect::<Vec<_>>()))
}

/// Lists tasks assigned to the current user as executor, filtered and
/// paginated.
#[get("/assigned")]
pub async fn assigned_tasks(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.into_inner().into_filter()?;
    let list = tasks.list_assigned(&principal.username, &filter).await?;
    Ok(HttpResponse::Ok().json(list.iter().map(Task::to_dto).collect::<Vec<_>>()))
}

/// Retrieves a task by id. Owner or admin.
#[get("/{id}")]
pub async fn get_task(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = find_task(&tasks, task_id.into_inner()).await?;
    if is_owner(&principal, &task) || is_admin(&principal) {
        Ok(HttpResponse::Ok().json(task.to_dto()))
    } else {
        Err(AppError::Forbidden(FORBIDDEN_MSG.into()))
    }
}

/// Updates a task with field-level permissions.
///
/// Admins may change status, priority, executor and comments. The owner
/// may change status and comments only; priority and executor values in
/// the payload are ignored for owners. Anyone else is refused.
#[put("/{id}")]
pub async fn update_task(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    users: web::Data<dyn UserStore>,
    task_id: web::Path<Uuid>,
    body: web::Json<TaskDto>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let (status, priority) = body.parse_enums()?;
    let mut task = find_task(&tasks, task_id.into_inner()).await?;

    if is_admin(&principal) {
        require_executor(&users, &body.executor).await?;
        task.status = status;
        task.priority = priority;
        task.executor = body.executor.clone();
        task.comments = body.comments.clone();
    } else if is_owner(&principal, &task) {
        task.status = status;
        task.comments = body.comments.clone();
    } else {
        return Err(AppError::Forbidden(FORBIDDEN_MSG.into()));
    }

    tasks.update(&task).await?;
    Ok(HttpResponse::Ok().json(task.to_dto()))
}

/// Deletes a task by id. Admin only.
#[delete("/{id}")]
pub async fn delete_task(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    if !is_admin(&principal) {
        return Err(AppError::Forbidden(FORBIDDEN_MSG.into()));
    }
    let id = task_id.into_inner();
    if !tasks.delete(id).await? {
        return Err(AppError::NotFound(format!("Task with id {} not found", id)));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Retrieves the comments of a task. Owner or admin.
#[get("/{id}/comments")]
pub async fn get_task_comments(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = find_task(&tasks, task_id.into_inner()).await?;
    if is_owner(&principal, &task) || is_admin(&principal) {
        Ok(HttpResponse::Ok().json(TaskCommentsDto {
            id: task.id,
            comments: task.comments,
        }))
    } else {
        Err(AppError::Forbidden(FORBIDDEN_MSG.into()))
    }
}

/// Appends a comment to a task. Owner or admin; the permission check runs
/// before anything is written.
#[post("/{id}/comments")]
pub async fn add_task_comment(
    principal: AuthenticatedPrincipal,
    tasks: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    body: web::Json<CommentDto>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let mut task = find_task(&tasks, task_id.into_inner()).await?;
    if !is_owner(&principal, &task) && !is_admin(&principal) {
        return Err(AppError::Forbidden(FORBIDDEN_MSG.into()));
    }

    task.comments.push(body.comment.clone());
    tasks.update(&task).await?;
    Ok(HttpResponse::Ok().json(TaskCommentsDto {
        id: task.id,
        comments: task.comments,
    }))
}

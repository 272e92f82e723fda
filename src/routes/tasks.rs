use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, Pagination, TaskFilter, TaskListQuery, UpdateTaskRequest},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Lists the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `search` (optional): text matched case-insensitively against title and description.
/// - `status` (optional): `all` (default), `pending` or `done`.
/// - `page` (optional): 1-based page number, default 1.
/// - `limit` (optional): page size between 1 and 100, default 10.
///
/// ## Responses:
/// - `200 OK`: `{ "tasks": [...], "pagination": { page, limit, total, totalPages } }`.
/// - `400 Bad Request`: out-of-range or malformed query parameters.
/// - `401 Unauthorized`: no valid session.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query_params: web::Query<TaskListQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter::try_from(query_params.into_inner())?;
    let page = state.tasks.list_tasks(user.id(), &filter).await?;

    Ok(HttpResponse::Ok().json(json!({
        "tasks": page.tasks,
        "pagination": Pagination::new(&filter, page.total),
    })))
}

/// Creates a task owned by the authenticated user.
///
/// `title` and `description` are required; `status` defaults to `pending`.
/// Answers `201 Created` with `{ "task": ... }`.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<CreateTaskRequest>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let new_task = task_data.into_inner().into_new_task()?;
    let task = state.tasks.create_task(user.id(), new_task).await?;

    log::debug!("user {} created task {}", user.id(), task.id);
    Ok(HttpResponse::Created().json(json!({ "task": task })))
}

/// Per-status counts and completion rate for the authenticated user.
#[get("/stats")]
pub async fn get_task_stats(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let stats = state.tasks.task_stats(user.id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "stats": stats })))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{ "task": ... }`.
/// - `401 Unauthorized`: no valid session.
/// - `404 Not Found`: the task does not exist or belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .find_task(task_id.into_inner(), user.id())
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

/// Partially updates a task.
///
/// The body may carry any subset of `title`, `description` and `status`, but at
/// least one of them (`400` otherwise). Not-owned tasks answer `404`.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let update = task_data.into_inner().into_update()?;
    let task = state
        .tasks
        .update_task(task_id.into_inner(), user.id(), &update)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

/// Deletes a task by its ID.
///
/// ## Responses:
/// - `200 OK`: `{ "message": "Task deleted successfully" }`.
/// - `401 Unauthorized`: no valid session.
/// - `404 Not Found`: the task does not exist or belongs to another user.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    if !state.tasks.delete_task(task_id.into_inner(), user.id()).await? {
        return Err(task_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}

// rest/routes/tasks.rs — Task CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::storage::{StoreError, Task};
use crate::AppContext;

type HandlerError = (StatusCode, Json<Value>);

/// Map a store failure to its HTTP response: duplicate id → 400, missing id
/// → 404, anything else → 500 with a generic body (the detail is logged, not
/// returned).
fn store_error_response(err: StoreError) -> HandlerError {
    match err {
        StoreError::DuplicateId(_) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() })))
        }
        StoreError::NotFound(_) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() })))
        }
        StoreError::Database(e) => {
            error!("storage failure: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
        }
    }
}

fn validate_name(name: &str) -> Result<(), HandlerError> {
    if name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "task name must not be empty" })),
        ));
    }
    Ok(())
}

pub async fn list_tasks(State(ctx): State<AppContext>) -> Result<Json<Value>, HandlerError> {
    let page = ctx.store.list_all().await.map_err(store_error_response)?;
    if page.skipped > 0 {
        warn!("task listing skipped {} undecodable row(s)", page.skipped);
    }
    Ok(Json(json!({ "tasks": page.tasks })))
}

pub async fn add_task(
    State(ctx): State<AppContext>,
    Json(task): Json<Task>,
) -> Result<Json<Value>, HandlerError> {
    validate_name(&task.name)?;
    ctx.store.create(&task).await.map_err(store_error_response)?;
    Ok(Json(json!({ "message": "new task added successfully" })))
}

pub async fn update_task(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(mut task): Json<Task>,
) -> Result<Json<Value>, HandlerError> {
    validate_name(&task.name)?;
    // The path id wins over whatever the body carries.
    task.id = id;
    ctx.store.update(&task).await.map_err(store_error_response)?;
    Ok(Json(json!({ "message": format!("task {id} is updated successfully") })))
}

pub async fn delete_task(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, HandlerError> {
    ctx.store.delete(id).await.map_err(store_error_response)?;
    Ok(Json(json!({ "message": format!("task {id} deleted successfully") })))
}

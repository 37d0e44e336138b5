use axum::{extract::State, http::StatusCode, routing::{delete, post}, Json, Router};

use crate::application::todo_service::{
    CreateTodoRequest, CreateTodoResponse, FindTodoRequest, FindTodoResponse, TodoService, UpdateTodoRequest,
};
use crate::domain::todo::{TodoId, TodoStatus};
use crate::http::types::{ApiError, AppJson, CreateTodoBody, DeleteTodoBody, FindTodoBody, UpdateTodoBody};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

/// Todo endpoints, meant to be nested under `/api/v1`.
pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/create-todo", post(create_todo::<S>))
        .route("/find-todo", post(find_todo::<S>))
        .route("/update-todo", post(update_todo::<S>))
        .route("/delete-todo", delete(delete_todo::<S>))
        .with_state(state)
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    AppJson(body): AppJson<CreateTodoBody>,
) -> Result<Json<CreateTodoResponse>, ApiError> {
    let input = CreateTodoRequest {
        title: body.title,
        description: body.description,
        status: body.status.unwrap_or_else(|| TodoStatus::default().to_string()),
        due_date: body.due_date,
    };
    Ok(Json(state.service.create(input).await?))
}

async fn find_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    AppJson(body): AppJson<FindTodoBody>,
) -> Result<Json<FindTodoResponse>, ApiError> {
    let input = FindTodoRequest {
        keyword: body.keyword,
        status: body.status,
        created_from: body.created_from,
        created_to: body.created_to,
        due_from: body.due_from,
        due_to: body.due_to,
        pagination: body.pagination.into(),
    };
    Ok(Json(state.service.find(input).await?))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    AppJson(body): AppJson<UpdateTodoBody>,
) -> Result<StatusCode, ApiError> {
    let input = UpdateTodoRequest {
        id: TodoId(body.id),
        title: body.title,
        description: body.description,
        status: body.status,
        due_date: body.due_date,
    };
    state.service.update(input).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    AppJson(body): AppJson<DeleteTodoBody>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(TodoId(body.id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

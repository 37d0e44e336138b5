use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::repository::{PageRequest, TodoQuery, TodoRepository};
use crate::domain::todo::{Todo, TodoId, TodoStatus, ValidationError};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Failure categories of the todo use cases. The HTTP layer picks a status
/// code by variant.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation fail: {0}")]
    Validation(#[from] ValidationError),
    #[error("not found: todo {0}")]
    NotFound(TodoId),
    #[error("internal fail: {0:#}")]
    Internal(anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CreateTodoResponse {
    pub id: TodoId,
}

#[derive(Debug, Clone, Default)]
pub struct FindTodoRequest {
    pub keyword: Option<String>,
    /// Unrecognized values are dropped, not rejected.
    pub status: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindTodoResponse {
    pub todos: Vec<TodoItem>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TodoItem {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoItem {
    fn from(t: Todo) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            due_date: t.due_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Partial update. `title` is always replaced; for the other fields `None`
/// keeps the stored value. An empty `description` clears it.
#[derive(Debug, Clone)]
pub struct UpdateTodoRequest {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, input: CreateTodoRequest) -> ServiceResult<CreateTodoResponse>;
    async fn find(&self, input: FindTodoRequest) -> ServiceResult<FindTodoResponse>;
    async fn update(&self, input: UpdateTodoRequest) -> ServiceResult<()>;
    async fn delete(&self, id: TodoId) -> ServiceResult<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

fn require_id(id: TodoId) -> ServiceResult<()> {
    if id.0 <= 0 { Err(ValidationError::MissingId.into()) } else { Ok(()) }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, input: CreateTodoRequest) -> ServiceResult<CreateTodoResponse> {
        let status: TodoStatus = input.status.parse()?;
        let todo = Todo::new(input.title, input.description, Some(status), input.due_date)?;
        let created = self.repo.create(todo).await.map_err(ServiceError::Internal)?;
        tracing::info!(id = %created.id, "todo created");
        Ok(CreateTodoResponse { id: created.id })
    }

    async fn find(&self, input: FindTodoRequest) -> ServiceResult<FindTodoResponse> {
        let page = input.pagination;
        if page.page < 1 {
            return Err(ValidationError::PageOutOfRange.into());
        }
        if page.page_size < 1 || page.page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::PageSizeOutOfRange.into());
        }

        let status = match input.status.as_deref() {
            Some(raw) => match raw.parse::<TodoStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    tracing::debug!(status = raw, "ignoring unknown status filter");
                    None
                }
            },
            None => None,
        };
        let query = TodoQuery {
            keyword: input.keyword.filter(|k| !k.is_empty()),
            status,
            created_from: input.created_from,
            created_to: input.created_to,
            due_from: input.due_from,
            due_to: input.due_to,
        };

        let result = self.repo.list(&query, &page).await.map_err(ServiceError::Internal)?;
        Ok(FindTodoResponse {
            todos: result.rows.into_iter().map(TodoItem::from).collect(),
            pagination: PageInfo {
                page: page.page,
                page_size: page.page_size,
                total_count: result.total_rows,
                total_pages: result.total_pages,
            },
        })
    }

    async fn update(&self, input: UpdateTodoRequest) -> ServiceResult<()> {
        require_id(input.id)?;
        let status = input.status.as_deref().map(str::parse::<TodoStatus>).transpose()?;

        let Some(mut todo) = self.repo.get_by_id(input.id).await.map_err(ServiceError::Internal)? else {
            return Err(ServiceError::NotFound(input.id));
        };

        todo.title = input.title;
        if let Some(d) = input.description { todo.description = if d.is_empty() { None } else { Some(d) }; }
        if let Some(s) = status { todo.status = s; }
        if let Some(due) = input.due_date { todo.due_date = Some(due); }

        let now = Utc::now();
        todo.validate_at(now)?;
        todo.updated_at = now;

        let affected = self.repo.update(&todo).await.map_err(ServiceError::Internal)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(input.id));
        }
        tracing::info!(id = %todo.id, "todo updated");
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> ServiceResult<()> {
        require_id(id)?;
        let affected = self.repo.delete(id).await.map_err(ServiceError::Internal)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(id));
        }
        tracing::info!(%id, "todo deleted");
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::todo::{Todo, TodoId, TodoStatus};

/// Filters for listing todos. Every range bound is exclusive and every read
/// ignores soft-deleted rows.
#[derive(Debug, Clone, Default)]
pub struct TodoQuery {
    pub keyword: Option<String>,
    pub status: Option<TodoStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Title,
    Status,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Status => "status",
            SortField::DueDate => "due_date",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self { SortOrder::Asc => "ASC", SortOrder::Desc => "DESC" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl PageRequest {
    pub fn offset(&self) -> u64 { u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size) }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, page_size: 10, sort_by: SortField::default(), sort_order: SortOrder::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoPage {
    pub rows: Vec<Todo>,
    pub total_rows: u64,
    pub total_pages: u64,
}

impl TodoPage {
    pub fn new(rows: Vec<Todo>, total_rows: u64, page_size: u32) -> Self {
        let total_pages = if page_size == 0 { 0 } else { total_rows.div_ceil(u64::from(page_size)) };
        Self { rows, total_rows, total_pages }
    }
}

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    /// Inserts the todo and returns it with the store-assigned id.
    async fn create(&self, todo: Todo) -> anyhow::Result<Todo>;
    /// `None` for missing and for soft-deleted rows.
    async fn get_by_id(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
    /// Overwrites a live row; never inserts. Returns rows affected.
    async fn update(&self, todo: &Todo) -> anyhow::Result<u64>;
    /// Soft delete. Returns rows affected, zero when missing or already deleted.
    async fn delete(&self, id: TodoId) -> anyhow::Result<u64>;
    async fn count(&self, query: &TodoQuery) -> anyhow::Result<u64>;
    async fn list(&self, query: &TodoQuery, page: &PageRequest) -> anyhow::Result<TodoPage>;
}

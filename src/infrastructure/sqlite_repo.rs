use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, QueryBuilder, Row, Sqlite,
};

use crate::domain::{
    repository::{PageRequest, SortField, TodoPage, TodoQuery, TodoRepository},
    todo::{Todo, TodoId, TodoStatus},
};

const COLUMNS: &str = "id, title, description, status, due_date, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    /// Opens a pool, creating the database file when needed. In-memory
    /// databases live per connection, so they get a single long-lived one.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true);
        let in_memory = database_url.contains(":memory:");
        let mut pool = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        pool = if in_memory {
            pool.max_connections(1).min_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            pool.max_connections(max_connections.max(1))
        };
        let pool = pool.connect_with(options).await.context("failed to connect to database")?;
        tracing::debug!(url = database_url, "database pool ready");
        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .context("failed to run database migrations")?;
        tracing::info!("database migration completed");
        Ok(())
    }

    async fn create(&self, mut todo: Todo) -> Result<Todo> {
        let result = sqlx::query(
            "INSERT INTO todos (title, description, status, due_date, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.status.as_str())
        .bind(todo.due_date.map(encode_time))
        .bind(encode_time(todo.created_at))
        .bind(encode_time(todo.updated_at))
        .bind(todo.deleted_at.map(encode_time))
        .execute(&*self.pool)
        .await
        .context("failed to create todo")?;
        todo.id = TodoId(result.last_insert_rowid());
        Ok(todo)
    }

    async fn get_by_id(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?1 AND deleted_at IS NULL"))
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await
            .with_context(|| format!("failed to get todo by id {id}"))?;
        row.map(row_to_todo).transpose()
    }

    async fn update(&self, todo: &Todo) -> Result<u64> {
        anyhow::ensure!(todo.id.0 != 0, "todo id cannot be 0");
        let result = sqlx::query(
            "UPDATE todos SET title = ?2, description = ?3, status = ?4, due_date = ?5, updated_at = ?6
             WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(todo.id.0)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.status.as_str())
        .bind(todo.due_date.map(encode_time))
        .bind(encode_time(todo.updated_at))
        .execute(&*self.pool)
        .await
        .context("failed to update todo")?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: TodoId) -> Result<u64> {
        let now = encode_time(Utc::now());
        let result = sqlx::query("UPDATE todos SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL")
            .bind(id.0)
            .bind(now)
            .execute(&*self.pool)
            .await
            .context("failed to delete todo")?;
        Ok(result.rows_affected())
    }

    async fn count(&self, query: &TodoQuery) -> Result<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM todos WHERE deleted_at IS NULL");
        push_filters(&mut qb, query);
        let total: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&*self.pool)
            .await
            .context("failed to count todos")?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn list(&self, query: &TodoQuery, page: &PageRequest) -> Result<TodoPage> {
        let total = self.count(query).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM todos WHERE deleted_at IS NULL"));
        push_filters(&mut qb, query);
        // column and direction come from closed enums, never from raw input
        let dir = page.sort_order.keyword();
        qb.push(format!(" ORDER BY {} {dir}", page.sort_by.column()));
        if page.sort_by != SortField::Id {
            // ties on the sort column must not shift rows between pages
            qb.push(format!(", id {dir}"));
        }
        qb.push(" LIMIT ").push_bind(i64::from(page.page_size));
        qb.push(" OFFSET ").push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb.build().fetch_all(&*self.pool).await.context("failed to list todos")?;
        let rows = rows.into_iter().map(row_to_todo).collect::<Result<Vec<_>>>()?;
        Ok(TodoPage::new(rows, total, page.page_size))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &TodoQuery) {
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = query.due_from {
        qb.push(" AND due_date > ").push_bind(encode_time(from));
    }
    if let Some(to) = query.due_to {
        qb.push(" AND due_date < ").push_bind(encode_time(to));
    }
    if let Some(from) = query.created_from {
        qb.push(" AND created_at > ").push_bind(encode_time(from));
    }
    if let Some(to) = query.created_to {
        qb.push(" AND created_at < ").push_bind(encode_time(to));
    }
    if let Some(keyword) = query.keyword.as_deref().filter(|k| !k.is_empty()) {
        let pattern = format!("%{}%", escape_like(keyword));
        qb.push(" AND (title LIKE ").push_bind(pattern.clone());
        qb.push(" ESCAPE '\\' OR description LIKE ").push_bind(pattern);
        qb.push(" ESCAPE '\\')");
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') { out.push('\\'); }
        out.push(c);
    }
    out
}

/// Fixed-width UTC text, so string comparison in SQL matches time order.
fn encode_time(t: DateTime<Utc>) -> String { t.to_rfc3339_opts(SecondsFormat::Micros, true) }

fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw).with_context(|| format!("bad timestamp {raw:?}"))?.with_timezone(&Utc))
}

fn row_to_todo(row: SqliteRow) -> Result<Todo> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let status_str: String = row.try_get("status")?;
    let due_date: Option<String> = row.try_get("due_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let deleted_at: Option<String> = row.try_get("deleted_at")?;

    let status = status_str.parse::<TodoStatus>().unwrap_or_else(|_| {
        tracing::warn!(id, status = %status_str, "unknown stored status, reading as pending");
        TodoStatus::Pending
    });

    Ok(Todo {
        id: TodoId(id),
        title,
        description,
        status,
        due_date: due_date.as_deref().map(decode_time).transpose()?,
        created_at: decode_time(&created_at)?,
        updated_at: decode_time(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(decode_time).transpose()?,
    })
}

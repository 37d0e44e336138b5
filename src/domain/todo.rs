use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TITLE_MAX_CHARS: usize = 20;
pub const DESCRIPTION_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TodoId(pub i64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    #[default]
    Pending,
    Doing,
    Done,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self { TodoStatus::Pending => "pending", TodoStatus::Doing => "doing", TodoStatus::Done => "done" }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TodoStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TodoStatus::Pending),
            "doing" => Ok(TodoStatus::Doing),
            "done" => Ok(TodoStatus::Done),
            _ => Err(ValidationError::InvalidStatus),
        }
    }
}

/// Rule violations raised while building or revalidating a [`Todo`], plus the
/// request-shape checks the use cases perform before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("title cannot exceed 20 characters")]
    TitleTooLong,
    #[error("description cannot exceed 100 characters")]
    DescriptionTooLong,
    #[error("invalid status")]
    InvalidStatus,
    #[error("due date must be in the future")]
    DueDateNotInFuture,
    #[error("id is required")]
    MissingId,
    #[error("page must be at least 1")]
    PageOutOfRange,
    #[error("page size must be between 1 and 100")]
    PageSizeOutOfRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Builds a new, not yet persisted todo. The id stays `0` until the
    /// repository assigns one.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        status: Option<TodoStatus>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        Self::new_at(title, description, status, due_date, Utc::now())
    }

    pub fn new_at(
        title: impl Into<String>,
        description: Option<String>,
        status: Option<TodoStatus>,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let todo = Todo {
            id: TodoId(0),
            title: title.into(),
            description,
            status: status.unwrap_or_default(),
            due_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        todo.validate_at(now)?;
        Ok(todo)
    }

    /// Checks every field rule against `now`. Status is already a closed enum
    /// here, so an invalid status can only surface when parsing it.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong);
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(ValidationError::DescriptionTooLong);
            }
        }
        if let Some(due) = self.due_date {
            if due <= now {
                return Err(ValidationError::DueDateNotInFuture);
            }
        }
        Ok(())
    }

    pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

    pub fn delete(&mut self) {
        let now = Utc::now();
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
        self.updated_at = Utc::now();
    }
}

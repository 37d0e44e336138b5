use axum::extract::{rejection::JsonRejection, FromRequest};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::todo_service::ServiceError;
use crate::domain::repository::{PageRequest, SortField, SortOrder};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody { pub error: String }

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self { Self { status, message: message.into() } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(ErrorBody { error: self.message })).into_response() }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(_) => ApiError::new(StatusCode::BAD_REQUEST, err.to_string()),
            ServiceError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            ServiceError::Internal(cause) => {
                tracing::error!("internal failure: {cause:#}");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "rejected request body");
        ApiError::new(StatusCode::BAD_REQUEST, "invalid request format")
    }
}

/// `Json` whose rejections answer with the API error body and a 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct CreateTodoBody {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindTodoBody {
    pub keyword: Option<String>,
    pub status: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pagination: PaginationBody,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PaginationBody {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for PaginationBody {
    fn default() -> Self {
        let page = PageRequest::default();
        Self { page: page.page, page_size: page.page_size, sort_by: page.sort_by, sort_order: page.sort_order }
    }
}

impl From<PaginationBody> for PageRequest {
    fn from(p: PaginationBody) -> Self {
        PageRequest { page: p.page, page_size: p.page_size, sort_by: p.sort_by, sort_order: p.sort_order }
    }
}

/// Absent optional fields leave the stored value untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateTodoBody {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTodoBody { pub id: i64 }

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub service: &'static str,
    pub build_env: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::{TodoId, ValidationError};

    #[test]
    fn service_errors_map_by_category() {
        let validation: ApiError = ServiceError::Validation(ValidationError::EmptyTitle).into();
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.message, "validation fail: title cannot be empty");

        let missing: ApiError = ServiceError::NotFound(TodoId(9)).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let internal: ApiError = ServiceError::Internal(anyhow::anyhow!("connection refused")).into();
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "internal server error");
    }

    #[test]
    fn find_body_defaults_pagination() {
        let body: FindTodoBody = serde_json::from_str("{}").unwrap();
        let page = PageRequest::from(body.pagination);
        assert_eq!(page, PageRequest::default());

        let body: FindTodoBody =
            serde_json::from_str(r#"{"pagination":{"page":2,"page_size":5,"sort_by":"due_date","sort_order":"asc"}}"#)
                .unwrap();
        let page = PageRequest::from(body.pagination);
        assert_eq!((page.page, page.page_size), (2, 5));
        assert_eq!(page.sort_by, SortField::DueDate);
        assert_eq!(page.sort_order, SortOrder::Asc);

        assert!(serde_json::from_str::<FindTodoBody>(r#"{"pagination":{"sort_by":"password"}}"#).is_err());
    }

    #[test]
    fn update_body_requires_id_and_title() {
        assert!(serde_json::from_str::<UpdateTodoBody>(r#"{"title":"x"}"#).is_err());
        assert!(serde_json::from_str::<UpdateTodoBody>(r#"{"id":1}"#).is_err());
        let body: UpdateTodoBody = serde_json::from_str(r#"{"id":1,"title":"x","description":""}"#).unwrap();
        assert_eq!(body.description.as_deref(), Some(""));
        assert!(body.status.is_none());
    }
}

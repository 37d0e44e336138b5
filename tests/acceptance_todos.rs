use axum::body::to_bytes;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use todolist_service::{
    application::todo_service::TodoServiceImpl,
    domain::{repository::TodoRepository, todo::TodoId},
    http::routing::{self, health, todos},
    infrastructure::sqlite_repo::SqliteTodoRepository,
};

async fn app() -> (Router, SqliteTodoRepository) {
    // use in-memory sqlite for tests
    let repo = SqliteTodoRepository::connect("sqlite::memory:", 1).await.unwrap();
    repo.init().await.unwrap();
    let service = TodoServiceImpl::new(repo.clone());
    let app = routing::app(
        health::router(health::ServiceInfo { build_env: "test".into() }),
        todos::router(todos::AppState { service }),
    );
    (app, repo)
}

#[tokio::test]
async fn acceptance_scenario() {
    let (app, repo) = app().await;

    // create
    let res = request(&app, "POST", "/api/v1/create-todo", Some(json!({ "title": "Buy milk" }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await, json!({ "id": 1 }));

    let stored = repo.get_by_id(TodoId(1)).await.unwrap().unwrap();
    assert_eq!(stored.status.as_str(), "pending");
    assert!(stored.deleted_at.is_none());

    // empty title
    let res = request(&app, "POST", "/api/v1/create-todo", Some(json!({ "title": "" }))).await;
    assert_eq!(res.status(), 400);
    assert_eq!(body_json(res).await, json!({ "error": "validation fail: title cannot be empty" }));

    // bogus status
    let res = request(&app, "POST", "/api/v1/update-todo", Some(json!({ "id": 1, "title": "Buy milk", "status": "bogus" }))).await;
    assert_eq!(res.status(), 400);

    // missing id
    let res = request(&app, "POST", "/api/v1/update-todo", Some(json!({ "id": 999, "title": "x" }))).await;
    assert_eq!(res.status(), 404);

    // update
    let res = request(&app, "POST", "/api/v1/update-todo", Some(json!({ "id": 1, "title": "Buy milk", "status": "doing" }))).await;
    assert_eq!(res.status(), 204);
    assert_eq!(repo.get_by_id(TodoId(1)).await.unwrap().unwrap().status.as_str(), "doing");

    // delete, then update and delete again
    let res = request(&app, "DELETE", "/api/v1/delete-todo", Some(json!({ "id": 1 }))).await;
    assert_eq!(res.status(), 204);
    assert!(repo.get_by_id(TodoId(1)).await.unwrap().is_none());

    let res = request(&app, "POST", "/api/v1/update-todo", Some(json!({ "id": 1, "title": "Buy milk" }))).await;
    assert_eq!(res.status(), 404);

    let res = request(&app, "DELETE", "/api/v1/delete-todo", Some(json!({ "id": 1 }))).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let (app, _) = app().await;

    let res = request(&app, "POST", "/api/v1/create-todo", Some(json!({ "description": "no title" }))).await;
    assert_eq!(res.status(), 400);
    assert_eq!(body_json(res).await, json!({ "error": "invalid request format" }));

    let res = request(&app, "POST", "/api/v1/update-todo", Some(json!({ "title": "no id" }))).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "DELETE", "/api/v1/delete-todo", Some(json!({ "id": 0 }))).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "POST", "/api/v1/find-todo", Some(json!({ "pagination": { "page": 0, "page_size": 10 } }))).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "POST", "/api/v1/find-todo", None).await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn find_filters_and_paginates() {
    let (app, _) = app().await;
    let due = (Utc::now() + Duration::days(2)).to_rfc3339();
    for body in [
        json!({ "title": "Buy milk", "description": "whole" }),
        json!({ "title": "Walk dog", "status": "doing", "due_date": due }),
        json!({ "title": "Pay rent", "description": "milk money too", "status": "done" }),
    ] {
        let res = request(&app, "POST", "/api/v1/create-todo", Some(body)).await;
        assert_eq!(res.status(), 200);
    }

    let res = request(&app, "POST", "/api/v1/find-todo", Some(json!({ "pagination": { "page": 1, "page_size": 2 } }))).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    assert_eq!(body["pagination"], json!({ "page": 1, "page_size": 2, "total_count": 3, "total_pages": 2 }));
    assert_eq!(body["todos"].as_array().unwrap().len(), 2);
    assert_eq!(body["todos"][0]["title"], "Pay rent");

    let res = request(&app, "POST", "/api/v1/find-todo", Some(json!({ "keyword": "milk" }))).await;
    let body = body_json(res).await;
    assert_eq!(body["pagination"]["total_count"], 2);

    let res = request(&app, "POST", "/api/v1/find-todo", Some(json!({ "status": "doing" }))).await;
    let body = body_json(res).await;
    assert_eq!(body["pagination"]["total_count"], 1);
    assert_eq!(body["todos"][0]["title"], "Walk dog");
    assert_eq!(body["todos"][0]["status"], "doing");
    assert!(body["todos"][0]["due_date"].is_string());

    // unknown status filters are ignored rather than rejected
    let res = request(&app, "POST", "/api/v1/find-todo", Some(json!({ "status": "bogus" }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await["pagination"]["total_count"], 3);
}

#[tokio::test]
async fn panicking_handler_is_internal_error() {
    let app = routing::app(
        health::router(health::ServiceInfo { build_env: "test".into() }),
        Router::new().route("/boom", get(boom)),
    );

    let res = request(&app, "GET", "/api/v1/boom", None).await;
    assert_eq!(res.status(), 500);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(body_json(res).await, json!({ "error": "internal server error" }));

    // the service keeps answering after a panic
    let res = request(&app, "GET", "/health", None).await;
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn health_and_version() {
    let (app, _) = app().await;

    let res = request(&app, "GET", "/health", None).await;
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(body_json(res).await, json!({ "status": "healthy", "service": "todolist-service" }));

    let res = request(&app, "GET", "/version", None).await;
    let body = body_json(res).await;
    assert_eq!(body["service"], "todolist-service");
    assert_eq!(body["build_env"], "test");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

async fn boom() -> &'static str {
    panic!("boom")
}

async fn body_json(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

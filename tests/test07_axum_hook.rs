#![cfg(all(feature = "sqlite", feature = "axum"))]

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use common::{count_items, sqlite_db};
use sql_request_context::http::{CurrentContext, request_context};
use sql_request_context::prelude::*;
use tower::ServiceExt;

async fn forgets_commit() -> Result<StatusCode, SqlContextError> {
    executor::run("BEGIN", &[]).await?;
    executor::run("INSERT INTO items (name) VALUES ('forgotten')", &[]).await?;
    Ok(StatusCode::CREATED)
}

async fn commits(CurrentContext(ctx): CurrentContext) -> Result<StatusCode, SqlContextError> {
    ctx.begin_transaction().await?;
    ctx.run("INSERT INTO items (name) VALUES ('saved')", &[]).await?;
    ctx.commit().await?;
    Ok(StatusCode::CREATED)
}

async fn count() -> Result<String, SqlContextError> {
    let rs = executor::all("SELECT name FROM items", &[]).await?;
    Ok(rs.len().to_string())
}

fn app(db: Database) -> Router {
    Router::new()
        .route("/forget", post(forgets_commit))
        .route("/commit", post(commits))
        .route("/count", get(count))
        .layer(from_fn_with_state(db, request_context))
}

fn post_to(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn middleware_scopes_each_request() -> Result<(), SqlContextError> {
    let t = sqlite_db(2).await?;
    let app = app(t.db.clone());

    let response = app.clone().oneshot(post_to("/forget")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(t.db.state().leased(), 0);
    assert_eq!(count_items(&t.db).await?, 0);

    let response = app.clone().oneshot(post_to("/commit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(Request::builder().uri("/count").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"1");
    Ok(())
}

#[tokio::test]
async fn routes_without_middleware_report_missing_context() {
    let app: Router = Router::new().route("/count", get(count));

    let response = app
        .oneshot(Request::builder().uri("/count").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "configuration_error");
}

//! axum integration: one request context per HTTP request.
//!
//! ```rust,no_run
//! use axum::{Router, middleware, routing::post};
//! use sql_request_context::http::{CurrentContext, request_context};
//! use sql_request_context::prelude::*;
//!
//! async fn create_note(CurrentContext(ctx): CurrentContext) -> Result<String, SqlContextError> {
//!     ctx.run("BEGIN", &[]).await?;
//!     let res = ctx
//!         .run("INSERT INTO notes (body) VALUES (?1)", &[RowValues::Text("hi".into())])
//!         .await?;
//!     ctx.run("COMMIT", &[]).await?;
//!     Ok(format!("{:?}", res.id))
//! }
//!
//! # async fn demo(db: Database) {
//! let app: Router = Router::new()
//!     .route("/notes", post(create_note))
//!     .layer(middleware::from_fn_with_state(db.clone(), request_context));
//! # let _ = app;
//! # }
//! ```

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::context::{self, RequestContext};
use crate::database::Database;
use crate::error::SqlContextError;

/// Middleware that runs the rest of the stack inside [`Database::scope`].
///
/// Install with `axum::middleware::from_fn_with_state(db, request_context)`. Whatever the
/// handler leaves open is rolled back once the response has been produced, or when the
/// request future is dropped because the client went away.
pub async fn request_context(
    State(db): State<Database>,
    request: Request,
    next: Next,
) -> Response {
    db.scope(next.run(request)).await
}

/// Extractor for the current request's context.
///
/// Rejects with a 500 when the [`request_context`] middleware is missing from the route.
#[derive(Debug, Clone)]
pub struct CurrentContext(pub Arc<RequestContext>);

impl<S> FromRequestParts<S> for CurrentContext
where
    S: Send + Sync,
{
    type Rejection = SqlContextError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context::current().map(Self)
    }
}

impl IntoResponse for SqlContextError {
    fn into_response(self) -> Response {
        let kind = match &self {
            Self::MissingContext | Self::ConfigError(_) => "configuration_error",
            Self::ContextClosed => "context_closed",
            Self::ConnectionError(_) => "connection_error",
            _ => "database_error",
        };
        tracing::error!(error = %self, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": kind, "message": self.to_string() })),
        )
            .into_response()
    }
}

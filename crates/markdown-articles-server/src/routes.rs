//! Axum router for the article endpoints.
//!
//! # Routes
//! - `GET {route}` - current document as JSON
//! - `POST {route}` - signed webhook that triggers a refresh
//! - `GET /health` - liveness probe

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::service::{ArticleService, RefreshError};
use crate::signature::{SignatureError, SignatureVerifier};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ArticleService>,
    pub verifier: Arc<SignatureVerifier>,
    pub signature_header: HeaderName,
}

pub fn router(state: AppState, route: &str) -> Router {
    Router::new()
        .route(route, get(get_articles).post(update_articles))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_articles(State(state): State<AppState>) -> Response {
    let document = state.service.current();
    Json(&*document).into_response()
}

async fn update_articles(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), UpdateError> {
    let signature = headers
        .get(&state.signature_header)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| SignatureError::MissingHeader(state.signature_header.to_string()))?;

    state.verifier.verify(&body, signature)?;
    state.service.refresh().await?;

    Ok((StatusCode::ACCEPTED, "Articles Updated Successfully"))
}

async fn health() -> &'static str {
    "ok"
}

/// Failure of the webhook endpoint, rendered as a plain-text diagnostic.
#[derive(Debug)]
pub enum UpdateError {
    Signature(SignatureError),
    Refresh(RefreshError),
}

impl From<SignatureError> for UpdateError {
    fn from(err: SignatureError) -> Self {
        Self::Signature(err)
    }
}

impl From<RefreshError> for UpdateError {
    fn from(err: RefreshError) -> Self {
        Self::Refresh(err)
    }
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            UpdateError::Signature(err) => {
                tracing::warn!(error = %err, "rejected webhook call");
                (StatusCode::UNAUTHORIZED, err.to_string())
            }
            UpdateError::Refresh(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
        };

        (status, format!("Articles Update Failed: {message}")).into_response()
    }
}

//! HTTP handlers

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// Assemble the control API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/pipelines", post(create_pipeline))
        .route("/pipelines/{id}", get(get_pipeline))
        .with_state(state)
}

/// `POST /pipelines` — create, persist and launch a pipeline
async fn create_pipeline(State(state): State<AppState>, body: Bytes) -> Response {
    if body.is_empty() {
        tracing::error!("empty pipeline config received");
        return ApiError::BadRequest("no pipeline config received".to_string()).into_response();
    }

    let pipeline = match state.manager.new_pipeline(&body).await {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            tracing::error!(error = %e, "error creating pipeline");
            return ApiError::from(e).into_response();
        }
    };

    let id = pipeline.id();
    state.track(Arc::clone(&pipeline)).await;
    tokio::spawn(async move {
        if let Err(e) = pipeline.start().await {
            tracing::error!(pipeline = %pipeline.id(), error = %e, "pipeline failed to start");
        }
    });

    (StatusCode::CREATED, id.to_string()).into_response()
}

/// `GET /pipelines/{id}` — fetch a stored pipeline config verbatim
async fn get_pipeline(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.manager.get(id.as_bytes()).await {
        Ok(raw) if raw.is_empty() => ApiError::NotFound.into_response(),
        Ok(raw) => (StatusCode::OK, raw).into_response(),
        Err(e) => {
            tracing::error!(pipeline = %id, error = %e, "error fetching pipeline");
            ApiError::Internal(e.to_string()).into_response()
        }
    }
}

//! HTTP admin/query surface over the Strata engine.
//!
//! JSON over HTTP, one route per engine operation: submit, info, cancel,
//! and service state. Everything else (what to submit, when to poll) is
//! the client's business.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strata_core::{CmdletId, CmdletInfo, EngineError};
use strata_engine::Engine;
use tower_http::trace::TraceLayer;

/// Shared state for request handlers: the engine, nothing ambient.
#[derive(Clone)]
pub struct AppState {
    /// The engine every handler delegates to
    pub engine: Arc<Engine>,
}

impl AppState {
    /// State wrapping an engine
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

/// Build the admin router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/cmdlets", post(submit))
        .route("/v1/cmdlets/{id}", get(info))
        .route("/v1/cmdlets/{id}/cancel", post(cancel))
        .route("/v1/service", get(service_state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Submission request body
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Cmdlet spec, e.g. `compress -file /file1 -bufSize 131072`
    pub spec: String,
}

/// Submission response body
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Id of the accepted cmdlet
    pub id: u64,
}

/// Service state response body
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    /// `SAFEMODE` or `ACTIVE`
    pub state: String,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable description
    pub message: String,
}

/// Engine error carried to the HTTP boundary
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Parse { .. } | EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
            EngineError::CapacityExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let id = state.engine.submit(&request.spec)?;
    Ok(Json(SubmitResponse { id: id.as_u64() }))
}

async fn info(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CmdletInfo>, ApiError> {
    let info = state.engine.info(CmdletId::from_raw(id))?;
    Ok(Json(info))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.engine.cancel(CmdletId::from_raw(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn service_state(State(state): State<AppState>) -> Json<ServiceResponse> {
    Json(ServiceResponse {
        state: state.engine.service_state().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::Request;
    use std::io::Write;
    use strata_action::ActionRegistry;
    use strata_engine::EngineConfig;
    use strata_meta::{MemMetaStore, MetaStore};
    use strata_store::{LocalBackend, StorageBackend};
    use tower::util::ServiceExt;

    fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalBackend::new(dir.path().join("fs")).unwrap());
        let mut w = storage.create("/f").unwrap();
        w.write_all(b"payload").unwrap();
        drop(w);

        let engine = Engine::start(
            EngineConfig::default(),
            storage as Arc<dyn StorageBackend>,
            Arc::new(MemMetaStore::new()) as Arc<dyn MetaStore>,
            ActionRegistry::builtin(),
        )
        .unwrap();
        (dir, AppState::new(Arc::new(engine)))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_submit_then_query() {
        let (_dir, state) = test_state();
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/cmdlets")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"spec":"cache -file /f"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let submitted = body_json(response).await;
        let id = submitted["id"].as_u64().unwrap();
        assert_eq!(id, 1);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/v1/cmdlets/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let info = body_json(response).await;
        assert_eq!(info["cmdlet"]["id"].as_u64(), Some(1));
        assert_eq!(info["actions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_service_state_endpoint() {
        let (_dir, state) = test_state();
        let app = router(state);

        let response = app
            .oneshot(Request::builder().uri("/v1/service").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let state = body["state"].as_str().unwrap();
        assert!(state == "SAFEMODE" || state == "ACTIVE");
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let (_dir, state) = test_state();
        let app = router(state);

        // malformed spec -> 400
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/cmdlets")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"spec":"transmogrify -file /f"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"].as_str(), Some("PARSE_ERROR"));

        // unknown id -> 404
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/cmdlets/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_endpoint() {
        let (_dir, state) = test_state();
        let app = router(state.clone());

        let id = state.engine.submit("cache -file /f").unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/v1/cmdlets/{}/cancel", id.as_u64()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

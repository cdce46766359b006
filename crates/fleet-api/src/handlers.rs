//! Control API handlers.
//!
//! Each handler delegates to the control plane and returns a JSON body.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use tracing::{debug, info};

use crate::ApiState;
use crate::responses::{self, KillResponse, ScaleResponse, StatusResponse};

/// Query parameters for `/api/scale`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ScaleParams {
    pub count: Option<usize>,
    pub variant: Option<String>,
}

/// GET /api/status
pub async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(responses::status(&state.plane).await)
}

/// GET|POST /api/scale
pub async fn scale(
    State(state): State<ApiState>,
    params: Result<Query<ScaleParams>, QueryRejection>,
) -> Json<ScaleResponse> {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            debug!(error = %rejection, "rejected scale request");
            return Json(responses::scale_rejected(rejection.body_text()));
        }
    };

    info!(count = ?params.count, variant = ?params.variant, "scale-out requested");
    Json(responses::scale(&state.plane, params.count, params.variant.as_deref()).await)
}

/// GET|POST /api/kill
pub async fn kill(State(state): State<ApiState>) -> Json<KillResponse> {
    info!("fault injection requested");
    Json(responses::kill(&state.plane).await)
}

/// GET /get-data
pub async fn get_data(State(state): State<ApiState>) -> Json<serde_json::Value> {
    match state.probe.fetch().await {
        Ok(body) => Json(body),
        Err(error) => {
            debug!(%error, url = %state.probe.url(), "load balancer unreachable");
            Json(serde_json::json!({
                "served_by_node": "Offline",
                "error": error.to_string(),
            }))
        }
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    "ok"
}

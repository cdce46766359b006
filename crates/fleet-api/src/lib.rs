//! fleet-api — the control API for the fleet control plane.
//!
//! Every operation answers HTTP 200 with a tagged JSON body. Runtime
//! failures become `{"status": "error", "msg": ...}` results and never
//! escape as panics or 5xx responses.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/status` | Live worker census `{count, nodes}` |
//! | GET, POST | `/api/scale?count=&variant=` | Launch workers |
//! | GET, POST | `/api/kill` | Terminate one random worker |
//! | GET | `/get-data` | Forward one request through the load balancer |
//! | GET | `/healthz` | Liveness |

pub mod handlers;
pub mod responses;
pub mod traffic;

use axum::Router;
use axum::routing::get;
use fleet_control::ControlPlane;

pub use responses::{KillResponse, OpStatus, ScaleResponse, StatusResponse};
pub use traffic::{TrafficError, TrafficProbe};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub plane: ControlPlane,
    pub probe: TrafficProbe,
}

/// Build the complete control API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/status", get(handlers::status))
        .route("/api/scale", get(handlers::scale).post(handlers::scale))
        .route("/api/kill", get(handlers::kill).post(handlers::kill))
        .route("/get-data", get(handlers::get_data))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

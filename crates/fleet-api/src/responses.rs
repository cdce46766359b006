//! Response bodies and the operation wrappers that produce them.
//!
//! The wrappers are shared by the HTTP handlers and the `fleetd` one-shot
//! commands, so both surfaces report identical shapes.

use fleet_control::ControlPlane;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpStatus {
    Success,
    Error,
}

/// `ListWorkers` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub count: usize,
    pub nodes: Vec<String>,
}

/// `ScaleOut` result. `launched` is filled on failure too: launched units
/// are never rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleResponse {
    pub status: OpStatus,
    pub msg: String,
    pub launched: Vec<String>,
}

/// `KillRandomWorker` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillResponse {
    pub status: OpStatus,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated: Option<String>,
}

/// Take the census. A runtime failure is logged and reported as an empty pool.
pub async fn status(plane: &ControlPlane) -> StatusResponse {
    match plane.list_workers().await {
        Ok(census) => StatusResponse {
            count: census.len(),
            nodes: census.display_names(),
        },
        Err(e) => {
            warn!(error = %e, "census failed");
            StatusResponse {
                count: 0,
                nodes: Vec::new(),
            }
        }
    }
}

/// Scale out by `count` (default batch when `None`).
pub async fn scale(plane: &ControlPlane, count: Option<usize>, variant: Option<&str>) -> ScaleResponse {
    let count = count.unwrap_or_else(|| plane.default_scale_count());
    let outcome = plane.scale_out(count, variant).await;

    match outcome.error {
        None => ScaleResponse {
            status: OpStatus::Success,
            msg: format!("Launched: {}", outcome.launched.join(", ")),
            launched: outcome.launched,
        },
        Some(e) => ScaleResponse {
            status: OpStatus::Error,
            msg: e.to_string(),
            launched: outcome.launched,
        },
    }
}

pub async fn kill(plane: &ControlPlane) -> KillResponse {
    match plane.kill_random_worker().await {
        Ok(name) => KillResponse {
            status: OpStatus::Success,
            msg: format!("Terminated {name}"),
            terminated: Some(name),
        },
        Err(e) => KillResponse {
            status: OpStatus::Error,
            msg: e.to_string(),
            terminated: None,
        },
    }
}

/// Tagged error for a scale request that could not be parsed.
pub fn scale_rejected(msg: impl Into<String>) -> ScaleResponse {
    ScaleResponse {
        status: OpStatus::Error,
        msg: msg.into(),
        launched: Vec::new(),
    }
}

//! Fleet registry — derives the worker census from runtime state.
//!
//! Membership is never stored. Every query lists the runtime's running
//! units and filters them by name, so the census cannot drift from what
//! the runtime reports. The price is that a unit which is still starting
//! is indistinguishable from a ready one.

use std::sync::Arc;

use fleet_runtime::{RuntimeAdapter, Unit};
use serde::Serialize;
use tracing::debug;

use crate::config::FleetSection;
use crate::error::FleetResult;

/// Name-based worker predicate and display projection.
///
/// The substring rule is a heuristic: a proxy whose name happens to contain
/// the worker marker, but not the frontend marker, is classified as a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    worker_marker: String,
    frontend_marker: String,
    display_prefix: String,
}

impl Membership {
    pub fn new(settings: &FleetSection) -> Self {
        Self {
            worker_marker: settings.worker_marker.clone(),
            frontend_marker: settings.frontend_marker.clone(),
            display_prefix: settings.display_prefix.clone(),
        }
    }

    /// Whether a unit with this name belongs to the worker pool.
    pub fn is_worker(&self, name: &str) -> bool {
        name.contains(&self.worker_marker) && !name.contains(&self.frontend_marker)
    }

    /// Display form of a unit name: deployment prefix removed.
    pub fn display_name(&self, name: &str) -> String {
        if self.display_prefix.is_empty() {
            name.to_string()
        } else {
            name.replace(&self.display_prefix, "")
        }
    }

    /// Display identifier of a unit, falling back to its short id when unnamed.
    pub fn display_unit(&self, unit: &Unit) -> String {
        if unit.name.is_empty() {
            unit.short_id().to_string()
        } else {
            self.display_name(&unit.name)
        }
    }
}

/// One census row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CensusEntry {
    pub id: String,
    pub display_name: String,
}

/// Point-in-time list of live workers, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub entries: Vec<CensusEntry>,
}

impl Census {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display names in discovery order.
    pub fn display_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.display_name.clone()).collect()
    }
}

/// Reads the worker pool from the runtime on every call.
#[derive(Clone)]
pub struct FleetRegistry {
    runtime: Arc<dyn RuntimeAdapter>,
    membership: Membership,
}

impl FleetRegistry {
    pub fn new(runtime: Arc<dyn RuntimeAdapter>, membership: Membership) -> Self {
        Self {
            runtime,
            membership,
        }
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    /// Running units that pass the worker predicate, in runtime order.
    pub async fn worker_units(&self) -> FleetResult<Vec<Unit>> {
        let units = self.runtime.list_running_units().await?;
        let total = units.len();
        let workers: Vec<Unit> = units
            .into_iter()
            .filter(|u| self.membership.is_worker(&u.name))
            .collect();
        debug!(total, workers = workers.len(), "census taken");
        Ok(workers)
    }

    /// The current census. Empty when no workers are running.
    pub async fn list_workers(&self) -> FleetResult<Census> {
        let entries = self
            .worker_units()
            .await?
            .iter()
            .map(|u| CensusEntry {
                id: u.id.clone(),
                display_name: self.membership.display_unit(u),
            })
            .collect();
        Ok(Census { entries })
    }
}

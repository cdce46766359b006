//! Runtime-level domain types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A running (or recently stopped) process instance in the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Runtime-assigned identifier, stable for the unit's lifetime.
    pub id: String,
    /// Operator-assigned or generated name, without any leading `/`.
    pub name: String,
    /// Image reference used to reproduce the unit.
    pub image: String,
    /// Network name → DNS aliases on that network.
    #[serde(default)]
    pub networks: BTreeMap<String, Vec<String>>,
}

impl Unit {
    /// Short form of the runtime id (first 12 characters).
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Whether this unit is attached to `network` under `alias`.
    pub fn has_alias(&self, network: &str, alias: &str) -> bool {
        self.networks
            .get(network)
            .is_some_and(|aliases| aliases.iter().any(|a| a == alias))
    }
}

/// A virtual network segment known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

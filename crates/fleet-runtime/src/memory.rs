//! In-memory runtime adapter (for testing).
//!
//! Behaves like a small container engine: units have running/stopped
//! state, names are unique, removing a running unit is rejected, and every
//! call is appended to a log so tests can assert on call order. Failures can
//! be injected for `run_unit`, `remove_unit`, and listing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::adapter::{RuntimeAdapter, RuntimeFuture};
use crate::error::{RuntimeError, RuntimeResult};
use crate::types::{Network, Unit};

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    ListUnits,
    ListNetworks,
    Run {
        image: String,
        name: String,
        network: Option<String>,
    },
    Connect {
        unit_id: String,
        network_id: String,
        aliases: Vec<String>,
    },
    Stop {
        unit_id: String,
    },
    Remove {
        unit_id: String,
    },
}

struct Slot {
    unit: Unit,
    running: bool,
}

#[derive(Default)]
struct Inner {
    slots: Vec<Slot>,
    networks: Vec<Network>,
    calls: Vec<RuntimeCall>,
    next_id: u64,
    run_calls: usize,
    fail_run_at: Option<usize>,
    fail_connect: bool,
    fail_remove: bool,
    fail_listing: bool,
}

impl Inner {
    fn slot_mut(&mut self, unit_id: &str) -> RuntimeResult<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|s| s.unit.id == unit_id)
            .ok_or_else(|| RuntimeError::UnitNotFound(unit_id.to_string()))
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        // Spread sequential ids so short ids stay distinct and look engine-like.
        let mixed = self.next_id.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        format!("{mixed:016x}{:016x}", self.next_id)
    }
}

/// Thread-safe in-memory runtime. Clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryRuntime {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a network and return its id.
    pub fn add_network(&self, name: &str) -> String {
        let mut inner = self.lock();
        let id = format!("net-{}", inner.networks.len() + 1);
        inner.networks.push(Network {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    /// Register an already running unit (pool initialization) and return its id.
    pub fn add_unit(&self, name: &str, image: &str) -> String {
        let mut inner = self.lock();
        let id = inner.allocate_id();
        inner.slots.push(Slot {
            unit: Unit {
                id: id.clone(),
                name: name.to_string(),
                image: image.to_string(),
                networks: BTreeMap::new(),
            },
            running: true,
        });
        id
    }

    /// Make the `nth` (1-based) call to `run_unit` fail.
    pub fn fail_run_at(&self, nth: usize) {
        self.lock().fail_run_at = Some(nth);
    }

    /// Make every `connect_network` call fail.
    pub fn fail_connect(&self) {
        self.lock().fail_connect = true;
    }

    /// Make every `remove_unit` call fail.
    pub fn fail_remove(&self) {
        self.lock().fail_remove = true;
    }

    /// Make `list_running_units` and `list_networks` fail.
    pub fn fail_listing(&self) {
        self.lock().fail_listing = true;
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.lock().calls.clone()
    }

    /// Every unit the runtime still holds a record for, running or not.
    pub fn all_units(&self) -> Vec<Unit> {
        self.lock().slots.iter().map(|s| s.unit.clone()).collect()
    }

    /// Names of running units in creation order.
    pub fn running_names(&self) -> Vec<String> {
        self.lock()
            .slots
            .iter()
            .filter(|s| s.running)
            .map(|s| s.unit.name.clone())
            .collect()
    }

    /// Look up a unit record by name.
    pub fn unit_by_name(&self, name: &str) -> Option<Unit> {
        self.lock()
            .slots
            .iter()
            .find(|s| s.unit.name == name)
            .map(|s| s.unit.clone())
    }

    /// Whether the named unit exists and is running.
    pub fn is_running(&self, name: &str) -> bool {
        self.lock()
            .slots
            .iter()
            .any(|s| s.unit.name == name && s.running)
    }

    fn list_units_now(&self) -> RuntimeResult<Vec<Unit>> {
        let mut inner = self.lock();
        inner.calls.push(RuntimeCall::ListUnits);
        if inner.fail_listing {
            return Err(RuntimeError::Connect("injected listing failure".to_string()));
        }
        Ok(inner
            .slots
            .iter()
            .filter(|s| s.running)
            .map(|s| s.unit.clone())
            .collect())
    }

    fn list_networks_now(&self) -> RuntimeResult<Vec<Network>> {
        let mut inner = self.lock();
        inner.calls.push(RuntimeCall::ListNetworks);
        if inner.fail_listing {
            return Err(RuntimeError::Connect("injected listing failure".to_string()));
        }
        Ok(inner.networks.clone())
    }

    fn run_now(&self, image: &str, name: &str, network: Option<&str>) -> RuntimeResult<Unit> {
        let mut inner = self.lock();
        inner.calls.push(RuntimeCall::Run {
            image: image.to_string(),
            name: name.to_string(),
            network: network.map(str::to_string),
        });
        inner.run_calls += 1;

        if inner.fail_run_at == Some(inner.run_calls) {
            return Err(RuntimeError::Rejected(format!(
                "injected launch failure for {name}"
            )));
        }
        if inner.slots.iter().any(|s| s.unit.name == name) {
            return Err(RuntimeError::Api {
                status: 409,
                message: format!("Conflict. The container name \"/{name}\" is already in use"),
            });
        }

        let mut networks = BTreeMap::new();
        if let Some(network) = network {
            if !inner.networks.iter().any(|n| n.name == network || n.id == network) {
                return Err(RuntimeError::NetworkNotFound(network.to_string()));
            }
            networks.insert(network.to_string(), Vec::new());
        }

        let unit = Unit {
            id: inner.allocate_id(),
            name: name.to_string(),
            image: image.to_string(),
            networks,
        };
        inner.slots.push(Slot {
            unit: unit.clone(),
            running: true,
        });
        debug!(unit = %name, image, "in-memory unit launched");
        Ok(unit)
    }

    fn connect_now(&self, unit_id: &str, network_id: &str, aliases: &[String]) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(RuntimeCall::Connect {
            unit_id: unit_id.to_string(),
            network_id: network_id.to_string(),
            aliases: aliases.to_vec(),
        });
        if inner.fail_connect {
            return Err(RuntimeError::Rejected("injected connect failure".to_string()));
        }

        let network_name = inner
            .networks
            .iter()
            .find(|n| n.id == network_id)
            .map(|n| n.name.clone())
            .ok_or_else(|| RuntimeError::NetworkNotFound(network_id.to_string()))?;

        let slot = inner.slot_mut(unit_id)?;
        slot.unit
            .networks
            .entry(network_name)
            .or_default()
            .extend(aliases.iter().cloned());
        Ok(())
    }

    fn stop_now(&self, unit_id: &str) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(RuntimeCall::Stop {
            unit_id: unit_id.to_string(),
        });
        inner.slot_mut(unit_id)?.running = false;
        Ok(())
    }

    fn remove_now(&self, unit_id: &str) -> RuntimeResult<()> {
        let mut inner = self.lock();
        inner.calls.push(RuntimeCall::Remove {
            unit_id: unit_id.to_string(),
        });
        if inner.fail_remove {
            return Err(RuntimeError::Rejected("injected remove failure".to_string()));
        }
        if inner.slot_mut(unit_id)?.running {
            return Err(RuntimeError::Api {
                status: 409,
                message: format!("cannot remove running container {unit_id}"),
            });
        }
        inner.slots.retain(|s| s.unit.id != unit_id);
        Ok(())
    }
}

impl RuntimeAdapter for InMemoryRuntime {
    fn list_running_units(&self) -> RuntimeFuture<'_, Vec<Unit>> {
        Box::pin(async move { self.list_units_now() })
    }

    fn list_networks(&self) -> RuntimeFuture<'_, Vec<Network>> {
        Box::pin(async move { self.list_networks_now() })
    }

    fn run_unit<'a>(
        &'a self,
        image: &'a str,
        name: &'a str,
        network: Option<&'a str>,
    ) -> RuntimeFuture<'a, Unit> {
        Box::pin(async move { self.run_now(image, name, network) })
    }

    fn connect_network<'a>(
        &'a self,
        unit_id: &'a str,
        network_id: &'a str,
        aliases: &'a [String],
    ) -> RuntimeFuture<'a, ()> {
        Box::pin(async move { self.connect_now(unit_id, network_id, aliases) })
    }

    fn stop_unit<'a>(&'a self, unit_id: &'a str) -> RuntimeFuture<'a, ()> {
        Box::pin(async move { self.stop_now(unit_id) })
    }

    fn remove_unit<'a>(&'a self, unit_id: &'a str) -> RuntimeFuture<'a, ()> {
        Box::pin(async move { self.remove_now(unit_id) })
    }
}

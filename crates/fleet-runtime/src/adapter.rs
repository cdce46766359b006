//! The runtime adapter trait.
//!
//! Every call is a single request against the host runtime with no
//! timeout, retry, or cancellation. A hung runtime hangs the caller.

use std::future::Future;
use std::pin::Pin;

use crate::error::RuntimeResult;
use crate::types::{Network, Unit};

/// Boxed future alias for runtime adapter results.
pub type RuntimeFuture<'a, T> = Pin<Box<dyn Future<Output = RuntimeResult<T>> + Send + 'a>>;

/// Capability surface over the host container runtime — injected for testability.
pub trait RuntimeAdapter: Send + Sync {
    /// List all currently running units.
    fn list_running_units(&self) -> RuntimeFuture<'_, Vec<Unit>>;

    /// List all virtual networks.
    fn list_networks(&self) -> RuntimeFuture<'_, Vec<Network>>;

    /// Launch a detached unit from `image` under `name`.
    ///
    /// With `network = None` the unit starts on the runtime's default
    /// network only, so no alias resolves to it until `connect_network`.
    fn run_unit<'a>(
        &'a self,
        image: &'a str,
        name: &'a str,
        network: Option<&'a str>,
    ) -> RuntimeFuture<'a, Unit>;

    /// Attach an existing unit to a network under the given DNS aliases.
    fn connect_network<'a>(
        &'a self,
        unit_id: &'a str,
        network_id: &'a str,
        aliases: &'a [String],
    ) -> RuntimeFuture<'a, ()>;

    /// Stop a running unit. Stopping an already stopped unit succeeds.
    fn stop_unit<'a>(&'a self, unit_id: &'a str) -> RuntimeFuture<'a, ()>;

    /// Remove a stopped unit's record from the runtime.
    fn remove_unit<'a>(&'a self, unit_id: &'a str) -> RuntimeFuture<'a, ()>;
}

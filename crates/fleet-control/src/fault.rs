//! Fault injector — terminates one live worker chosen at random.
//!
//! There is no minimum pool size: killing the last worker is allowed and
//! is how total failure is demonstrated. Stop and remove are separate
//! calls; if remove fails after a successful stop, the unit lingers in the
//! runtime as stopped and simply drops out of the next census.

use std::sync::Arc;

use fleet_runtime::RuntimeAdapter;
use tracing::{info, warn};

use crate::error::{FleetError, FleetResult};
use crate::random::RandomProvider;
use crate::registry::FleetRegistry;

pub struct FaultInjector {
    registry: FleetRegistry,
    runtime: Arc<dyn RuntimeAdapter>,
    random: Arc<dyn RandomProvider>,
}

impl FaultInjector {
    pub fn new(
        registry: FleetRegistry,
        runtime: Arc<dyn RuntimeAdapter>,
        random: Arc<dyn RandomProvider>,
    ) -> Self {
        Self {
            registry,
            runtime,
            random,
        }
    }

    /// Stop and remove one worker chosen uniformly at random.
    ///
    /// Returns the victim's display identifier.
    pub async fn kill_random_worker(&self) -> FleetResult<String> {
        let mut workers = self.registry.worker_units().await?;
        if workers.is_empty() {
            return Err(FleetError::PoolEmpty);
        }

        let victim = workers.swap_remove(self.random.random_index(workers.len()));
        let display = self.registry.membership().display_unit(&victim);

        self.runtime.stop_unit(&victim.id).await?;
        if let Err(e) = self.runtime.remove_unit(&victim.id).await {
            warn!(unit = %victim.name, error = %e, "worker stopped but not removed");
            return Err(e.into());
        }

        info!(unit = %victim.name, remaining = workers.len(), "worker terminated");
        Ok(display)
    }
}

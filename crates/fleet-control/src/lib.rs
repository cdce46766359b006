//! fleet-control — the fleet control plane.
//!
//! Manages an ephemeral pool of stateless worker units sitting behind a
//! load-balancing proxy:
//!
//! - [`FleetRegistry`] takes a live census from the runtime
//! - [`ScaleController`] launches workers and attaches them to the private
//!   network under the shared alias
//! - [`FaultInjector`] terminates one live worker at random
//!
//! # Architecture
//!
//! ```text
//! ControlPlane
//!   ├── FleetRegistry    ──┐
//!   ├── ScaleController  ──┼── Arc<dyn RuntimeAdapter> ── container runtime
//!   └── FaultInjector    ──┘
//!         └── Arc<dyn RandomProvider> (naming, victim selection)
//! ```
//!
//! Nothing is cached or locked. Concurrent scale-outs and kills race
//! directly against the runtime.

pub mod config;
pub mod error;
pub mod fault;
pub mod random;
pub mod registry;
pub mod scale;

use std::sync::Arc;

use fleet_runtime::RuntimeAdapter;

pub use config::{ApiSection, FleetConfig, FleetSection, RuntimeSection};
pub use error::{FleetError, FleetResult};
pub use fault::FaultInjector;
pub use random::{RandomProvider, SeededRandom, ThreadRandom};
pub use registry::{Census, CensusEntry, FleetRegistry, Membership};
pub use scale::{ScaleController, ScaleOutcome};

/// The three control operations over one runtime. Cheap to clone.
#[derive(Clone)]
pub struct ControlPlane {
    registry: FleetRegistry,
    scaler: Arc<ScaleController>,
    injector: Arc<FaultInjector>,
    default_scale_count: usize,
}

impl ControlPlane {
    pub fn new(
        runtime: Arc<dyn RuntimeAdapter>,
        random: Arc<dyn RandomProvider>,
        config: &FleetConfig,
    ) -> Self {
        let registry = FleetRegistry::new(runtime.clone(), Membership::new(&config.fleet));
        let scaler = ScaleController::new(
            registry.clone(),
            runtime.clone(),
            random.clone(),
            &config.fleet,
            config.variants.clone(),
        );
        let injector = FaultInjector::new(registry.clone(), runtime, random);

        Self {
            registry,
            scaler: Arc::new(scaler),
            injector: Arc::new(injector),
            default_scale_count: config.fleet.default_scale_count,
        }
    }

    pub fn registry(&self) -> &FleetRegistry {
        &self.registry
    }

    /// Batch size used when a scale-out does not name a count.
    pub fn default_scale_count(&self) -> usize {
        self.default_scale_count
    }

    pub async fn list_workers(&self) -> FleetResult<Census> {
        self.registry.list_workers().await
    }

    pub async fn scale_out(&self, count: usize, variant: Option<&str>) -> ScaleOutcome {
        self.scaler.scale_out(count, variant).await
    }

    pub async fn kill_random_worker(&self) -> FleetResult<String> {
        self.injector.kill_random_worker().await
    }
}

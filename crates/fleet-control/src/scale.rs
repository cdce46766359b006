//! Scale controller — launches workers and wires them into the load
//! balancer's routing domain.
//!
//! # Launch protocol
//!
//! ```text
//! resolve private network   (NetworkNotFound)
//! resolve template image    (UnknownVariant | NoTemplateAvailable)
//! for each new unit:
//!     run_unit(image, name, network = None)       -- unit exists, no alias
//!     connect_network(unit, private_net, [alias]) -- balancer can now resolve it
//! ```
//!
//! The alias is attached in a second call, only after the launch returns,
//! so the balancer never resolves the alias to a unit the runtime has not
//! finished creating. The two calls are not atomic: a unit whose launch
//! succeeded stays in the fleet even if its attach, or a later launch,
//! fails. Nothing is rolled back; callers re-query the registry for truth.

use std::collections::BTreeMap;
use std::sync::Arc;

use fleet_runtime::{Network, RuntimeAdapter};
use tracing::{debug, info, warn};

use crate::config::FleetSection;
use crate::error::{FleetError, FleetResult};
use crate::random::RandomProvider;
use crate::registry::FleetRegistry;

/// Result of a scale-out: every unit launched, plus the first failure.
#[derive(Debug)]
pub struct ScaleOutcome {
    /// Display identifiers of units whose launch succeeded, in launch order.
    pub launched: Vec<String>,
    pub error: Option<FleetError>,
}

impl ScaleOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct ScaleController {
    registry: FleetRegistry,
    runtime: Arc<dyn RuntimeAdapter>,
    random: Arc<dyn RandomProvider>,
    network_marker: String,
    alias: String,
    name_prefix: String,
    max_batch: usize,
    variants: BTreeMap<String, String>,
}

impl ScaleController {
    pub fn new(
        registry: FleetRegistry,
        runtime: Arc<dyn RuntimeAdapter>,
        random: Arc<dyn RandomProvider>,
        settings: &FleetSection,
        variants: BTreeMap<String, String>,
    ) -> Self {
        Self {
            registry,
            runtime,
            random,
            network_marker: settings.network_marker.clone(),
            alias: settings.alias.clone(),
            name_prefix: settings.name_prefix.clone(),
            max_batch: settings.max_scale_batch,
            variants,
        }
    }

    /// Launch `count` workers and attach each to the private network.
    ///
    /// With `variant` set, the image comes from the variant table;
    /// otherwise it is copied from a running worker.
    pub async fn scale_out(&self, count: usize, variant: Option<&str>) -> ScaleOutcome {
        let mut launched = Vec::new();
        let error = self.launch_batch(count, variant, &mut launched).await.err();

        match &error {
            None => info!(count = launched.len(), "scale-out complete"),
            Some(e) => warn!(
                requested = count,
                launched = launched.len(),
                error = %e,
                "scale-out failed"
            ),
        }

        ScaleOutcome { launched, error }
    }

    async fn launch_batch(
        &self,
        count: usize,
        variant: Option<&str>,
        launched: &mut Vec<String>,
    ) -> FleetResult<()> {
        if count == 0 || count > self.max_batch {
            return Err(FleetError::InvalidCount {
                requested: count,
                max: self.max_batch,
            });
        }

        let network = self.resolve_network().await?;
        let image = self.resolve_template(variant).await?;
        let aliases = vec![self.alias.clone()];
        debug!(network = %network.name, %image, count, "launching workers");

        for _ in 0..count {
            let name = self.generate_name();

            let unit = self.runtime.run_unit(&image, &name, None).await?;
            launched.push(self.registry.membership().display_unit(&unit));

            self.runtime
                .connect_network(&unit.id, &network.id, &aliases)
                .await?;
            info!(unit = %name, network = %network.name, alias = %self.alias, "worker launched");
        }

        Ok(())
    }

    /// First network whose name contains the marker. Ambiguity is not resolved.
    async fn resolve_network(&self) -> FleetResult<Network> {
        self.runtime
            .list_networks()
            .await?
            .into_iter()
            .find(|n| n.name.contains(&self.network_marker))
            .ok_or(FleetError::NetworkNotFound)
    }

    async fn resolve_template(&self, variant: Option<&str>) -> FleetResult<String> {
        if let Some(variant) = variant {
            return self
                .variants
                .get(variant)
                .cloned()
                .ok_or_else(|| FleetError::UnknownVariant(variant.to_string()));
        }

        self.registry
            .worker_units()
            .await?
            .into_iter()
            .next()
            .map(|u| u.image)
            .ok_or(FleetError::NoTemplateAvailable)
    }

    fn generate_name(&self) -> String {
        format!("{}{:08x}", self.name_prefix, self.random.random_u32())
    }
}

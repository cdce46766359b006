//! fleet.toml configuration parser.
//!
//! Every field is optional; defaults reproduce the demo deployment's
//! naming conventions.
//!
//! ```toml
//! [runtime]
//! docker_host = "unix:///var/run/docker.sock"
//!
//! [fleet]
//! network_marker = "private_net"
//! alias = "backend"
//!
//! [variants]
//! python = "distributed-systems-demo-backend"
//! node = "distributed-systems-demo-backend_node"
//!
//! [api]
//! listen = "0.0.0.0:8080"
//! load_balancer_url = "http://loadbalancer:80/api"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub runtime: RuntimeSection,
    pub fleet: FleetSection,
    /// Variant name → image reference for heterogeneous pools.
    pub variants: BTreeMap<String, String>,
    pub api: ApiSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// `DOCKER_HOST`-style engine address. Falls back to the environment.
    pub docker_host: Option<String>,
}

/// Naming conventions and limits for the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSection {
    /// A unit is a worker if its name contains this marker...
    pub worker_marker: String,
    /// ...and does not contain this one.
    pub frontend_marker: String,
    /// Substring identifying the load balancer's private network.
    pub network_marker: String,
    /// DNS alias the load balancer resolves to find workers.
    pub alias: String,
    /// Prefix for generated unit names.
    pub name_prefix: String,
    /// Deployment prefix stripped from names for display.
    pub display_prefix: String,
    pub default_scale_count: usize,
    pub max_scale_batch: usize,
}

impl Default for FleetSection {
    fn default() -> Self {
        Self {
            worker_marker: "backend".to_string(),
            frontend_marker: "frontend".to_string(),
            network_marker: "private_net".to_string(),
            alias: "backend".to_string(),
            name_prefix: "backend-auto-".to_string(),
            display_prefix: "distributed-systems-demo-".to_string(),
            default_scale_count: 3,
            max_scale_batch: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub listen: String,
    /// Load balancer endpoint probed by the traffic route.
    pub load_balancer_url: String,
    /// Traffic probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            load_balancer_url: "http://loadbalancer:80/api".to_string(),
            probe_timeout_ms: 1000,
        }
    }
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: FleetConfig = toml::from_str(content)?;
        if config.fleet.max_scale_batch == 0 {
            anyhow::bail!("fleet.max_scale_batch must be at least 1");
        }
        if config.fleet.default_scale_count > config.fleet.max_scale_batch {
            anyhow::bail!(
                "fleet.default_scale_count ({}) exceeds fleet.max_scale_batch ({})",
                config.fleet.default_scale_count,
                config.fleet.max_scale_batch
            );
        }
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FleetConfig::from_toml("").unwrap();
        assert_eq!(config.fleet, FleetSection::default());
        assert_eq!(config.fleet.alias, "backend");
        assert_eq!(config.fleet.network_marker, "private_net");
        assert!(config.variants.is_empty());
        assert_eq!(config.api.probe_timeout_ms, 1000);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[fleet]
name_prefix = "worker-"
max_scale_batch = 5

[variants]
node = "demo-backend-node:latest"
"#;
        let config = FleetConfig::from_toml(toml).unwrap();
        assert_eq!(config.fleet.name_prefix, "worker-");
        assert_eq!(config.fleet.max_scale_batch, 5);
        assert_eq!(config.fleet.worker_marker, "backend");
        assert_eq!(config.variants["node"], "demo-backend-node:latest");
    }

    #[test]
    fn reject_default_count_above_batch() {
        let toml = "[fleet]\ndefault_scale_count = 4\nmax_scale_batch = 2\n";
        assert!(FleetConfig::from_toml(toml).is_err());
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nlisten = \"127.0.0.1:9000\"").unwrap();

        let config = FleetConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.api.listen, "127.0.0.1:9000");

        let missing = file.path().with_extension("absent");
        let config = FleetConfig::load_or_default(&missing).unwrap();
        assert_eq!(config.api.listen, "0.0.0.0:8080");
    }
}

//! fleet-runtime — capability surface over the host container runtime.
//!
//! The control plane never talks to a container engine directly. It goes
//! through [`RuntimeAdapter`], which exposes the six calls the fleet needs:
//!
//! | Call | Purpose |
//! |---|---|
//! | `list_running_units` | census source |
//! | `list_networks` | private network discovery |
//! | `run_unit` | launch a unit from a template image |
//! | `connect_network` | attach a unit under DNS aliases |
//! | `stop_unit` / `remove_unit` | termination |
//!
//! Two implementations ship here:
//!
//! - [`DockerEngine`] — Docker Engine HTTP API over a unix socket or TCP
//! - [`InMemoryRuntime`] — deterministic in-process runtime with a call log
//!   and failure injection (for testing)

pub mod adapter;
pub mod docker;
pub mod error;
pub mod memory;
pub mod types;

pub use adapter::{RuntimeAdapter, RuntimeFuture};
pub use docker::{DockerEndpoint, DockerEngine};
pub use error::{RuntimeError, RuntimeResult};
pub use memory::{InMemoryRuntime, RuntimeCall};
pub use types::{Network, Unit};

//! fleetd — the fleet control plane daemon.
//!
//! Serves the control API over HTTP, or runs a single control operation
//! against the container runtime and prints the JSON result.
//!
//! # Usage
//!
//! ```text
//! fleetd serve --listen 0.0.0.0:8080
//! fleetd status
//! fleetd scale --count 3 --variant node
//! fleetd kill
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use fleet_api::{ApiState, TrafficProbe};
use fleet_control::{ControlPlane, FleetConfig, ThreadRandom};
use fleet_runtime::DockerEngine;
use fleet_runtime::docker::DEFAULT_DOCKER_HOST;

#[derive(Parser)]
#[command(name = "fleetd", about = "Fleet control plane daemon")]
struct Cli {
    /// Path to fleet.toml. Defaults apply when the file does not exist.
    #[arg(long, global = true, default_value = "fleet.toml")]
    config: PathBuf,

    /// Docker Engine address (unix:///path or tcp://host:port).
    #[arg(long, global = true)]
    docker_host: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the control API.
    Serve {
        /// Address to listen on (overrides `api.listen`).
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Print the current worker census.
    Status,
    /// Launch new workers and attach them to the private network.
    Scale {
        /// Number of workers to launch (defaults to `fleet.default_scale_count`).
        #[arg(long)]
        count: Option<usize>,

        /// Launch from a configured variant image instead of a running worker.
        #[arg(long)]
        variant: Option<String>,
    },
    /// Terminate one random worker.
    Kill,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = FleetConfig::load_or_default(&cli.config)?;
    let docker_host = cli
        .docker_host
        .clone()
        .or_else(|| config.runtime.docker_host.clone())
        .or_else(|| std::env::var("DOCKER_HOST").ok())
        .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string());

    let engine = DockerEngine::from_host(&docker_host)?;
    info!(endpoint = %engine.endpoint(), "container runtime configured");

    let plane = ControlPlane::new(Arc::new(engine), Arc::new(ThreadRandom), &config);

    match cli.command {
        Command::Serve { listen } => serve(plane, &config, listen).await,
        Command::Status => print_json(&fleet_api::responses::status(&plane).await),
        Command::Scale { count, variant } => print_json(
            &fleet_api::responses::scale(&plane, count, variant.as_deref()).await,
        ),
        Command::Kill => print_json(&fleet_api::responses::kill(&plane).await),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,fleetd=debug,fleet=debug"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(
    plane: ControlPlane,
    config: &FleetConfig,
    listen: Option<SocketAddr>,
) -> anyhow::Result<()> {
    let addr = match listen {
        Some(addr) => addr,
        None => config.api.listen.parse()?,
    };

    let probe = TrafficProbe::new(
        &config.api.load_balancer_url,
        Duration::from_millis(config.api.probe_timeout_ms),
    )?;

    let router = fleet_api::build_router(ApiState { plane, probe });

    info!(%addr, "control API starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("fleet daemon stopped");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

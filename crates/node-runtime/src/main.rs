//! # Switchyard
//!
//! A small publish/subscribe fabric: producers publish `path; message`
//! updates, subscribers hold long polls, line connections or in-process
//! peers, and a topic dispatcher fans updates out.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + metrics registry)
//! 2. Load configuration from `SY_*` environment variables
//! 3. Build the fabric and start every enabled listener
//! 4. Run until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use switchyard_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env();
    let runtime = NodeRuntime::start(config)
        .await
        .context("Failed to start node")?;

    info!("Switchyard is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}

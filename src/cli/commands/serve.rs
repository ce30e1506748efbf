//! `voletc serve`: run the Docker volume plugin service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::plugin_http::{self, PluginHttpConfig};
use crate::cli::types::ServeArgs;
use crate::cli::CliContext;
use crate::services::{DriverConfig, VolumeDriver};

pub fn execute(ctx: &CliContext, args: ServeArgs) -> Result<()> {
    let listen_addr = args
        .listen
        .unwrap_or_else(|| ctx.config.server.listen_addr.clone());
    let base_dir = args
        .dir
        .unwrap_or_else(|| PathBuf::from(&ctx.config.server.mount_base_dir));

    let driver_config = DriverConfig::new(&base_dir, &ctx.config.backend.prefix);
    info!(
        backend = %ctx.backend.describe(),
        mount_base = %driver_config.mount_base_dir.display(),
        "starting volume plugin"
    );
    let driver = Arc::new(VolumeDriver::new(driver_config, ctx.backend.clone()));

    // The blocking HTTP client inside the backend must not be dropped on a
    // runtime thread, so `driver` outlives the runtime.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let server_driver = driver.clone();
    runtime
        .block_on(plugin_http::serve_with_shutdown(
            server_driver,
            PluginHttpConfig { listen_addr },
            shutdown_signal(),
        ))
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("Volume plugin server failed")?;

    drop(runtime);
    drop(driver);
    info!("volume plugin stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

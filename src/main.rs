//! overlay-metrics: CPU, RAM, disk and GPU gauges that follow the cursor
//! on Hyprland.
//!
//! Run with:  `RUST_LOG=info overlay-metrics`

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("overlay-metrics v{} starting", env!("CARGO_PKG_VERSION"));

    let path = overlay_config::default_path();
    let config = overlay_config::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    overlay_wayland::run(&config).map_err(Into::into)
}

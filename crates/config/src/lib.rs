pub mod schema;
pub mod watcher;

pub use schema::{
    ContrastConfig, FontConfig, MetricsConfig, OverlayConfig, Point, SurfaceConfig,
};
pub use watcher::ConfigWatcher;

use overlay_core::{OverlayError, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `OverlayConfig::default()`
/// if the file doesn't exist so the overlay always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<OverlayConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(OverlayConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| OverlayError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse a TOML document into an [`OverlayConfig`].
pub fn parse(raw: &str) -> Result<OverlayConfig> {
    toml::from_str(raw).map_err(|e| OverlayError::Config(format!("TOML parse error: {e}")))
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("overlay-metrics").join("overlay.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load("/definitely/not/here/overlay.toml").unwrap();
        assert_eq!(cfg.metrics.averaging_count, 15);
    }

    #[test]
    fn broken_toml_is_a_config_error() {
        let err = parse("metrics = [").unwrap_err();
        assert!(matches!(err, OverlayError::Config(_)));
    }

    #[test]
    fn default_path_ends_with_overlay_toml() {
        assert!(default_path().ends_with("overlay-metrics/overlay.toml"));
    }
}

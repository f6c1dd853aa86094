use serde::{Deserialize, Serialize};

/// Root configuration structure parsed from `overlay.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Sampling and averaging settings.
    pub metrics: MetricsConfig,
    /// Overlay surface placement and gauge geometry.
    pub overlay: SurfaceConfig,
    /// Label font.
    pub font: FontConfig,
    /// Text colour selection against the backdrop.
    pub contrast: ContrastConfig,
}

/// Counter discovery and rolling-average settings.
///
/// Read once when the sampler starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Number of samples in each rolling window.
    pub averaging_count: usize,
    /// Minimum time between two counter rediscoveries (milliseconds).
    pub counter_refresh_ms: u64,
    /// Aggregation tick (milliseconds).
    pub sample_interval_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            averaging_count:    15,
            counter_refresh_ms: 5_000,
            sample_interval_ms: 500,
        }
    }
}

/// Overlay surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Alpha applied to every brush (0.0 – 1.0).
    pub opacity: f32,
    /// Render ticks per second; also the cursor polling rate.
    pub fps: u32,
    /// Track the mouse cursor; when `false` the overlay sits at `position`.
    pub follow_mouse: bool,
    /// Fixed overlay origin used when not following the cursor.
    pub position: Point,
    /// Overlay origin relative to the cursor.
    pub offset: Point,
    /// Width of one gauge bar in logical pixels.
    pub gauge_width: u32,
    /// Height of one gauge bar in logical pixels.
    pub gauge_height: u32,
    /// Horizontal distance between the left edges of two gauges.
    pub spacing: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            opacity:      0.35,
            fps:          30,
            follow_mouse: true,
            position:     Point { x: 0, y: 0 },
            offset:       Point { x: 0, y: -80 },
            gauge_width:  20,
            gauge_height: 40,
            spacing:      30,
        }
    }
}

/// A signed 2-D point in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Font settings for gauge labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font family name.
    pub family: String,
    /// Font size in points.
    pub size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "JetBrains Mono".to_string(),
            size:   10.0,
        }
    }
}

/// Foreground selection against the colour behind the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    /// Scores (`2R + 7G + B`) below this get a light foreground.
    pub threshold: u32,
    /// Colour assumed behind the overlay (hex, e.g. `"#1e1e2e"`).
    ///
    /// Wayland clients cannot read screen pixels, so the backdrop is
    /// configured rather than sampled.
    pub backdrop: String,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            threshold: 500,
            backdrop:  "#1e1e2e".to_string(),
        }
    }
}

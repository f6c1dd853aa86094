pub mod colors;
pub mod contrast;
pub mod severity;

pub use colors::Color;
pub use contrast::Contrast;
pub use severity::Severity;

use overlay_config::OverlayConfig;

/// Compiled brushes and sizes derived from [`OverlayConfig`].
///
/// Every brush carries the configured overlay opacity.  Calling
/// [`Theme::from_config`] is infallible: an invalid backdrop colour falls
/// back to a dark default.
#[derive(Debug, Clone)]
pub struct Theme {
    pub good:      Color,
    pub warning:   Color,
    pub critical:  Color,
    /// Foreground used over dark backdrops.
    pub light:     Color,
    /// Foreground used over light backdrops.
    pub dark:      Color,
    /// Unfilled part of a gauge.
    pub track:     Color,
    pub font_size: f32,
    /// Colour assumed behind the overlay.
    pub backdrop:  Color,
    /// Contrast score threshold.
    pub contrast_threshold: u32,
}

impl Theme {
    /// Build a [`Theme`] from the loaded configuration.
    pub fn from_config(cfg: &OverlayConfig) -> Self {
        let alpha = cfg.overlay.opacity;
        Self {
            good:      Color::GREEN.with_alpha(alpha),
            warning:   Color::YELLOW.with_alpha(alpha),
            critical:  Color::RED.with_alpha(alpha),
            light:     Color::WHITE.with_alpha(alpha),
            dark:      Color::BLACK.with_alpha(alpha),
            track:     Color::TRANSPARENT,
            font_size: cfg.font.size,
            backdrop:  Color::from_hex(&cfg.contrast.backdrop).unwrap_or(Color::DARK),
            contrast_threshold: cfg.contrast.threshold,
        }
    }

    /// Fill brush for a metric value on the 0–100 scale.
    pub fn severity_color(&self, value: f32) -> Color {
        match Severity::classify(value) {
            Severity::Good     => self.good,
            Severity::Warning  => self.warning,
            Severity::Critical => self.critical,
        }
    }

    /// Text brush that reads best over the configured backdrop.
    pub fn foreground(&self) -> Color {
        match Contrast::for_backdrop(self.backdrop.to_rgb8(), self.contrast_threshold) {
            Contrast::Light => self.light,
            Contrast::Dark  => self.dark,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&OverlayConfig::default())
    }
}

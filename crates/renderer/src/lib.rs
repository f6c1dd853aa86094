//! Placement and sizing of the overlay surface.
//!
//! Pure geometry: the Wayland crate turns these numbers into layer-shell
//! margin and size requests.

use overlay_config::{Point, SurfaceConfig};
use overlay_core::CursorPos;

/// Text lines drawn under each bar: the label and the value.
const TEXT_LINES: u32 = 2;
/// Line height as a multiple of the font size.
const LINE_FACTOR: f32 = 1.4;

/// Gauge geometry and placement rules derived from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub gauge_width:  u32,
    pub gauge_height: u32,
    pub spacing:      u32,
    pub line_height:  u32,
    follow_mouse:     bool,
    position:         Point,
    offset:           Point,
}

impl OverlayLayout {
    /// Build an [`OverlayLayout`] from the loaded configuration.
    pub fn from_config(surface: &SurfaceConfig, font_size: f32) -> Self {
        Self {
            gauge_width:  surface.gauge_width,
            gauge_height: surface.gauge_height,
            spacing:      surface.spacing.max(surface.gauge_width),
            line_height:  (font_size * LINE_FACTOR).round().max(1.0) as u32,
            follow_mouse: surface.follow_mouse,
            position:     surface.position,
            offset:       surface.offset,
        }
    }

    /// Top-left corner of the overlay in output coordinates.
    ///
    /// Follows `cursor + offset` when tracking the mouse and a cursor is
    /// known, otherwise sits at the fixed position.  Clamped to the
    /// non-negative quadrant because layer-shell margins cannot be negative.
    pub fn origin(&self, cursor: Option<CursorPos>) -> (i32, i32) {
        let (x, y) = match cursor {
            Some(c) if self.follow_mouse => (c.x + self.offset.x, c.y + self.offset.y),
            _ => (self.position.x, self.position.y),
        };
        (x.max(0), y.max(0))
    }

    /// Layer-shell margins `(top, right, bottom, left)` for a top-left anchor.
    pub fn margins(&self, cursor: Option<CursorPos>) -> (i32, i32, i32, i32) {
        let (x, y) = self.origin(cursor);
        (y, 0, 0, x)
    }

    /// Surface size for `gauges` side-by-side gauges.
    pub fn surface_size(&self, gauges: usize) -> (u32, u32) {
        let gauges = gauges.max(1) as u32;
        let width = self.spacing * gauges;
        let height = self.gauge_height + TEXT_LINES * self.line_height;
        (width, height)
    }
}

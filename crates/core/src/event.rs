use crate::state::{CursorPos, MetricsSnapshot};

/// All messages (events) that can flow through the application event bus.
///
/// Sources:
/// - Metrics sampler task  → `MetricsUpdated`
/// - Hyprland IPC query    → `CursorMoved`
/// - Config watcher task   → `ConfigReloaded`
/// - Frame subscription    → `Frame`
#[derive(Debug, Clone)]
pub enum Message {
    // ── Metrics ───────────────────────────────────────────────────────────────
    /// Fresh averages table from the background sampler.
    MetricsUpdated(MetricsSnapshot),

    // ── Pointer ───────────────────────────────────────────────────────────────
    /// Global cursor position reported by the compositor.
    CursorMoved(CursorPos),

    // ── Config ────────────────────────────────────────────────────────────────
    /// Config file changed on disk; triggers a live reload.
    ConfigReloaded,

    // ── Internal ──────────────────────────────────────────────────────────────
    /// Render-loop tick, fired at the configured frames per second.
    Frame,
}

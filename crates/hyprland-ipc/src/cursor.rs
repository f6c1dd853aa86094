use overlay_core::{CursorPos, OverlayError, Result};
use serde::Deserialize;

/// JSON shape returned by `hyprctl cursorpos -j`.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RawCursorPos {
    x: i32,
    y: i32,
}

/// Parse the `j/cursorpos` reply into a [`CursorPos`].
pub fn parse_cursor_pos(raw: &str) -> Result<CursorPos> {
    let RawCursorPos { x, y } = serde_json::from_str(raw.trim())
        .map_err(|e| OverlayError::Ipc(format!("parse cursorpos: {e}")))?;
    Ok(CursorPos { x, y })
}

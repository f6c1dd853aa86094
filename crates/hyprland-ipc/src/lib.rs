pub mod client;
pub mod cursor;

pub use client::{fetch_cursor_pos, HyprlandIpc};
pub use cursor::parse_cursor_pos;

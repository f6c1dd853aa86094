pub mod error;
pub mod event;
pub mod state;

pub use error::{OverlayError, Result};
pub use event::Message;
pub use state::{AppState, CursorPos, GaugeReading, MetricsSnapshot};

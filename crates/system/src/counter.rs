use std::sync::Arc;
use thiserror::Error;

/// Instance name of the system-wide aggregate counter.
pub const TOTAL_INSTANCE: &str = "_Total";

/// Instance-name suffix of GPU 3D engines.
pub const GPU_ENGINE_SUFFIX: &str = "engtype_3D";

/// The four hardware counter families the overlay tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Cpu,
    Ram,
    Disk,
    Gpu,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Cpu, Self::Ram, Self::Disk, Self::Gpu];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Failure to read a single counter.
#[derive(Debug, Error)]
pub enum CounterError {
    /// The instance went away between enumeration and sampling.
    #[error("counter '{instance}' is no longer available")]
    Unavailable { instance: String },

    #[error("cannot read counter '{instance}': {source}")]
    Io {
        instance: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed reading from '{instance}': {raw:?}")]
    Parse { instance: String, raw: String },

    /// Rate counters need two readings; the first one only sets the baseline.
    #[error("counter '{instance}' has no baseline yet")]
    NotReady { instance: String },
}

impl CounterError {
    /// Classify an I/O failure; a missing file means the instance vanished.
    pub fn from_io(instance: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::Unavailable {
                instance: instance.to_string(),
            },
            _ => Self::Io {
                instance: instance.to_string(),
                source,
            },
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}

/// One live OS performance counter.
///
/// Released when the last [`CounterHandle`] pointing at it is dropped.
pub trait Counter: Send + Sync {
    /// Take the next sample.
    ///
    /// Rate counters return [`CounterError::NotReady`] until a baseline
    /// exists.  Reopening a counter for the same instance keeps the baseline.
    fn next_value(&self) -> Result<f32, CounterError>;
}

/// Shared, opaque reference to an open counter.
pub type CounterHandle = Arc<dyn Counter>;

/// Enumeration and sampling boundary to the operating system.
pub trait CounterSource: Send + Sync {
    /// List the instance names currently exposed for `category`.
    ///
    /// CPU and RAM are system-wide and are opened directly on
    /// [`TOTAL_INSTANCE`] without enumeration.
    fn instances(&self, category: Category) -> Result<Vec<String>, CounterError>;

    /// Open the counter the overlay reads for `instance`.
    ///
    /// - CPU: processor time, percent.
    /// - RAM: available memory, megabytes.
    /// - Disk: idle time, percent.
    /// - GPU: engine utilization, percent.
    fn open(&self, category: Category, instance: &str) -> Result<CounterHandle, CounterError>;

    /// Installed physical memory in megabytes.
    fn total_memory_mb(&self) -> f64;
}

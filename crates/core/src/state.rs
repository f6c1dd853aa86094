use std::collections::BTreeMap;

/// Label under which the single GPU gauge is published.
pub const GPU_LABEL: &str = "GPU";

/// Central application state; the overlay view reads only from this.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Latest averages table from the sampler.
    pub metrics: MetricsSnapshot,
    /// Last known global cursor position, `None` until the first query lands.
    pub cursor: Option<CursorPos>,
}

/// Global pointer position in compositor layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPos {
    pub x: i32,
    pub y: i32,
}

/// The averages table published after every aggregation tick.
///
/// Always replaced as a whole; the renderer never sees a half-updated table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Processor time (0.0 – 100.0), normally a single `"CPU"` entry.
    pub cpu: BTreeMap<String, f32>,
    /// RAM used ratio (0.0 – 1.0), normally a single `"RAM"` entry.
    pub ram: BTreeMap<String, f32>,
    /// Disk busy time (0.0 – 100.0) per physical disk label.
    pub disks: BTreeMap<String, f32>,
    /// Rolling mean of the per-tick sum over all 3D engines.
    pub gpu: f32,
}

/// One drawable metric: a label and a value on the 0–100 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeReading {
    pub label:   String,
    pub percent: f32,
}

impl MetricsSnapshot {
    /// Flatten the table into draw order: CPU, RAM, disks, GPU.
    ///
    /// RAM is scaled from its ratio to a percentage so every gauge shares the
    /// same thresholds.
    #[must_use]
    pub fn gauges(&self) -> Vec<GaugeReading> {
        let reading = |label: &String, percent: f32| GaugeReading {
            label: label.clone(),
            percent,
        };

        self.cpu
            .iter()
            .map(|(l, v)| reading(l, *v))
            .chain(self.ram.iter().map(|(l, v)| reading(l, *v * 100.0)))
            .chain(self.disks.iter().map(|(l, v)| reading(l, *v)))
            .chain(std::iter::once(GaugeReading {
                label:   GPU_LABEL.to_string(),
                percent: self.gpu,
            }))
            .collect()
    }
}

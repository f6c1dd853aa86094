use crate::buffer::MetricBuffer;
use crate::counter::Category;
use crate::memory::used_ratio;
use crate::registry::{CounterMap, Counters};
use overlay_core::MetricsSnapshot;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of one sampling pass.
#[derive(Debug, Clone)]
pub struct Pass {
    /// Freshly computed averages table.
    pub snapshot: MetricsSnapshot,
    /// Categories with at least one counter that went unavailable this pass;
    /// the caller should force a registry refresh for each.
    pub failed: Vec<Category>,
}

/// Owns every rolling buffer and turns raw counter samples into averages.
pub struct Aggregator {
    capacity:        usize,
    total_memory_mb: f64,
    cpu:             BTreeMap<String, MetricBuffer>,
    ram:             BTreeMap<String, MetricBuffer>,
    disk:            BTreeMap<String, MetricBuffer>,
    /// One buffer for the per-tick sum over all GPU engines.
    gpu:             MetricBuffer,
}

impl Aggregator {
    pub fn new(capacity: usize, total_memory_mb: f64) -> Self {
        Self {
            capacity,
            total_memory_mb,
            cpu:  BTreeMap::new(),
            ram:  BTreeMap::new(),
            disk: BTreeMap::new(),
            gpu:  MetricBuffer::new(capacity),
        }
    }

    /// Sample every counter in `counters` once and publish new averages.
    pub fn sample(&mut self, counters: &Counters) -> Pass {
        let mut failed = Vec::new();
        let mut note = |category: Category, ok: bool| {
            if !ok && !failed.contains(&category) {
                failed.push(category);
            }
        };

        let (cpu, ok) = sample_labelled(
            &mut self.cpu,
            counters.get(Category::Cpu),
            self.capacity,
            |v| v,
        );
        note(Category::Cpu, ok);

        let (available, ok) = sample_labelled(
            &mut self.ram,
            counters.get(Category::Ram),
            self.capacity,
            |v| v,
        );
        note(Category::Ram, ok);
        let total = self.total_memory_mb;
        let ram = available
            .into_iter()
            .map(|(label, avg)| (label, used_ratio(total, avg as f64)))
            .collect();

        // Idle time in, busy time buffered.
        let (disks, ok) = sample_labelled(
            &mut self.disk,
            counters.get(Category::Disk),
            self.capacity,
            |idle| 100.0 - idle,
        );
        note(Category::Disk, ok);

        let (sum, ok) = sum_engines(counters.get(Category::Gpu));
        note(Category::Gpu, ok);
        self.gpu.push(sum);

        Pass {
            snapshot: MetricsSnapshot {
                cpu,
                ram,
                disks,
                gpu: self.gpu.average(),
            },
            failed,
        }
    }
}

/// Sample each labelled counter into its own buffer.
///
/// Buffers are reconciled against `counters` first: new labels start empty,
/// surviving labels keep their history, vanished labels are dropped.  A
/// counter that fails to read pushes nothing, so its previous mean stands.
///
/// Returns the averages and whether any counter reported itself unavailable.
fn sample_labelled(
    buffers: &mut BTreeMap<String, MetricBuffer>,
    counters: &CounterMap,
    capacity: usize,
    transform: impl Fn(f32) -> f32,
) -> (BTreeMap<String, f32>, bool) {
    buffers.retain(|label, _| counters.contains_key(label));

    let mut clean = true;
    let mut averages = BTreeMap::new();
    for (label, counter) in counters {
        let buffer = buffers
            .entry(label.clone())
            .or_insert_with(|| MetricBuffer::new(capacity));

        match counter.next_value() {
            Ok(v) => buffer.push(transform(v)),
            Err(e) if e.is_not_ready() => {}
            Err(e) => {
                debug!(label = %label, "sample failed: {e}");
                clean &= !e.is_unavailable();
            }
        }
        averages.insert(label.clone(), buffer.average());
    }
    (averages, clean)
}

/// Sum the current reading of every GPU engine; failed engines count as zero.
fn sum_engines(counters: &CounterMap) -> (f32, bool) {
    let mut clean = true;
    let sum: f32 = counters
        .iter()
        .map(|(label, counter)| {
            counter.next_value().unwrap_or_else(|e| {
                debug!(label = %label, "engine sample failed: {e}");
                clean &= !e.is_unavailable();
                0.0
            })
        })
        .sum();
    (sum, clean)
}

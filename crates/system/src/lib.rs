pub mod aggregator;
pub mod buffer;
pub mod counter;
pub mod linux;
pub mod memory;
pub mod registry;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregator::{Aggregator, Pass};
pub use buffer::MetricBuffer;
pub use counter::{Category, Counter, CounterError, CounterHandle, CounterSource};
pub use linux::LinuxSource;
pub use registry::{CounterMap, Counters, Registry};

use overlay_core::MetricsSnapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{info, warn};

/// Sampler cadence and window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Samples per rolling window.
    pub averaging_count: usize,
    /// Minimum time between two rediscoveries of the same category.
    pub counter_refresh: Duration,
    /// Aggregation tick.
    pub sample_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            averaging_count: 15,
            counter_refresh: Duration::from_millis(5_000),
            sample_interval: Duration::from_millis(500),
        }
    }
}

/// Spawn the sampler against the live Linux counters.
///
/// See [`spawn_monitor_with`].
pub fn spawn_monitor(settings: MonitorSettings) -> mpsc::Receiver<MetricsSnapshot> {
    spawn_monitor_with(LinuxSource::new(), settings)
}

/// Spawn two background Tokio tasks over `source` and forward a fresh
/// [`MetricsSnapshot`] after every sampling pass.
///
/// - The refresh task polls the registry's gated rediscovery on the sampling
///   cadence; real rebuilds happen at most once per `counter_refresh`.
/// - The sampling task owns the [`Aggregator`], takes a stable [`Counters`]
///   view per pass, and forces a refresh of any category with a counter that
///   went unavailable.
///
/// Both tasks stop once the receiver is dropped.
pub fn spawn_monitor_with<S>(source: S, settings: MonitorSettings) -> mpsc::Receiver<MetricsSnapshot>
where
    S: CounterSource + 'static,
{
    let (tx, rx) = mpsc::channel(4);

    let total_mb = source.total_memory_mb();
    info!(total_mb = total_mb.round(), "metrics sampler starting");

    let mut registry = Registry::new(source, settings.counter_refresh);
    registry.refresh_all(Instant::now());
    let registry = Arc::new(Mutex::new(registry));

    tokio::spawn(refresh_loop(Arc::clone(&registry), settings.sample_interval, tx.clone()));
    tokio::spawn(sample_loop(
        registry,
        Aggregator::new(settings.averaging_count, total_mb),
        settings.sample_interval,
        tx,
    ));

    rx
}

async fn refresh_loop<S: CounterSource>(
    registry: Arc<Mutex<Registry<S>>>,
    period: Duration,
    tx: mpsc::Sender<MetricsSnapshot>,
) {
    let mut ticker = time::interval(period);
    while !tx.is_closed() {
        ticker.tick().await;
        lock(&registry).refresh_all(Instant::now());
    }
}

async fn sample_loop<S: CounterSource>(
    registry: Arc<Mutex<Registry<S>>>,
    mut aggregator: Aggregator,
    period: Duration,
    tx: mpsc::Sender<MetricsSnapshot>,
) {
    let mut ticker = time::interval(period);
    loop {
        ticker.tick().await;

        let counters = lock(&registry).counters();
        let Pass { snapshot, failed } = aggregator.sample(&counters);
        drop(counters);

        if !failed.is_empty() {
            let mut registry = lock(&registry);
            let now = Instant::now();
            for category in failed {
                warn!(?category, "counter unavailable; rediscovering");
                registry.force_refresh(category, now);
            }
        }

        if tx.send(snapshot).await.is_err() {
            break; // all receivers dropped
        }
    }
}

/// The registry holds no invariants a panicking holder could break mid-way,
/// so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

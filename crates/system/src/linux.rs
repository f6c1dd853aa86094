//! Counters backed by `sysinfo`, `/proc/diskstats` and `/sys/class/drm`.

use crate::counter::{
    Category, Counter, CounterError, CounterHandle, CounterSource, GPU_ENGINE_SUFFIX,
    TOTAL_INSTANCE,
};
use crate::memory::bytes_to_mb;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

const DISKSTATS: &str = "/proc/diskstats";
const SYS_BLOCK: &str = "/sys/block";
const SYS_DRM: &str = "/sys/class/drm";

/// Busy-percent files exposed by GPU drivers, relative to `/sys/class/drm/cardN`.
const GPU_BUSY_FILES: [&str; 3] = [
    "device/gpu_busy_percent",
    "gpu_busy_percent",
    "gt/gt0/busy_percent",
];

/// The live Linux counter source.
///
/// CPU and disk readings are rates over the previous reading.  Their
/// baselines live here rather than in the handles, so a registry rebuild
/// that reopens a counter continues from where the old handle stopped.
#[derive(Clone, Default)]
pub struct LinuxSource {
    cpu:   Arc<CpuSampler>,
    disks: Arc<DiskBaselines>,
}

impl LinuxSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterSource for LinuxSource {
    fn instances(&self, category: Category) -> Result<Vec<String>, CounterError> {
        match category {
            Category::Cpu | Category::Ram => Ok(Vec::new()),
            Category::Disk => block_devices(Path::new(SYS_BLOCK)),
            Category::Gpu => gpu_engines(Path::new(SYS_DRM)),
        }
    }

    fn open(&self, category: Category, instance: &str) -> Result<CounterHandle, CounterError> {
        let handle: CounterHandle = match category {
            Category::Cpu => Arc::new(CpuCounter {
                sampler: Arc::clone(&self.cpu),
            }),
            Category::Ram => Arc::new(RamCounter::new()),
            Category::Disk => Arc::new(DiskIdleCounter::new(instance, Arc::clone(&self.disks))),
            Category::Gpu => Arc::new(GpuCounter::open(Path::new(SYS_DRM), instance)?),
        };
        Ok(handle)
    }

    fn total_memory_mb(&self) -> f64 {
        let mut sys = System::new();
        sys.refresh_memory();
        bytes_to_mb(sys.total_memory())
    }
}

// ── CPU ──────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct CpuSampler {
    state: Mutex<CpuState>,
}

#[derive(Default)]
struct CpuState {
    sys:      System,
    /// When the usage delta was last restarted.
    baseline: Option<Instant>,
    last:     Option<f32>,
}

impl CpuSampler {
    fn read(&self) -> Result<f32, CounterError> {
        let not_ready = || CounterError::NotReady {
            instance: TOTAL_INSTANCE.to_string(),
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let Some(at) = state.baseline else {
            // The first refresh only measures usage since boot.
            state.sys.refresh_cpu_usage();
            state.baseline = Some(now);
            return Err(not_ready());
        };
        if now.saturating_duration_since(at) < MINIMUM_CPU_UPDATE_INTERVAL {
            return state.last.ok_or_else(not_ready);
        }

        state.sys.refresh_cpu_usage();
        state.baseline = Some(now);
        let usage = state.sys.global_cpu_usage();
        state.last = Some(usage);
        Ok(usage)
    }
}

/// Total processor time across all cores, percent.
struct CpuCounter {
    sampler: Arc<CpuSampler>,
}

impl Counter for CpuCounter {
    fn next_value(&self) -> Result<f32, CounterError> {
        self.sampler.read()
    }
}

// ── RAM ──────────────────────────────────────────────────────────────────────

/// Available memory, megabytes.
struct RamCounter {
    sys: Mutex<System>,
}

impl RamCounter {
    fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl Counter for RamCounter {
    fn next_value(&self) -> Result<f32, CounterError> {
        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_memory();
        Ok(bytes_to_mb(sys.available_memory()) as f32)
    }
}

// ── Disk ─────────────────────────────────────────────────────────────────────

/// Whole-disk block devices (those backed by real hardware).
fn block_devices(root: &Path) -> Result<Vec<String>, CounterError> {
    let entries = std::fs::read_dir(root).map_err(|e| CounterError::from_io(SYS_BLOCK, e))?;

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().join("device").exists())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Milliseconds a device has spent doing I/O (`/proc/diskstats` field 13).
pub(crate) fn parse_io_time(diskstats: &str, device: &str) -> Option<u64> {
    diskstats.lines().find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 || parts[2] != device {
            return None;
        }
        parts[12].parse().ok()
    })
}

/// Idle percent between two `(io_ms, at)` readings.
fn idle_between((io_a, at_a): (u64, Instant), (io_b, at_b): (u64, Instant)) -> f32 {
    let wall_ms = at_b.saturating_duration_since(at_a).as_secs_f64() * 1000.0;
    if wall_ms <= 0.0 {
        return 100.0;
    }
    let busy = (io_b.saturating_sub(io_a) as f64 / wall_ms * 100.0).clamp(0.0, 100.0);
    (100.0 - busy) as f32
}

/// Last `(io_ms, at)` reading per device.
#[derive(Default)]
struct DiskBaselines(Mutex<HashMap<String, (u64, Instant)>>);

impl DiskBaselines {
    /// Record a reading; idle percent since the previous one, if any.
    fn advance(&self, device: &str, io_ms: u64, at: Instant) -> Option<f32> {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let prev = map.insert(device.to_string(), (io_ms, at));
        prev.map(|prev| idle_between(prev, (io_ms, at)))
    }
}

/// Idle time of one disk, percent, from successive `io_time` readings.
struct DiskIdleCounter {
    device:    String,
    baselines: Arc<DiskBaselines>,
}

impl DiskIdleCounter {
    fn new(device: &str, baselines: Arc<DiskBaselines>) -> Self {
        Self {
            device: device.to_string(),
            baselines,
        }
    }
}

impl Counter for DiskIdleCounter {
    fn next_value(&self) -> Result<f32, CounterError> {
        let raw = std::fs::read_to_string(DISKSTATS)
            .map_err(|e| CounterError::from_io(&self.device, e))?;
        let io_ms = parse_io_time(&raw, &self.device).ok_or_else(|| CounterError::Unavailable {
            instance: self.device.clone(),
        })?;

        self.baselines
            .advance(&self.device, io_ms, Instant::now())
            .ok_or_else(|| CounterError::NotReady {
                instance: self.device.clone(),
            })
    }
}

// ── GPU ──────────────────────────────────────────────────────────────────────

/// One `cardN_engtype_3D` instance per DRM card that reports a busy percentage.
fn gpu_engines(root: &Path) -> Result<Vec<String>, CounterError> {
    let entries = std::fs::read_dir(root).map_err(|e| CounterError::from_io(SYS_DRM, e))?;

    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_card = name
                .strip_prefix("card")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
            (is_card && busy_file(&entry.path()).is_some())
                .then(|| format!("{name}_{GPU_ENGINE_SUFFIX}"))
        })
        .collect();
    names.sort();
    Ok(names)
}

fn busy_file(card: &Path) -> Option<PathBuf> {
    GPU_BUSY_FILES
        .iter()
        .map(|rel| card.join(rel))
        .find(|p| p.exists())
}

/// 3D engine utilization of one card, percent.
struct GpuCounter {
    instance: String,
    path:     PathBuf,
}

impl GpuCounter {
    fn open(root: &Path, instance: &str) -> Result<Self, CounterError> {
        let unavailable = || CounterError::Unavailable {
            instance: instance.to_string(),
        };
        let card = instance
            .strip_suffix(GPU_ENGINE_SUFFIX)
            .and_then(|s| s.strip_suffix('_'))
            .ok_or_else(unavailable)?;
        let path = busy_file(&root.join(card)).ok_or_else(unavailable)?;

        Ok(Self {
            instance: instance.to_string(),
            path,
        })
    }
}

impl Counter for GpuCounter {
    fn next_value(&self) -> Result<f32, CounterError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| CounterError::from_io(&self.instance, e))?;
        raw.trim().parse().map_err(|_| CounterError::Parse {
            instance: self.instance.clone(),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const DISKSTATS_SAMPLE: &str = "\
   7       0 loop0 12 0 24 3 0 0 0 0 0 8 3 0 0 0 0 0 0
   8       0 sda 1200 30 90000 400 800 50 64000 900 0 1500 1300 0 0 0 0 0 0
   8       1 sda1 600 10 45000 200 400 25 32000 450 0 750 650 0 0 0 0 0 0
 259       0 nvme0n1 9000 0 720000 1000 5000 0 400000 2000 2 4321 3000 0 0 0 0 0 0
";

    #[test]
    fn io_time_is_field_thirteen() {
        assert_eq!(parse_io_time(DISKSTATS_SAMPLE, "sda"), Some(1500));
        assert_eq!(parse_io_time(DISKSTATS_SAMPLE, "nvme0n1"), Some(4321));
    }

    #[test]
    fn io_time_matches_whole_device_name() {
        assert_eq!(parse_io_time(DISKSTATS_SAMPLE, "sda1"), Some(750));
        assert_eq!(parse_io_time(DISKSTATS_SAMPLE, "sd"), None);
        assert_eq!(parse_io_time("8 0 sda 1 2 3", "sda"), None);
    }

    #[test]
    fn idle_from_io_time_delta() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(1_000);

        assert_eq!(idle_between((1_000, t0), (1_250, t1)), 75.0);
        assert_eq!(idle_between((1_000, t0), (1_000, t1)), 100.0);
        // io_time can outrun wall time on devices with parallel queues.
        assert_eq!(idle_between((0, t0), (5_000, t1)), 0.0);
        assert_eq!(idle_between((10, t0), (20, t0)), 100.0);
    }

    #[test]
    fn first_disk_reading_only_sets_baseline() {
        let baselines = DiskBaselines::default();
        let t0 = Instant::now();

        assert_eq!(baselines.advance("vda", 1_000, t0), None);
        assert_eq!(baselines.advance("vda", 1_250, t0 + Duration::from_secs(1)), Some(75.0));
        // Each device keeps its own baseline.
        assert_eq!(baselines.advance("vdb", 9_000, t0), None);
    }

    #[test]
    fn reopened_disk_counter_keeps_baseline() {
        let source = LinuxSource::new();
        let t0 = Instant::now();
        let first = DiskIdleCounter::new("vda", Arc::clone(&source.disks));
        assert_eq!(first.baselines.advance("vda", 1_000, t0), None);
        drop(first);

        let reopened = DiskIdleCounter::new("vda", Arc::clone(&source.disks));
        let idle = reopened.baselines.advance("vda", 1_500, t0 + Duration::from_secs(1));
        assert_eq!(idle, Some(50.0));
    }

    #[test]
    fn reopened_cpu_counter_keeps_baseline() {
        let source = LinuxSource::new();
        let first = source.open(Category::Cpu, TOTAL_INSTANCE).unwrap();
        assert!(first.next_value().unwrap_err().is_not_ready());
        drop(first);

        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL + Duration::from_millis(50));
        let reopened = source.open(Category::Cpu, TOTAL_INSTANCE).unwrap();
        let usage = reopened.next_value().unwrap();
        assert!((0.0..=100.0).contains(&usage));
    }

    #[test]
    fn gpu_instance_without_suffix_is_rejected() {
        let err = GpuCounter::open(Path::new("/nonexistent"), "card0").err().unwrap();
        assert!(err.is_unavailable());
    }
}

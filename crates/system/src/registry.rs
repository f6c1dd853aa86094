use crate::counter::{
    Category, CounterError, CounterHandle, CounterSource, GPU_ENGINE_SUFFIX, TOTAL_INSTANCE,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Label → open counter for one category.
pub type CounterMap = BTreeMap<String, CounterHandle>;

pub const CPU_LABEL: &str = "CPU";
pub const RAM_LABEL: &str = "RAM";

/// Stable view of every category's counters for one sampling pass.
#[derive(Clone, Default)]
pub struct Counters([Arc<CounterMap>; 4]);

impl Counters {
    pub fn get(&self, category: Category) -> &CounterMap {
        &self.0[category.index()]
    }
}

#[derive(Default)]
struct Slot {
    counters:     Arc<CounterMap>,
    refreshed_at: Option<Instant>,
}

/// Discovers OS counters and keeps one label → handle map per category.
///
/// Each category is rediscovered at most once per `interval`.  A rebuild
/// swaps in a brand-new map; passes still holding the previous [`Counters`]
/// keep sampling the old handles until they drop them.
pub struct Registry<S> {
    source:   S,
    interval: Duration,
    slots:    [Slot; 4],
}

impl<S: CounterSource> Registry<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source,
            interval,
            slots: Default::default(),
        }
    }

    /// Rebuild `category` if it was never built or its interval has elapsed.
    ///
    /// Returns `true` when the map was rebuilt.
    pub fn refresh(&mut self, category: Category, now: Instant) -> bool {
        let slot = &self.slots[category.index()];
        if let Some(at) = slot.refreshed_at {
            if now.saturating_duration_since(at) < self.interval {
                return false;
            }
        }
        self.rebuild(category, now);
        true
    }

    /// Gated refresh of every category.
    pub fn refresh_all(&mut self, now: Instant) {
        for category in Category::ALL {
            self.refresh(category, now);
        }
    }

    /// Rebuild `category` now, ignoring the refresh interval.
    pub fn force_refresh(&mut self, category: Category, now: Instant) {
        debug!(?category, "forced counter refresh");
        self.rebuild(category, now);
    }

    /// Snapshot of all four maps.  Cheap: clones four `Arc`s.
    pub fn counters(&self) -> Counters {
        Counters(std::array::from_fn(|i| Arc::clone(&self.slots[i].counters)))
    }

    fn rebuild(&mut self, category: Category, now: Instant) {
        let counters = match self.discover(category) {
            Ok(map) => map,
            Err(e) => {
                warn!(?category, "counter discovery failed: {e}");
                CounterMap::new()
            }
        };
        debug!(?category, count = counters.len(), "counters rebuilt");

        let slot = &mut self.slots[category.index()];
        slot.counters = Arc::new(counters);
        slot.refreshed_at = Some(now);
    }

    fn discover(&self, category: Category) -> Result<CounterMap, CounterError> {
        let mut map = CounterMap::new();
        match category {
            Category::Cpu => {
                map.insert(CPU_LABEL.into(), self.source.open(category, TOTAL_INSTANCE)?);
            }
            Category::Ram => {
                map.insert(RAM_LABEL.into(), self.source.open(category, TOTAL_INSTANCE)?);
            }
            Category::Disk => {
                for instance in self.source.instances(category)? {
                    if instance == TOTAL_INSTANCE {
                        continue;
                    }
                    let label = disk_label(&instance);
                    if label.is_empty() || map.contains_key(label) {
                        continue;
                    }
                    self.open_into(&mut map, category, label, &instance);
                }
            }
            Category::Gpu => {
                for instance in self.source.instances(category)? {
                    if !instance.ends_with(GPU_ENGINE_SUFFIX) {
                        continue;
                    }
                    self.open_into(&mut map, category, &instance, &instance);
                }
            }
        }
        Ok(map)
    }

    /// A single instance failing to open is skipped, not fatal to the category.
    fn open_into(&self, map: &mut CounterMap, category: Category, label: &str, instance: &str) {
        match self.source.open(category, instance) {
            Ok(handle) => {
                map.insert(label.to_string(), handle);
            }
            Err(e) => debug!(?category, instance, "skipping counter: {e}"),
        }
    }
}

/// Kernel disk families named by letter (`sda`, `vdb`), whose partitions
/// append bare digits (`sda1`).
const LETTER_DISKS: [&str; 4] = ["sd", "vd", "hd", "xvd"];

/// Disk label: the instance name without a leading index (`"0 C:"`) or a
/// partition suffix, so partitions of one physical disk collapse into a
/// single label while distinct disks keep distinct labels.
pub fn disk_label(instance: &str) -> &str {
    let name = instance
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start();
    strip_partition(name)
}

/// `sda1` → `sda`, `nvme0n1p2` → `nvme0n1`, `mmcblk0p1` → `mmcblk0`.
/// Whole-disk names such as `mmcblk0` or `nvme0n1` are returned unchanged.
fn strip_partition(name: &str) -> &str {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() == name.len() {
        return name;
    }

    if let Some(disk) = base.strip_suffix('p') {
        if disk.ends_with(|c: char| c.is_ascii_digit()) {
            return disk;
        }
    }

    let base = base.trim_end();
    let lettered = LETTER_DISKS.iter().any(|family| base.starts_with(family))
        && base.ends_with(|c: char| c.is_ascii_alphabetic());
    if lettered { base } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSource;

    const INTERVAL: Duration = Duration::from_millis(5_000);

    fn registry() -> (MockSource, Registry<MockSource>) {
        let source = MockSource::new(16_000.0);
        source.set_instances(Category::Disk, &["_Total", "0 C:", "1 D:"]);
        source.set_instances(Category::Gpu, &["pid_1_eng_0_engtype_3D", "pid_1_eng_1_engtype_Copy"]);
        (source.clone(), Registry::new(source, INTERVAL))
    }

    fn same_handles(a: &CounterMap, b: &CounterMap) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|((la, ha), (lb, hb))| la == lb && Arc::ptr_eq(ha, hb))
    }

    #[test]
    fn disk_labels_drop_index_and_partition_suffix() {
        assert_eq!(disk_label("0 C:"), "C:");
        assert_eq!(disk_label("sda1"), "sda");
        assert_eq!(disk_label("xvdb12"), "xvdb");
        assert_eq!(disk_label("nvme0n1p2"), "nvme0n1");
        assert_eq!(disk_label("mmcblk0p1"), "mmcblk0");
        assert_eq!(disk_label("123"), "");
    }

    #[test]
    fn whole_disk_names_are_kept() {
        for name in ["sda", "mmcblk0", "mmcblk1", "nvme0n1", "nvme0n2", "loop0", "dm-0"] {
            assert_eq!(disk_label(name), name);
        }
    }

    #[test]
    fn distinct_disks_get_distinct_gauges() {
        let (source, mut reg) = registry();
        source.set_instances(Category::Disk, &["mmcblk0", "mmcblk1", "nvme0n1", "nvme0n2"]);
        reg.refresh(Category::Disk, Instant::now());

        let c = reg.counters();
        assert_eq!(
            c.get(Category::Disk).keys().collect::<Vec<_>>(),
            ["mmcblk0", "mmcblk1", "nvme0n1", "nvme0n2"],
        );
    }

    #[test]
    fn first_refresh_discovers_every_category() {
        let (_, mut reg) = registry();
        reg.refresh_all(Instant::now());
        let c = reg.counters();

        assert!(c.get(Category::Cpu).contains_key(CPU_LABEL));
        assert!(c.get(Category::Ram).contains_key(RAM_LABEL));
        assert_eq!(c.get(Category::Disk).keys().collect::<Vec<_>>(), ["C:", "D:"]);
        assert_eq!(c.get(Category::Gpu).keys().collect::<Vec<_>>(), ["pid_1_eng_0_engtype_3D"]);
    }

    #[test]
    fn partitions_merge_into_one_label() {
        let (source, mut reg) = registry();
        source.set_instances(Category::Disk, &["sda", "sda1", "sda2", "nvme0n1", "nvme0n1p1"]);
        reg.refresh(Category::Disk, Instant::now());

        let c = reg.counters();
        assert_eq!(c.get(Category::Disk).keys().collect::<Vec<_>>(), ["nvme0n1", "sda"]);
    }

    #[test]
    fn refresh_inside_interval_keeps_handles() {
        let (source, mut reg) = registry();
        let t0 = Instant::now();
        reg.refresh_all(t0);
        let before = reg.counters();
        let opened = source.opened();

        source.set_instances(Category::Disk, &["2 E:"]);
        assert!(!reg.refresh(Category::Disk, t0 + Duration::from_millis(4_999)));

        let after = reg.counters();
        assert!(same_handles(before.get(Category::Disk), after.get(Category::Disk)));
        assert_eq!(source.opened(), opened);
    }

    #[test]
    fn refresh_after_interval_rebuilds() {
        let (source, mut reg) = registry();
        let t0 = Instant::now();
        reg.refresh_all(t0);
        let before = reg.counters();

        source.set_instances(Category::Disk, &["0 C:", "2 E:"]);
        assert!(reg.refresh(Category::Disk, t0 + INTERVAL));

        let after = reg.counters();
        let disks = after.get(Category::Disk);
        assert_eq!(disks.keys().collect::<Vec<_>>(), ["C:", "E:"]);
        assert!(!Arc::ptr_eq(&before.get(Category::Disk)["C:"], &disks["C:"]));
        // Other categories stay on their own clocks.
        assert!(same_handles(before.get(Category::Cpu), after.get(Category::Cpu)));
    }

    #[test]
    fn force_refresh_ignores_interval() {
        let (source, mut reg) = registry();
        let t0 = Instant::now();
        reg.refresh_all(t0);

        source.set_instances(Category::Gpu, &[]);
        reg.force_refresh(Category::Gpu, t0 + Duration::from_millis(1));
        assert!(reg.counters().get(Category::Gpu).is_empty());
    }

    #[test]
    fn old_snapshot_survives_rebuild() {
        let (source, mut reg) = registry();
        let t0 = Instant::now();
        reg.refresh_all(t0);
        let held = reg.counters();

        source.set_instances(Category::Disk, &[]);
        reg.force_refresh(Category::Disk, t0);

        assert_eq!(held.get(Category::Disk).len(), 2);
        assert!(reg.counters().get(Category::Disk).is_empty());
    }
}

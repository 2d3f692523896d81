//! The deferred area scanner.
//!
//! A full rescan of an area's volume is spread over many ticks at a fixed
//! per-tick budget. Each area has at most one in-flight [`ScanJob`]: it is
//! created (clearing the area's cache) on the first tick after the previous
//! one finished, advanced by at most one batch per tick, and discarded as
//! soon as its iterator runs dry.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use corral_types::{AreaId, BlockPos, Bounds, BoundsIter, JobType};
use tracing::{debug, trace};

use crate::cache::TargetCache;

/// A set of per-job validators evaluated against each scanned position.
pub trait ValidatorSet<W: ?Sized> {
    /// Call `on_match` once for every job whose validator accepts `pos`.
    fn for_each_match(&self, world: &W, pos: BlockPos, on_match: &mut dyn FnMut(JobType));
}

impl<W: ?Sized, F> ValidatorSet<W> for [(JobType, F)]
where
    F: Fn(&W, BlockPos) -> bool,
{
    fn for_each_match(&self, world: &W, pos: BlockPos, on_match: &mut dyn FnMut(JobType)) {
        for (job, validator) in self {
            if validator(world, pos) {
                on_match(*job);
            }
        }
    }
}

/// An in-progress rescan of one area.
#[derive(Debug, Clone)]
pub struct ScanJob {
    positions: BoundsIter,
    last_tick: Option<u64>,
}

impl ScanJob {
    fn new(bounds: Bounds) -> Self {
        Self {
            positions: bounds.iter(),
            last_tick: None,
        }
    }

    /// Positions still to be evaluated.
    pub const fn remaining(&self) -> u64 {
        self.positions.remaining()
    }

    /// The last tick a batch was processed.
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }
}

/// Amortized scanner over all registered areas.
#[derive(Debug, Clone)]
pub struct DeferredScanner {
    blocks_per_tick: u32,
    jobs: BTreeMap<AreaId, ScanJob>,
}

impl DeferredScanner {
    /// A scanner evaluating at most `blocks_per_tick` positions per area
    /// per tick. A budget of 0 is treated as 1.
    pub const fn new(blocks_per_tick: u32) -> Self {
        Self {
            blocks_per_tick: if blocks_per_tick == 0 { 1 } else { blocks_per_tick },
            jobs: BTreeMap::new(),
        }
    }

    /// Change the per-tick budget. In-flight scans continue from where
    /// they are.
    pub const fn set_blocks_per_tick(&mut self, blocks_per_tick: u32) {
        self.blocks_per_tick = if blocks_per_tick == 0 { 1 } else { blocks_per_tick };
    }

    /// Current per-tick budget.
    pub const fn blocks_per_tick(&self) -> u32 {
        self.blocks_per_tick
    }

    /// Advance the scan of `area` by one batch and return the number of
    /// positions evaluated.
    ///
    /// Starts a fresh scan (and clears the area's cached targets) if none
    /// is in flight. A second call for the same area within tick `now`
    /// does nothing and returns 0.
    pub fn tick<W, V>(
        &mut self,
        area: AreaId,
        bounds: Bounds,
        world: &W,
        validators: &V,
        cache: &mut TargetCache,
        now: u64,
    ) -> usize
    where
        W: ?Sized,
        V: ValidatorSet<W> + ?Sized,
    {
        let budget = usize::try_from(self.blocks_per_tick).unwrap_or(usize::MAX);
        let job = match self.jobs.entry(area) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                cache.clear_targets(area);
                debug!(now, %area, volume = bounds.volume(), "scan cycle started");
                entry.insert(ScanJob::new(bounds))
            }
        };

        if job.last_tick == Some(now) {
            return 0;
        }
        job.last_tick = Some(now);

        let mut scanned: usize = 0;
        for pos in job.positions.by_ref().take(budget) {
            validators.for_each_match(world, pos, &mut |matched| {
                cache.add_target(area, matched, pos);
            });
            scanned = scanned.saturating_add(1);
        }
        trace!(now, %area, scanned, remaining = job.remaining(), "scan batch");

        if job.positions.is_exhausted() {
            self.jobs.remove(&area);
            debug!(now, %area, "scan cycle complete");
        }
        scanned
    }

    /// Whether a scan of `area` is in flight.
    pub fn is_scan_active(&self, area: AreaId) -> bool {
        self.jobs.contains_key(&area)
    }

    /// The in-flight scan of `area`, if any.
    pub fn scan_job(&self, area: AreaId) -> Option<&ScanJob> {
        self.jobs.get(&area)
    }

    /// Abandon any in-flight scan of `area`.
    pub fn remove_area(&mut self, area: AreaId) {
        self.jobs.remove(&area);
    }
}

impl Default for DeferredScanner {
    fn default() -> Self {
        Self::new(15)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;

    type Validator = fn(&(), BlockPos) -> bool;

    fn area() -> AreaId {
        AreaId(BlockPos::new(0, 0, 0))
    }

    fn bounds() -> Bounds {
        Bounds::around(BlockPos::new(0, 0, 0), 2, 1)
    }

    fn on_axis(_: &(), pos: BlockPos) -> bool {
        pos.y == 0 && pos.z == 0
    }

    fn everywhere(_: &(), _: BlockPos) -> bool {
        true
    }

    #[test]
    fn full_scan_of_75_cells_takes_five_ticks() {
        let mut scanner = DeferredScanner::new(15);
        let mut cache = TargetCache::new();
        let validators: [(JobType, Validator); 1] = [(JobType::BerryHarvester, on_axis)];

        for now in 1..=4 {
            let n = scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, now);
            assert_eq!(n, 15);
            assert!(scanner.is_scan_active(area()));
        }
        let n = scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, 5);
        assert_eq!(n, 15);
        assert!(!scanner.is_scan_active(area()));
        assert_eq!(cache.target_count(area(), JobType::BerryHarvester), 5);

        // Tick 6 starts over and wipes the previous results first.
        let n = scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, 6);
        assert_eq!(n, 15);
        assert!(scanner.is_scan_active(area()));
        assert_eq!(scanner.scan_job(area()).map(ScanJob::remaining), Some(60));
        assert!(cache.target_count(area(), JobType::BerryHarvester) < 5);
    }

    #[test]
    fn budget_bounds_every_call() {
        let mut scanner = DeferredScanner::new(7);
        let mut cache = TargetCache::new();
        let huge = Bounds::around(BlockPos::new(0, 0, 0), 50, 20);
        let validators: [(JobType, Validator); 1] = [(JobType::Storage, everywhere)];
        for now in 0..20 {
            let n = scanner.tick(area(), huge, &(), &validators[..], &mut cache, now);
            assert!(n <= 7);
        }
        assert_eq!(cache.target_count(area(), JobType::Storage), 140);
    }

    #[test]
    fn same_tick_is_processed_once() {
        let mut scanner = DeferredScanner::new(15);
        let mut cache = TargetCache::new();
        let validators: [(JobType, Validator); 1] = [(JobType::Storage, everywhere)];
        assert_eq!(scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, 3), 15);
        assert_eq!(scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, 3), 0);
        assert_eq!(scanner.scan_job(area()).and_then(ScanJob::last_tick), Some(3));
        assert_eq!(scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, 4), 15);
    }

    #[test]
    fn every_position_is_evaluated_once_per_validator() {
        let seen: RefCell<BTreeMap<(JobType, BlockPos), u32>> = RefCell::new(BTreeMap::new());
        let record = |job: JobType| {
            let seen = &seen;
            move |_: &(), pos: BlockPos| {
                let mut seen = seen.borrow_mut();
                let count = seen.entry((job, pos)).or_insert(0);
                *count = count.saturating_add(1);
                false
            }
        };
        let validators = [
            (JobType::BerryHarvester, record(JobType::BerryHarvester)),
            (JobType::MintHarvester, record(JobType::MintHarvester)),
        ];

        let mut scanner = DeferredScanner::new(15);
        let mut cache = TargetCache::new();
        // ceil(75 / 15) = 5 ticks.
        for now in 0..5 {
            scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, now);
        }
        assert!(!scanner.is_scan_active(area()));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 150);
        assert!(seen.values().all(|count| *count == 1));
        for pos in bounds() {
            assert!(seen.contains_key(&(JobType::BerryHarvester, pos)));
            assert!(seen.contains_key(&(JobType::MintHarvester, pos)));
        }
    }

    #[test]
    fn uneven_volume_finishes_with_partial_batch() {
        let mut scanner = DeferredScanner::new(20);
        let mut cache = TargetCache::new();
        let validators: [(JobType, Validator); 1] = [(JobType::Storage, everywhere)];
        let counts: Vec<usize> = (0..4)
            .map(|now| scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, now))
            .collect();
        assert_eq!(counts, vec![20, 20, 20, 15]);
        assert!(!scanner.is_scan_active(area()));
    }

    #[test]
    fn remove_area_abandons_scan() {
        let mut scanner = DeferredScanner::new(15);
        let mut cache = TargetCache::new();
        let validators: [(JobType, Validator); 1] = [(JobType::Storage, everywhere)];
        scanner.tick(area(), bounds(), &(), &validators[..], &mut cache, 0);
        scanner.remove_area(area());
        assert!(!scanner.is_scan_active(area()));
    }

    #[test]
    fn zero_budget_is_clamped() {
        let mut scanner = DeferredScanner::new(0);
        assert_eq!(scanner.blocks_per_tick(), 1);
        scanner.set_blocks_per_tick(0);
        assert_eq!(scanner.blocks_per_tick(), 1);
    }
}

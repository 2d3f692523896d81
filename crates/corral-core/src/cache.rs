//! Per-area, per-job sets of candidate positions.
//!
//! Entries are only as fresh as the last full scan of their area. Every
//! consumer re-validates a candidate against the live world before acting.

use std::collections::{BTreeMap, BTreeSet};

use corral_types::{AreaId, BlockPos, JobType};

/// Candidate positions keyed by area, then job.
#[derive(Debug, Clone, Default)]
pub struct TargetCache {
    areas: BTreeMap<AreaId, BTreeMap<JobType, BTreeSet<BlockPos>>>,
}

impl TargetCache {
    /// An empty cache.
    pub const fn new() -> Self {
        Self {
            areas: BTreeMap::new(),
        }
    }

    /// Candidates for `job` in `area`, in position order.
    pub fn targets(&self, area: AreaId, job: JobType) -> impl Iterator<Item = BlockPos> + '_ {
        self.areas
            .get(&area)
            .and_then(|jobs| jobs.get(&job))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Number of candidates for `job` in `area`.
    pub fn target_count(&self, area: AreaId, job: JobType) -> usize {
        self.areas
            .get(&area)
            .and_then(|jobs| jobs.get(&job))
            .map_or(0, BTreeSet::len)
    }

    /// Whether `pos` is a cached candidate for `job` in `area`.
    pub fn contains(&self, area: AreaId, job: JobType, pos: BlockPos) -> bool {
        self.areas
            .get(&area)
            .and_then(|jobs| jobs.get(&job))
            .is_some_and(|set| set.contains(&pos))
    }

    /// Record `pos` as a candidate for `job` in `area`.
    pub fn add_target(&mut self, area: AreaId, job: JobType, pos: BlockPos) {
        self.areas
            .entry(area)
            .or_default()
            .entry(job)
            .or_default()
            .insert(pos);
    }

    /// Forget every candidate of every job in `area`. The area stays (or
    /// becomes) known with no targets.
    pub fn clear_targets(&mut self, area: AreaId) {
        self.areas.entry(area).or_default().clear();
    }

    /// Forget the area entirely.
    pub fn remove_area(&mut self, area: AreaId) {
        self.areas.remove(&area);
    }

    /// Whether the cache has an entry for `area`.
    pub fn has_area(&self, area: AreaId) -> bool {
        self.areas.contains_key(&area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> AreaId {
        AreaId(BlockPos::new(0, 64, 0))
    }

    #[test]
    fn add_and_read_back() {
        let mut cache = TargetCache::new();
        cache.add_target(area(), JobType::BerryHarvester, BlockPos::new(2, 64, 0));
        cache.add_target(area(), JobType::BerryHarvester, BlockPos::new(1, 64, 0));
        cache.add_target(area(), JobType::BerryHarvester, BlockPos::new(1, 64, 0));
        let targets: Vec<BlockPos> = cache.targets(area(), JobType::BerryHarvester).collect();
        assert_eq!(targets, vec![BlockPos::new(1, 64, 0), BlockPos::new(2, 64, 0)]);
        assert_eq!(cache.target_count(area(), JobType::BerryHarvester), 2);
        assert_eq!(cache.target_count(area(), JobType::MintHarvester), 0);
    }

    #[test]
    fn unknown_area_has_no_targets() {
        let cache = TargetCache::new();
        assert_eq!(cache.targets(area(), JobType::Storage).count(), 0);
        assert!(!cache.has_area(area()));
    }

    #[test]
    fn clear_keeps_area_remove_drops_it() {
        let mut cache = TargetCache::new();
        let pos = BlockPos::new(0, 64, 1);
        cache.add_target(area(), JobType::Storage, pos);
        assert!(cache.contains(area(), JobType::Storage, pos));

        cache.clear_targets(area());
        assert!(cache.has_area(area()));
        assert!(!cache.contains(area(), JobType::Storage, pos));

        cache.remove_area(area());
        assert!(!cache.has_area(area()));
    }

    #[test]
    fn areas_are_isolated() {
        let mut cache = TargetCache::new();
        let other = AreaId(BlockPos::new(100, 64, 0));
        cache.add_target(area(), JobType::CropHarvester, BlockPos::new(0, 64, 0));
        cache.clear_targets(other);
        assert_eq!(cache.target_count(area(), JobType::CropHarvester), 1);
        assert_eq!(cache.target_count(other, JobType::CropHarvester), 0);
    }
}

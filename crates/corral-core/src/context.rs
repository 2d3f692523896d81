//! [`CoordinationContext`]: every piece of mutable coordination state for
//! one simulation.
//!
//! Nothing in the core is global. Two contexts never share claims, caches,
//! or carry state, so independent simulations (and tests) can run side by
//! side.

use std::collections::BTreeMap;

use corral_types::{AgentId, AreaId, JobType};
use corral_world::World;

use crate::area::Area;
use crate::cache::TargetCache;
use crate::carry::CarryState;
use crate::claims::{ClaimCoordinator, ClaimTimeouts};
use crate::config::CoordinationSettings;
use crate::scanner::{DeferredScanner, ValidatorSet};

/// Claims, target cache, scanner progress, and carry state.
#[derive(Debug, Clone)]
pub struct CoordinationContext {
    pub(crate) settings: CoordinationSettings,
    pub(crate) claims: ClaimCoordinator,
    pub(crate) cache: TargetCache,
    pub(crate) scanner: DeferredScanner,
    pub(crate) carry: CarryState,
    /// Which job placed each agent's current position claim.
    pub(crate) claim_owners: BTreeMap<AgentId, JobType>,
}

impl CoordinationContext {
    /// A fresh context running on `settings`.
    pub fn new(settings: CoordinationSettings) -> Self {
        Self {
            claims: ClaimCoordinator::new(ClaimTimeouts::from(&settings)),
            scanner: DeferredScanner::new(settings.blocks_per_tick),
            cache: TargetCache::new(),
            carry: CarryState::new(),
            claim_owners: BTreeMap::new(),
            settings,
        }
    }

    /// Swap in a new settings snapshot. Claims, caches, and carry state
    /// are kept; in-flight scans continue with the new budget.
    pub fn apply_settings(&mut self, settings: CoordinationSettings) {
        self.claims.set_timeouts(ClaimTimeouts::from(&settings));
        self.scanner.set_blocks_per_tick(settings.blocks_per_tick);
        self.settings = settings;
    }

    /// The settings snapshot in effect.
    pub const fn settings(&self) -> &CoordinationSettings {
        &self.settings
    }

    /// The claim coordinator.
    pub const fn claims(&self) -> &ClaimCoordinator {
        &self.claims
    }

    /// Mutable access to the claim coordinator.
    pub const fn claims_mut(&mut self) -> &mut ClaimCoordinator {
        &mut self.claims
    }

    /// The target cache.
    pub const fn cache(&self) -> &TargetCache {
        &self.cache
    }

    /// Mutable access to the target cache.
    pub const fn cache_mut(&mut self) -> &mut TargetCache {
        &mut self.cache
    }

    /// The deferred scanner.
    pub const fn scanner(&self) -> &DeferredScanner {
        &self.scanner
    }

    /// Carry state of every agent.
    pub const fn carry(&self) -> &CarryState {
        &self.carry
    }

    /// Mutable access to carry state.
    pub const fn carry_mut(&mut self) -> &mut CarryState {
        &mut self.carry
    }

    /// The job that placed the agent's current claim.
    pub fn claim_owner(&self, agent: AgentId) -> Option<JobType> {
        self.claim_owners.get(&agent).copied()
    }

    /// Advance the deferred scan of `area` by one batch.
    pub fn scan_area<W, V>(&mut self, area: &Area, world: &W, validators: &V) -> usize
    where
        W: World,
        V: ValidatorSet<W> + ?Sized,
    {
        let now = world.tick();
        self.scanner
            .tick(area.id, area.bounds(), world, validators, &mut self.cache, now)
    }

    /// Forget the area's cache and abandon its scan.
    pub fn remove_area(&mut self, area: AreaId) {
        self.cache.remove_area(area);
        self.scanner.remove_area(area);
    }

    /// Whether the agent is committed to a job other than `job`: it holds
    /// a live claim that another job placed, or carries another job's
    /// payload. Forgets the owner of a claim that has timed out.
    pub(crate) fn engaged_elsewhere(&mut self, agent: AgentId, job: JobType, now: u64) -> bool {
        if self.claims.target_of(agent, now).is_some() {
            if self.claim_owners.get(&agent) != Some(&job) {
                return true;
            }
        } else {
            self.claim_owners.remove(&agent);
        }
        self.carry.carrying_for(agent).is_some_and(|owner| owner != job)
    }
}

impl Default for CoordinationContext {
    fn default() -> Self {
        Self::new(CoordinationSettings::default())
    }
}

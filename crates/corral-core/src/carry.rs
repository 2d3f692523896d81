//! Per-agent carry state: payloads awaiting deposit, destinations already
//! tried in the current carry cycle, and idle-generation timestamps.
//!
//! An agent carries for one job at a time. Emptying a payload always clears
//! the tried-destination set with it.

use std::collections::{BTreeMap, BTreeSet};

use corral_types::{AgentId, BlockPos, ItemStack, JobType, total_count};

#[derive(Debug, Clone)]
struct Payload {
    job: JobType,
    stacks: Vec<ItemStack>,
}

/// Payloads, tried destinations, and generation timestamps.
#[derive(Debug, Clone, Default)]
pub struct CarryState {
    payloads: BTreeMap<AgentId, Payload>,
    tried: BTreeMap<AgentId, BTreeSet<BlockPos>>,
    last_generation: BTreeMap<(AgentId, JobType), u64>,
}

impl CarryState {
    /// Empty carry state.
    pub const fn new() -> Self {
        Self {
            payloads: BTreeMap::new(),
            tried: BTreeMap::new(),
            last_generation: BTreeMap::new(),
        }
    }

    /// The agent's payload, if it is carrying one.
    pub fn payload(&self, agent: AgentId) -> Option<&[ItemStack]> {
        self.payloads.get(&agent).map(|p| p.stacks.as_slice())
    }

    /// The job the agent is carrying for.
    pub fn carrying_for(&self, agent: AgentId) -> Option<JobType> {
        self.payloads.get(&agent).map(|p| p.job)
    }

    /// Total items the agent carries.
    pub fn carried_count(&self, agent: AgentId) -> u64 {
        self.payload(agent).map_or(0, total_count)
    }

    /// Replace the agent's payload. Empty stacks are discarded; an empty
    /// result clears the carry cycle.
    pub fn set_payload(&mut self, agent: AgentId, job: JobType, stacks: Vec<ItemStack>) {
        let stacks: Vec<ItemStack> = stacks.into_iter().filter(|s| !s.is_empty()).collect();
        if stacks.is_empty() {
            self.clear(agent);
        } else {
            self.payloads.insert(agent, Payload { job, stacks });
        }
    }

    /// End the carry cycle: drop the payload and the tried set.
    pub fn clear(&mut self, agent: AgentId) {
        self.payloads.remove(&agent);
        self.tried.remove(&agent);
    }

    /// Remember that `destination` did not take the payload.
    pub fn mark_tried(&mut self, agent: AgentId, destination: BlockPos) {
        self.tried.entry(agent).or_default().insert(destination);
    }

    /// Whether `destination` was already tried this carry cycle.
    pub fn was_tried(&self, agent: AgentId, destination: BlockPos) -> bool {
        self.tried
            .get(&agent)
            .is_some_and(|set| set.contains(&destination))
    }

    /// Number of destinations tried this carry cycle.
    pub fn tried_count(&self, agent: AgentId) -> usize {
        self.tried.get(&agent).map_or(0, BTreeSet::len)
    }

    /// Tick of the agent's last generation for `job`, 0 if never.
    pub fn last_generation(&self, agent: AgentId, job: JobType) -> u64 {
        self.last_generation.get(&(agent, job)).copied().unwrap_or(0)
    }

    /// Record a generation attempt at `now`.
    pub fn record_generation(&mut self, agent: AgentId, job: JobType, now: u64) {
        self.last_generation.insert((agent, job), now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_clears_cycle() {
        let mut carry = CarryState::new();
        let agent = AgentId::new();
        carry.set_payload(agent, JobType::BerryHarvester, vec![ItemStack::new("x", 3)]);
        carry.mark_tried(agent, BlockPos::new(1, 0, 0));
        assert_eq!(carry.carried_count(agent), 3);
        assert_eq!(carry.carrying_for(agent), Some(JobType::BerryHarvester));

        carry.set_payload(agent, JobType::BerryHarvester, vec![ItemStack::new("x", 0)]);
        assert!(carry.payload(agent).is_none());
        assert_eq!(carry.tried_count(agent), 0);
    }

    #[test]
    fn tried_is_per_agent() {
        let mut carry = CarryState::new();
        let (a, b) = (AgentId::new(), AgentId::new());
        let chest = BlockPos::new(0, 0, 5);
        carry.mark_tried(a, chest);
        assert!(carry.was_tried(a, chest));
        assert!(!carry.was_tried(b, chest));
    }

    #[test]
    fn generation_defaults_to_zero() {
        let mut carry = CarryState::new();
        let agent = AgentId::new();
        assert_eq!(carry.last_generation(agent, JobType::DiveLooter), 0);
        carry.record_generation(agent, JobType::DiveLooter, 2400);
        assert_eq!(carry.last_generation(agent, JobType::DiveLooter), 2400);
        assert_eq!(carry.last_generation(agent, JobType::PickUpLooter), 0);
    }
}

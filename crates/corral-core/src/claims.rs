//! The claim coordinator: exclusive, time-bounded ownership of targets.
//!
//! Claims are a logical mutual-exclusion mechanism between agents that each
//! re-evaluate "nearest candidate" every tick. Two tables exist: one keyed
//! by world position and one keyed by a target agent (for social jobs).
//! Both share [`ClaimTable`] semantics:
//!
//! - an agent holds at most one claim per table, and claiming something
//!   new releases the old claim first;
//! - a target is held by at most one agent;
//! - a claim older than the claim timeout is force-released by a lazy
//!   sweep at the top of every operation, with no cooldown;
//! - an explicit release puts the target on a cooldown during which nobody
//!   may claim it.
//!
//! When a claimant's claim in either table times out, the sweep drops its
//! claims in both tables.

use std::collections::{BTreeMap, BTreeSet};

use corral_types::{AgentId, BlockPos};
use tracing::debug;

use crate::config::CoordinationSettings;

/// Errors returned by claim operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// Another agent holds a live claim on the position.
    #[error("position {position} is already claimed by {holder}")]
    AlreadyClaimed {
        /// The contested position.
        position: BlockPos,
        /// The agent holding it.
        holder: AgentId,
    },

    /// The position was released recently and is still cooling down.
    #[error("position {position} is cooling down until tick {until}")]
    CoolingDown {
        /// The contested position.
        position: BlockPos,
        /// Last tick of the cooldown window.
        until: u64,
    },

    /// Another agent holds a live claim on the target agent.
    #[error("agent {target} is already claimed by {holder}")]
    AgentAlreadyClaimed {
        /// The contested agent.
        target: AgentId,
        /// The agent holding it.
        holder: AgentId,
    },

    /// The target agent was released recently and is still cooling down.
    #[error("agent {target} is cooling down until tick {until}")]
    AgentCoolingDown {
        /// The contested agent.
        target: AgentId,
        /// Last tick of the cooldown window.
        until: u64,
    },
}

/// Claim timing, copied out of [`CoordinationSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTimeouts {
    /// A claim with `now - claim_tick > claim_timeout` is force-released.
    pub claim_timeout: u64,
    /// A released target is cooling down while `now - release_tick <= cooldown`.
    pub cooldown: u64,
}

impl From<&CoordinationSettings> for ClaimTimeouts {
    fn from(settings: &CoordinationSettings) -> Self {
        Self {
            claim_timeout: settings.claim_timeout_ticks,
            cooldown: settings.expired_target_timeout_ticks,
        }
    }
}

/// Why a claim attempt was refused by a [`ClaimTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Held by this other agent.
    Held(AgentId),
    /// Cooling down until this tick (inclusive).
    Cooling(u64),
}

#[derive(Debug, Clone, Copy)]
struct Claim<K> {
    target: K,
    tick: u64,
}

/// One claim table keyed by target type `K`.
///
/// All methods take the current tick and the timeouts explicitly; the
/// table itself holds no clock.
#[derive(Debug, Clone)]
pub struct ClaimTable<K> {
    by_agent: BTreeMap<AgentId, Claim<K>>,
    by_target: BTreeMap<K, AgentId>,
    released: BTreeMap<K, u64>,
}

impl<K> Default for ClaimTable<K> {
    fn default() -> Self {
        Self {
            by_agent: BTreeMap::new(),
            by_target: BTreeMap::new(),
            released: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> ClaimTable<K> {
    /// Drop timed-out claims and purge finished cooldowns. Returns the
    /// agents whose claims timed out.
    pub fn sweep(&mut self, now: u64, timeouts: ClaimTimeouts) -> Vec<AgentId> {
        let expired: Vec<AgentId> = self
            .by_agent
            .iter()
            .filter(|(_, claim)| now.saturating_sub(claim.tick) > timeouts.claim_timeout)
            .map(|(agent, _)| *agent)
            .collect();
        for agent in &expired {
            self.drop_claim(*agent);
        }
        self.released
            .retain(|_, tick| now.saturating_sub(*tick) <= timeouts.cooldown);
        expired
    }

    /// Remove an agent's claim without starting a cooldown.
    pub fn drop_claim(&mut self, agent: AgentId) -> Option<K> {
        let claim = self.by_agent.remove(&agent)?;
        self.by_target.remove(&claim.target);
        Some(claim.target)
    }

    /// Claim `target` for `agent` at `now`.
    ///
    /// Any previous claim of the agent on a different target is released
    /// (with cooldown) first. Re-claiming the agent's own target refreshes
    /// its claim tick.
    pub fn claim(
        &mut self,
        agent: AgentId,
        target: K,
        now: u64,
        timeouts: ClaimTimeouts,
    ) -> Result<(), Refusal> {
        if let Some(holder) = self.by_target.get(&target).copied() {
            if holder != agent {
                return Err(Refusal::Held(holder));
            }
        } else if let Some(until) = self.cooling_until(&target, timeouts) {
            return Err(Refusal::Cooling(until));
        }

        if self.by_agent.get(&agent).is_some_and(|c| c.target != target) {
            self.release(agent, now);
        }
        self.by_agent.insert(agent, Claim { target, tick: now });
        self.by_target.insert(target, agent);
        Ok(())
    }

    /// Release the agent's claim and start the target's cooldown.
    pub fn release(&mut self, agent: AgentId, now: u64) -> Option<K> {
        let target = self.drop_claim(agent)?;
        self.released.insert(target, now);
        Some(target)
    }

    /// The agent's claimed target.
    pub fn target_of(&self, agent: AgentId) -> Option<K> {
        self.by_agent.get(&agent).map(|c| c.target)
    }

    /// The agent holding `target`.
    pub fn holder_of(&self, target: &K) -> Option<AgentId> {
        self.by_target.get(target).copied()
    }

    /// Last cooling tick of `target`, if it is cooling down.
    fn cooling_until(&self, target: &K, timeouts: ClaimTimeouts) -> Option<u64> {
        self.released
            .get(target)
            .map(|tick| tick.saturating_add(timeouts.cooldown))
    }

    /// Whether `target` is within its post-release cooldown. Assumes the
    /// table was swept at `now`.
    pub fn is_cooling_down(&self, target: &K) -> bool {
        self.released.contains_key(target)
    }

    /// Number of live claims.
    pub fn len(&self) -> usize {
        self.by_agent.len()
    }

    /// Whether no claims are held.
    pub fn is_empty(&self) -> bool {
        self.by_agent.is_empty()
    }
}

/// Position and agent claim tables with a shared expiry sweep.
#[derive(Debug, Clone)]
pub struct ClaimCoordinator {
    timeouts: ClaimTimeouts,
    positions: ClaimTable<BlockPos>,
    agents: ClaimTable<AgentId>,
}

impl ClaimCoordinator {
    /// An empty coordinator using the given timing.
    pub fn new(timeouts: ClaimTimeouts) -> Self {
        Self {
            timeouts,
            positions: ClaimTable::default(),
            agents: ClaimTable::default(),
        }
    }

    /// Current timing.
    pub const fn timeouts(&self) -> ClaimTimeouts {
        self.timeouts
    }

    /// Replace the timing. Existing claims and cooldowns are re-evaluated
    /// against the new values on the next operation.
    pub const fn set_timeouts(&mut self, timeouts: ClaimTimeouts) {
        self.timeouts = timeouts;
    }

    /// Expiry sweep over both tables.
    ///
    /// A claimant that timed out in either table loses its claims in both.
    /// Runs at the top of every public operation; calling it directly is
    /// only needed to observe expiry without touching a claim.
    pub fn sweep(&mut self, now: u64) {
        let mut expired: BTreeSet<AgentId> =
            self.positions.sweep(now, self.timeouts).into_iter().collect();
        expired.extend(self.agents.sweep(now, self.timeouts));
        for agent in expired {
            let position = self.positions.drop_claim(agent);
            let target = self.agents.drop_claim(agent);
            debug!(now, %agent, ?position, ?target, "claims timed out");
        }
    }

    // -----------------------------------------------------------------
    // Position claims
    // -----------------------------------------------------------------

    /// Claim `position` for `agent`, releasing the agent's previous
    /// position claim.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::AlreadyClaimed`] if another agent holds the
    /// position, or [`ClaimError::CoolingDown`] if it was released within
    /// the cooldown window.
    pub fn claim(&mut self, agent: AgentId, position: BlockPos, now: u64) -> Result<(), ClaimError> {
        self.sweep(now);
        self.positions
            .claim(agent, position, now, self.timeouts)
            .map_err(|refusal| match refusal {
                Refusal::Held(holder) => ClaimError::AlreadyClaimed { position, holder },
                Refusal::Cooling(until) => ClaimError::CoolingDown { position, until },
            })?;
        debug!(now, %agent, %position, "position claimed");
        Ok(())
    }

    /// Release the agent's position claim and start its cooldown.
    pub fn release(&mut self, agent: AgentId, now: u64) -> Option<BlockPos> {
        self.sweep(now);
        let released = self.positions.release(agent, now);
        if let Some(position) = released {
            debug!(now, %agent, %position, "position released");
        }
        released
    }

    /// The agent's live position claim.
    pub fn target_of(&mut self, agent: AgentId, now: u64) -> Option<BlockPos> {
        self.sweep(now);
        self.positions.target_of(agent)
    }

    /// The agent holding a live claim on `position`.
    pub fn holder_of(&mut self, position: BlockPos, now: u64) -> Option<AgentId> {
        self.sweep(now);
        self.positions.holder_of(&position)
    }

    /// Whether any live claim covers `position`.
    pub fn is_targeted(&mut self, position: BlockPos, now: u64) -> bool {
        self.holder_of(position, now).is_some()
    }

    /// Whether `position` is within its post-release cooldown.
    pub fn is_cooling_down(&mut self, position: BlockPos, now: u64) -> bool {
        self.sweep(now);
        self.positions.is_cooling_down(&position)
    }

    /// Number of live position claims.
    pub fn position_claims(&self) -> usize {
        self.positions.len()
    }

    // -----------------------------------------------------------------
    // Agent claims
    // -----------------------------------------------------------------

    /// Claim another agent as `agent`'s social target.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimError::AgentAlreadyClaimed`] if someone else holds
    /// the target, or [`ClaimError::AgentCoolingDown`] if it was released
    /// within the cooldown window.
    pub fn claim_agent(&mut self, agent: AgentId, target: AgentId, now: u64) -> Result<(), ClaimError> {
        self.sweep(now);
        self.agents
            .claim(agent, target, now, self.timeouts)
            .map_err(|refusal| match refusal {
                Refusal::Held(holder) => ClaimError::AgentAlreadyClaimed { target, holder },
                Refusal::Cooling(until) => ClaimError::AgentCoolingDown { target, until },
            })?;
        debug!(now, %agent, %target, "agent claimed");
        Ok(())
    }

    /// Release the agent's social target and start its cooldown.
    pub fn release_agent(&mut self, agent: AgentId, now: u64) -> Option<AgentId> {
        self.sweep(now);
        let released = self.agents.release(agent, now);
        if let Some(target) = released {
            debug!(now, %agent, %target, "agent released");
        }
        released
    }

    /// The agent's live social target.
    pub fn agent_target_of(&mut self, agent: AgentId, now: u64) -> Option<AgentId> {
        self.sweep(now);
        self.agents.target_of(agent)
    }

    /// Whether any live claim covers the target agent.
    pub fn is_agent_targeted(&mut self, target: AgentId, now: u64) -> bool {
        self.sweep(now);
        self.agents.holder_of(&target).is_some()
    }

    /// Whether the target agent is within its post-release cooldown.
    pub fn is_agent_cooling_down(&mut self, target: AgentId, now: u64) -> bool {
        self.sweep(now);
        self.agents.is_cooling_down(&target)
    }
}

impl Default for ClaimCoordinator {
    fn default() -> Self {
        Self::new(ClaimTimeouts::from(&CoordinationSettings::default()))
    }
}

//! The generic task executor: one seek-or-deposit step for one agent and
//! one job.
//!
//! An agent is either SEEKING (no payload) or DEPOSITING (carrying a
//! payload for this job), never both.
//!
//! SEEKING picks the nearest cached candidate (to the area origin) that
//! still validates, is not held by another agent, and is not cooling down.
//! With no claim the agent claims it; with a claim it walks to the claimed
//! position and interacts on arrival, taking the output as its payload. A
//! job that generates output may do so instead when it has nothing to
//! claim.
//!
//! DEPOSITING walks to the nearest untried storage destination and inserts
//! the payload. Destinations that leave a remainder (or turn out to have
//! no inventory) are marked tried for the rest of the carry cycle. With no
//! destination left the payload is held while the area's scan is still
//! running, then dropped at the agent's feet.
//!
//! No step ever fails: every branch ends in a [`TaskOutcome`].

use corral_types::{Aabb, AgentId, BlockPos, ItemStack, JobType, total_count};
use corral_world::{World, insert_stacks};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::area::Area;
use crate::context::CoordinationContext;
use crate::job::Job;

/// What a single executor step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Nothing to do this tick.
    Idle,
    /// The agent is committed to another job.
    Busy,
    /// A candidate was claimed.
    Claimed(BlockPos),
    /// The agent was sent toward a target or destination.
    Navigating(BlockPos),
    /// The agent acted on its target and picked up `items`.
    Interacted {
        /// The target acted on.
        position: BlockPos,
        /// Items picked up.
        items: u64,
    },
    /// The claimed target stopped validating and was released.
    Abandoned(BlockPos),
    /// An idle agent produced `items`.
    Generated {
        /// Items produced.
        items: u64,
    },
    /// No destination yet; the payload is kept while the scan runs.
    Holding,
    /// The whole payload went into `destination`.
    Deposited {
        /// Where the items went.
        destination: BlockPos,
        /// Items placed.
        items: u64,
    },
    /// `destination` did not take everything and is skipped from now on.
    DestinationRejected {
        /// The destination that fell short.
        destination: BlockPos,
        /// Items still carried.
        remaining: u64,
    },
    /// No destination exists; the payload was dropped into the world.
    Dropped {
        /// Items dropped.
        items: u64,
    },
}

impl TaskOutcome {
    /// Short `snake_case` name, used as a tally key.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Busy => "busy",
            Self::Claimed(_) => "claimed",
            Self::Navigating(_) => "navigating",
            Self::Interacted { .. } => "interacted",
            Self::Abandoned(_) => "abandoned",
            Self::Generated { .. } => "generated",
            Self::Holding => "holding",
            Self::Deposited { .. } => "deposited",
            Self::DestinationRejected { .. } => "destination_rejected",
            Self::Dropped { .. } => "dropped",
        }
    }
}

/// Run one executor step for `agent` doing `job` in `area`.
///
/// Agents that are not present in the world are left alone; their claims
/// run out by timeout.
pub fn run_task<W: World>(
    ctx: &mut CoordinationContext,
    world: &mut W,
    job: &mut dyn Job<W>,
    area: &Area,
    agent: AgentId,
) -> TaskOutcome {
    let job_type = job.job_type();
    let now = world.tick();

    if world.agent_box(agent).is_none() {
        return TaskOutcome::Idle;
    }
    if ctx.engaged_elsewhere(agent, job_type, now) {
        return TaskOutcome::Busy;
    }

    if ctx.carry.carrying_for(agent) == Some(job_type) {
        deposit(ctx, world, area, agent, job_type, now)
    } else {
        seek(ctx, world, job, area, agent, now)
    }
}

/// Whether the agent's body overlaps `target` grown by `radius`.
fn has_arrived<W: World>(world: &W, agent: AgentId, target: BlockPos, radius: f64) -> bool {
    world
        .agent_box(agent)
        .is_some_and(|body| body.intersects(&Aabb::of_block(target).expand(radius)))
}

// ---------------------------------------------------------------------------
// SEEKING
// ---------------------------------------------------------------------------

fn seek<W: World>(
    ctx: &mut CoordinationContext,
    world: &mut W,
    job: &mut dyn Job<W>,
    area: &Area,
    agent: AgentId,
    now: u64,
) -> TaskOutcome {
    let job_type = job.job_type();

    if let Some(position) = ctx.claims.target_of(agent, now) {
        return pursue(ctx, world, job, agent, position, now);
    }

    match nearest_candidate(ctx, &*world, &*job, area, agent, now) {
        Some(position) => match ctx.claims.claim(agent, position, now) {
            Ok(()) => {
                ctx.claim_owners.insert(agent, job_type);
                TaskOutcome::Claimed(position)
            }
            Err(err) => {
                warn!(now, %agent, ?job_type, %err, "candidate claim refused");
                TaskOutcome::Idle
            }
        },
        None if job.generates() => generate(ctx, world, job, agent, now),
        None => TaskOutcome::Idle,
    }
}

/// Nearest cached candidate that validates live, is not held by another
/// agent, and is not cooling down. Ties go to the first in cache order.
fn nearest_candidate<W: World>(
    ctx: &mut CoordinationContext,
    world: &W,
    job: &dyn Job<W>,
    area: &Area,
    agent: AgentId,
    now: u64,
) -> Option<BlockPos> {
    let origin = area.origin();
    let mut best: Option<(i64, BlockPos)> = None;
    for pos in ctx.cache.targets(area.id, job.job_type()) {
        if !job.is_target(world, pos) {
            continue;
        }
        if ctx.claims.holder_of(pos, now).is_some_and(|holder| holder != agent) {
            continue;
        }
        if ctx.claims.is_cooling_down(pos, now) {
            continue;
        }
        let distance = pos.squared_distance(&origin);
        if best.is_none_or(|(closest, _)| distance < closest) {
            best = Some((distance, pos));
        }
    }
    best.map(|(_, pos)| pos)
}

/// Work toward the agent's own claim.
fn pursue<W: World>(
    ctx: &mut CoordinationContext,
    world: &mut W,
    job: &mut dyn Job<W>,
    agent: AgentId,
    position: BlockPos,
    now: u64,
) -> TaskOutcome {
    let job_type = job.job_type();

    if !job.is_target(world, position) {
        ctx.claims.release(agent, now);
        ctx.claim_owners.remove(&agent);
        debug!(now, %agent, ?job_type, %position, "claimed target no longer valid");
        return TaskOutcome::Abandoned(position);
    }

    let radius = ctx.settings.job(job_type).interaction_radius;
    if !has_arrived(world, agent, position, radius) {
        world.navigate_to(agent, position);
        return TaskOutcome::Navigating(position);
    }

    let output = job.interact(world, position, agent);
    ctx.claims.release(agent, now);
    ctx.claim_owners.remove(&agent);
    let items = total_count(&output);
    ctx.carry.set_payload(agent, job_type, output);
    debug!(now, %agent, ?job_type, %position, items, "interacted");
    TaskOutcome::Interacted { position, items }
}

fn generate<W: World>(
    ctx: &mut CoordinationContext,
    world: &mut W,
    job: &mut dyn Job<W>,
    agent: AgentId,
    now: u64,
) -> TaskOutcome {
    let job_type = job.job_type();
    let cooldown = ctx.settings.job(job_type).generation_cooldown_ticks;
    let last = ctx.carry.last_generation(agent, job_type);
    if now.saturating_sub(last) < cooldown {
        return TaskOutcome::Idle;
    }

    let output = job.generate(world, agent);
    ctx.carry.record_generation(agent, job_type, now);
    let items = total_count(&output);
    ctx.carry.set_payload(agent, job_type, output);
    debug!(now, %agent, ?job_type, items, "generated");
    TaskOutcome::Generated { items }
}

// ---------------------------------------------------------------------------
// DEPOSITING
// ---------------------------------------------------------------------------

fn deposit<W: World>(
    ctx: &mut CoordinationContext,
    world: &mut W,
    area: &Area,
    agent: AgentId,
    job_type: JobType,
    now: u64,
) -> TaskOutcome {
    let Some(destination) = nearest_destination(ctx, &*world, area, agent) else {
        if ctx.scanner.is_scan_active(area.id) {
            return TaskOutcome::Holding;
        }
        return drop_payload(ctx, world, agent, now);
    };

    let radius = ctx.settings.deposit_radius_for(job_type);
    if !has_arrived(world, agent, destination, radius) {
        world.navigate_to(agent, destination);
        return TaskOutcome::Navigating(destination);
    }

    let offered: Vec<ItemStack> = ctx
        .carry
        .payload(agent)
        .map(<[ItemStack]>::to_vec)
        .unwrap_or_default();

    let Some(inventory) = world.inventory_at(destination) else {
        ctx.carry.mark_tried(agent, destination);
        debug!(now, %agent, %destination, "destination has no inventory");
        return TaskOutcome::DestinationRejected {
            destination,
            remaining: total_count(&offered),
        };
    };

    let remainder = insert_stacks(inventory, &offered);
    if remainder.is_empty() {
        ctx.carry.clear(agent);
        world.stop_navigation(agent);
        let items = total_count(&offered);
        debug!(now, %agent, ?job_type, %destination, items, "payload deposited");
        return TaskOutcome::Deposited { destination, items };
    }

    ctx.carry.mark_tried(agent, destination);
    let remaining = total_count(&remainder);
    ctx.carry.set_payload(agent, job_type, remainder);
    debug!(now, %agent, ?job_type, %destination, remaining, "destination full");
    TaskOutcome::DestinationRejected {
        destination,
        remaining,
    }
}

/// Nearest cached storage destination (to the area origin) that is still
/// an inventory block and was not tried this carry cycle.
fn nearest_destination<W: World>(
    ctx: &CoordinationContext,
    world: &W,
    area: &Area,
    agent: AgentId,
) -> Option<BlockPos> {
    let origin = area.origin();
    ctx.cache
        .targets(area.id, JobType::Storage)
        .filter(|pos| world.is_inventory_block(*pos) && !ctx.carry.was_tried(agent, *pos))
        .min_by_key(|pos| pos.squared_distance(&origin))
}

fn drop_payload<W: World>(
    ctx: &mut CoordinationContext,
    world: &mut W,
    agent: AgentId,
    now: u64,
) -> TaskOutcome {
    let Some(at) = world.agent_position(agent) else {
        return TaskOutcome::Holding;
    };
    let stacks: Vec<ItemStack> = ctx
        .carry
        .payload(agent)
        .map(<[ItemStack]>::to_vec)
        .unwrap_or_default();
    let items = total_count(&stacks);
    for stack in stacks {
        world.drop_stack(at, stack);
    }
    ctx.carry.clear(agent);
    info!(now, %agent, position = %at, items, "no destination, payload dropped");
    TaskOutcome::Dropped { items }
}

//! Example jobs for the demo world.
//!
//! The coordination core decides who goes where; these decide what counts
//! as a target and what happens to it on arrival.

use corral_core::Job;
use corral_types::{AgentId, BlockPos, Bounds, ItemStack, JobType};
use corral_world::GridWorld;
use tracing::debug;

/// Block kind of a berry bush.
pub const BERRY_BUSH: &str = "berry_bush";

/// Age at which a berry bush can be picked.
pub const RIPE_AGE: u8 = 3;

/// Block kind of an amethyst cluster.
pub const AMETHYST_CLUSTER: &str = "amethyst_cluster";

/// Block kind of water.
pub const WATER: &str = "water";

/// Picks ripe berry bushes. A picked bush starts growing again from age 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct BerryHarvester;

impl Job<GridWorld> for BerryHarvester {
    fn job_type(&self) -> JobType {
        JobType::BerryHarvester
    }

    fn is_target(&self, world: &GridWorld, pos: BlockPos) -> bool {
        world
            .block(pos)
            .is_some_and(|b| b.is(BERRY_BUSH) && b.age >= RIPE_AGE)
    }

    fn interact(&mut self, world: &mut GridWorld, pos: BlockPos, agent: AgentId) -> Vec<ItemStack> {
        if let Some(bush) = world.block_mut(pos) {
            bush.age = 0;
        }
        debug!(%agent, %pos, "bush picked");
        vec![ItemStack::new("sweet_berries", 3)]
    }
}

/// Breaks amethyst clusters. The cluster is gone afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrystalHarvester;

impl Job<GridWorld> for CrystalHarvester {
    fn job_type(&self) -> JobType {
        JobType::AmethystHarvester
    }

    fn is_target(&self, world: &GridWorld, pos: BlockPos) -> bool {
        world.block(pos).is_some_and(|b| b.is(AMETHYST_CLUSTER))
    }

    fn interact(&mut self, world: &mut GridWorld, pos: BlockPos, agent: AgentId) -> Vec<ItemStack> {
        world.remove_block(pos);
        debug!(%agent, %pos, "cluster broken");
        vec![ItemStack::new("amethyst_shard", 4)]
    }
}

/// Catches fish while idle, provided there is water within reach.
#[derive(Debug, Clone, Copy)]
pub struct FishingGenerator {
    /// How far from the agent water may be.
    pub reach: u32,
}

impl Default for FishingGenerator {
    fn default() -> Self {
        Self { reach: 3 }
    }
}

impl Job<GridWorld> for FishingGenerator {
    fn job_type(&self) -> JobType {
        JobType::FishingLootGenerator
    }

    fn should_run(&self, world: &GridWorld, agent: AgentId) -> bool {
        use corral_world::World as _;

        world.agent_position(agent).is_some_and(|pos| {
            Bounds::around(pos, self.reach, 1)
                .iter()
                .any(|p| world.block(p).is_some_and(|b| b.is(WATER)))
        })
    }

    fn is_target(&self, _world: &GridWorld, _pos: BlockPos) -> bool {
        false
    }

    fn interact(&mut self, _world: &mut GridWorld, _pos: BlockPos, _agent: AgentId) -> Vec<ItemStack> {
        Vec::new()
    }

    fn generates(&self) -> bool {
        true
    }

    fn generate(&mut self, _world: &mut GridWorld, agent: AgentId) -> Vec<ItemStack> {
        debug!(%agent, "fish caught");
        vec![ItemStack::new("cod", 1)]
    }
}

//! Demo world layout and growth.
//!
//! The layout is drawn from a seeded RNG so the same seed always yields the
//! same world.

use corral_types::{AgentId, BlockPos};
use corral_world::{BlockState, GridWorld};
use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;
use crate::jobs::{AMETHYST_CLUSTER, BERRY_BUSH, RIPE_AGE, WATER};

/// Attempts at finding a free spot before an object is skipped.
const PLACEMENT_ATTEMPTS: u32 = 64;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Demo world contents, loaded from the `demo` section of
/// `corral-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DemoConfig {
    /// Agents spawned at the area origin.
    #[serde(default = "default_agents")]
    pub agents: u32,

    /// Berry bushes scattered through the area.
    #[serde(default = "default_berry_bushes")]
    pub berry_bushes: u32,

    /// Amethyst clusters scattered through the area.
    #[serde(default = "default_amethyst_clusters")]
    pub amethyst_clusters: u32,

    /// Storage chests scattered through the area.
    #[serde(default = "default_chests")]
    pub chests: u32,

    /// Slots per chest.
    #[serde(default = "default_chest_slots")]
    pub chest_slots: usize,

    /// Per-tick chance that an unripe bush ages by one.
    #[serde(default = "default_growth_chance")]
    pub growth_chance: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            berry_bushes: default_berry_bushes(),
            amethyst_clusters: default_amethyst_clusters(),
            chests: default_chests(),
            chest_slots: default_chest_slots(),
            growth_chance: default_growth_chance(),
        }
    }
}

impl DemoConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.growth_chance) {
            return Err(EngineError::Demo {
                message: format!(
                    "growth_chance must be within 0.0..=1.0, got {}",
                    self.growth_chance
                ),
            });
        }
        Ok(())
    }
}

const fn default_agents() -> u32 {
    4
}

const fn default_berry_bushes() -> u32 {
    12
}

const fn default_amethyst_clusters() -> u32 {
    4
}

const fn default_chests() -> u32 {
    2
}

const fn default_chest_slots() -> usize {
    27
}

const fn default_growth_chance() -> f64 {
    0.02
}

// -----------------------------------------------------------------------
// Layout
// -----------------------------------------------------------------------

/// A freshly built demo world.
#[derive(Debug)]
pub struct DemoWorld {
    /// The world itself.
    pub world: GridWorld,
    /// Spawned agents, in spawn order.
    pub agents: Vec<AgentId>,
    /// Chest positions.
    pub chests: Vec<BlockPos>,
}

/// Build a world around `origin`: a small pond next to the origin, then
/// chests, bushes, and clusters at random free spots within `radius`
/// blocks horizontally, and the agents standing on the origin.
pub fn build_world(
    config: &DemoConfig,
    origin: BlockPos,
    radius: u32,
    rng: &mut StdRng,
) -> DemoWorld {
    let mut world = GridWorld::new();

    for (dx, dz) in [(-2, -2), (-2, -1), (-1, -2), (-1, -1)] {
        let pos = BlockPos::new(
            origin.x.saturating_add(dx),
            origin.y.saturating_sub(1),
            origin.z.saturating_add(dz),
        );
        world.set_block(pos, BlockState::new(WATER));
    }

    let mut chests = Vec::new();
    for _ in 0..config.chests {
        if let Some(pos) = free_spot(&world, origin, radius, rng) {
            world.place_inventory(pos, "chest", config.chest_slots);
            chests.push(pos);
        }
    }
    for _ in 0..config.berry_bushes {
        if let Some(pos) = free_spot(&world, origin, radius, rng) {
            let age = rng.random_range(0..=RIPE_AGE);
            world.set_block(pos, BlockState::new(BERRY_BUSH).with_age(age));
        }
    }
    for _ in 0..config.amethyst_clusters {
        if let Some(pos) = free_spot(&world, origin, radius, rng) {
            world.set_block(pos, BlockState::new(AMETHYST_CLUSTER));
        }
    }

    let agents = (0..config.agents)
        .map(|_| world.spawn_agent(origin))
        .collect::<Vec<_>>();

    info!(
        %origin,
        chests = chests.len(),
        bushes = world.positions_of(BERRY_BUSH).len(),
        clusters = world.positions_of(AMETHYST_CLUSTER).len(),
        agents = agents.len(),
        "demo world built"
    );

    DemoWorld {
        world,
        agents,
        chests,
    }
}

/// A random empty position on the origin's layer, excluding the origin.
fn free_spot(world: &GridWorld, origin: BlockPos, radius: u32, rng: &mut StdRng) -> Option<BlockPos> {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    for _ in 0..PLACEMENT_ATTEMPTS {
        let pos = BlockPos::new(
            origin.x.saturating_add(rng.random_range(-r..=r)),
            origin.y,
            origin.z.saturating_add(rng.random_range(-r..=r)),
        );
        if pos != origin && world.block(pos).is_none() {
            return Some(pos);
        }
    }
    None
}

/// Age every unripe bush by one with probability `chance`. Returns how many
/// bushes grew.
pub fn grow_bushes(world: &mut GridWorld, rng: &mut StdRng, chance: f64) -> usize {
    if !(0.0..=1.0).contains(&chance) {
        return 0;
    }
    let mut grown: usize = 0;
    for pos in world.positions_of(BERRY_BUSH) {
        let Some(bush) = world.block_mut(pos) else {
            continue;
        };
        if bush.age < RIPE_AGE && rng.random_bool(chance) {
            bush.age = bush.age.saturating_add(1);
            grown = grown.saturating_add(1);
        }
    }
    grown
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corral_types::Bounds;
    use rand::SeedableRng;

    use super::*;

    fn origin() -> BlockPos {
        BlockPos::new(0, 64, 0)
    }

    #[test]
    fn layout_fits_the_area() {
        let mut rng = StdRng::seed_from_u64(7);
        let demo = build_world(&DemoConfig::default(), origin(), 8, &mut rng);
        let bounds = Bounds::around(origin(), 8, 1);

        assert_eq!(demo.agents.len(), 4);
        assert_eq!(demo.chests.len(), 2);
        assert!(demo.chests.iter().all(|p| bounds.contains(p)));
        assert!(demo.chests.iter().all(|p| demo.world.inventory(*p).is_some()));
        assert_eq!(demo.world.positions_of(BERRY_BUSH).len(), 12);
        assert_eq!(demo.world.positions_of(AMETHYST_CLUSTER).len(), 4);
        assert!(demo.world.block(origin()).is_none());
    }

    #[test]
    fn same_seed_same_layout() {
        let config = DemoConfig::default();
        let first = build_world(&config, origin(), 8, &mut StdRng::seed_from_u64(3));
        let second = build_world(&config, origin(), 8, &mut StdRng::seed_from_u64(3));
        assert_eq!(first.chests, second.chests);
        assert_eq!(
            first.world.positions_of(BERRY_BUSH),
            second.world.positions_of(BERRY_BUSH)
        );
    }

    #[test]
    fn bushes_stop_growing_when_ripe() {
        let mut world = GridWorld::new();
        let pos = BlockPos::new(1, 64, 1);
        world.set_block(pos, BlockState::new(BERRY_BUSH));
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..10 {
            grow_bushes(&mut world, &mut rng, 1.0);
        }
        assert_eq!(world.block(pos).map(|b| b.age), Some(RIPE_AGE));
        assert_eq!(grow_bushes(&mut world, &mut rng, 1.0), 0);
    }

    #[test]
    fn out_of_range_chance_is_rejected() {
        let config = DemoConfig {
            growth_chance: 1.5,
            ..DemoConfig::default()
        };
        assert!(config.validate().is_err());

        let mut world = GridWorld::new();
        world.set_block(BlockPos::new(0, 0, 0), BlockState::new(BERRY_BUSH));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(grow_bushes(&mut world, &mut rng, f64::NAN), 0);
    }
}

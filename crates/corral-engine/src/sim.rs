//! The demo simulation: one world, one dispatcher, and the growth that
//! keeps the jobs busy.

use corral_core::{CoordinationSettings, CorralConfig, Dispatcher, TickSummary};
use corral_types::{AgentId, AreaId, BlockPos};
use corral_world::GridWorld;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;

use crate::demo::{self, DemoConfig};
use crate::error::EngineError;
use crate::jobs::{BerryHarvester, CrystalHarvester, FishingGenerator};

/// Anchor block of the demo area.
pub const AREA_ORIGIN: BlockPos = BlockPos::new(0, 64, 0);

/// Running totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    /// Ticks executed.
    pub ticks: u64,
    /// Items picked up or generated.
    pub collected: u64,
    /// Items placed into chests.
    pub deposited: u64,
    /// Items dropped on the ground.
    pub dropped: u64,
}

impl RunTotals {
    /// Fold one tick into the totals.
    pub const fn record(&mut self, summary: &TickSummary) {
        self.ticks = self.ticks.saturating_add(1);
        self.collected = self.collected.saturating_add(summary.items_collected);
        self.deposited = self.deposited.saturating_add(summary.items_deposited);
        self.dropped = self.dropped.saturating_add(summary.items_dropped);
    }
}

/// World, dispatcher, and RNG of one demo run.
#[derive(Debug)]
pub struct Simulation {
    world: GridWorld,
    dispatcher: Dispatcher<GridWorld>,
    rng: StdRng,
    area: AreaId,
    agents: Vec<AgentId>,
    chests: Vec<BlockPos>,
    growth_chance: f64,
    totals: RunTotals,
}

impl Simulation {
    /// Build the demo world and register the example jobs.
    pub fn new(config: &CorralConfig, demo_config: &DemoConfig) -> Result<Self, EngineError> {
        demo_config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.simulation.seed);

        let mut dispatcher = Dispatcher::new(CoordinationSettings::from(config));
        dispatcher.register_job(BerryHarvester)?;
        dispatcher.register_job(CrystalHarvester)?;
        dispatcher.register_job(FishingGenerator::default())?;
        let area = dispatcher.register_area_at(AREA_ORIGIN)?;

        let built = demo::build_world(demo_config, AREA_ORIGIN, config.area.search_radius, &mut rng);
        for agent in &built.agents {
            dispatcher.assign_agent(*agent, area)?;
        }

        info!(
            seed = config.simulation.seed,
            %area,
            jobs = ?dispatcher.job_types(),
            "simulation ready"
        );

        Ok(Self {
            world: built.world,
            dispatcher,
            rng,
            area,
            agents: built.agents,
            chests: built.chests,
            growth_chance: demo_config.growth_chance,
            totals: RunTotals::default(),
        })
    }

    /// Run one tick: coordinate, grow, advance the clock.
    pub fn step(&mut self) -> Result<TickSummary, EngineError> {
        let summary = self.dispatcher.tick(&mut self.world);
        demo::grow_bushes(&mut self.world, &mut self.rng, self.growth_chance);
        self.world.advance()?;
        self.totals.record(&summary);
        Ok(summary)
    }

    /// Totals so far.
    pub const fn totals(&self) -> RunTotals {
        self.totals
    }

    /// The demo area.
    pub const fn area(&self) -> AreaId {
        self.area
    }

    /// Items currently stored in the demo chests.
    pub fn stored_items(&self) -> u64 {
        self.chests
            .iter()
            .filter_map(|pos| self.world.inventory(*pos))
            .map(corral_world::SlotInventory::item_count)
            .sum()
    }

    /// Items currently carried by the agents.
    pub fn carried_items(&self) -> u64 {
        let carry = self.dispatcher.context().carry();
        self.agents.iter().map(|a| carry.carried_count(*a)).sum()
    }

    /// Items lying on the ground.
    pub fn dropped_items(&self) -> u64 {
        self.world
            .dropped()
            .iter()
            .map(|d| u64::from(d.stack.count))
            .sum()
    }
}

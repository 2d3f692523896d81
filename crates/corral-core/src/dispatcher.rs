//! The dispatcher: the single per-tick entry point.
//!
//! Each [`Dispatcher::tick`] first advances the deferred scan of every
//! registered area by one batch, then runs one executor step for every
//! (agent, job) pair: agents in assignment order within each area, jobs in
//! registration order. Jobs that are disabled, that list worker tags the
//! agent lacks, or whose own eligibility check fails are skipped for that
//! agent, unless the agent carries that job's payload: delivery never waits
//! on eligibility.

use std::collections::BTreeMap;

use corral_types::{AgentId, AreaId, BlockPos, JobType};
use corral_world::World;
use serde::Serialize;
use tracing::{debug, info};

use crate::area::Area;
use crate::config::CoordinationSettings;
use crate::context::CoordinationContext;
use crate::error::DispatchError;
use crate::executor::{TaskOutcome, run_task};
use crate::job::{Job, JobRegistry};

/// What happened during one dispatcher tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// The world tick this summary covers.
    pub tick: u64,
    /// Positions evaluated by the scanner across all areas.
    pub positions_scanned: usize,
    /// Executor steps run.
    pub steps: u32,
    /// Executor outcomes by [`TaskOutcome::kind`].
    pub outcomes: BTreeMap<&'static str, u32>,
    /// Items picked up by interactions and generation.
    pub items_collected: u64,
    /// Items placed into destinations.
    pub items_deposited: u64,
    /// Items dropped for lack of a destination.
    pub items_dropped: u64,
}

impl TickSummary {
    /// An empty summary for `tick`.
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Tally one executor outcome.
    pub fn record(&mut self, outcome: &TaskOutcome) {
        self.steps = self.steps.saturating_add(1);
        let count = self.outcomes.entry(outcome.kind()).or_insert(0);
        *count = count.saturating_add(1);
        match *outcome {
            TaskOutcome::Interacted { items, .. } | TaskOutcome::Generated { items } => {
                self.items_collected = self.items_collected.saturating_add(items);
            }
            TaskOutcome::Deposited { items, .. } => {
                self.items_deposited = self.items_deposited.saturating_add(items);
            }
            TaskOutcome::Dropped { items } => {
                self.items_dropped = self.items_dropped.saturating_add(items);
            }
            _ => {}
        }
    }

    /// How many steps ended in an outcome of `kind`.
    pub fn count(&self, kind: &str) -> u32 {
        self.outcomes.get(kind).copied().unwrap_or(0)
    }
}

/// Owns the jobs, areas, agent assignments, and coordination state of one
/// simulation.
pub struct Dispatcher<W: World> {
    context: CoordinationContext,
    jobs: JobRegistry<W>,
    areas: BTreeMap<AreaId, Area>,
    assignments: BTreeMap<AreaId, Vec<AgentId>>,
    agent_areas: BTreeMap<AgentId, AreaId>,
}

impl<W: World> core::fmt::Debug for Dispatcher<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("jobs", &self.jobs)
            .field("areas", &self.areas.keys().collect::<Vec<_>>())
            .field("agents", &self.agent_areas.len())
            .finish_non_exhaustive()
    }
}

impl<W: World> Dispatcher<W> {
    /// An empty dispatcher running on `settings`.
    pub fn new(settings: CoordinationSettings) -> Self {
        Self {
            context: CoordinationContext::new(settings),
            jobs: JobRegistry::new(),
            areas: BTreeMap::new(),
            assignments: BTreeMap::new(),
            agent_areas: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------

    /// Register a job. Jobs run in registration order.
    ///
    /// # Errors
    ///
    /// See [`JobRegistry::register`].
    pub fn register_job(&mut self, job: impl Job<W> + 'static) -> Result<(), DispatchError> {
        let job_type = job.job_type();
        self.jobs.register(Box::new(job))?;
        info!(?job_type, "job registered");
        Ok(())
    }

    /// Register an area.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateArea`] if an area with the same
    /// origin exists.
    pub fn register_area(&mut self, area: Area) -> Result<AreaId, DispatchError> {
        if self.areas.contains_key(&area.id) {
            return Err(DispatchError::DuplicateArea(area.id));
        }
        self.areas.insert(area.id, area);
        self.assignments.insert(area.id, Vec::new());
        info!(area = %area.id, radius = area.radius, height = area.height, "area registered");
        Ok(area.id)
    }

    /// Register an area at `origin` with the configured default volume.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateArea`] if an area with the same
    /// origin exists.
    pub fn register_area_at(&mut self, origin: BlockPos) -> Result<AreaId, DispatchError> {
        let area = self.context.settings().area_at(origin);
        self.register_area(area)
    }

    /// Remove an area: its cache, its scan, and its assignments. Returns
    /// the agents that were working there.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownArea`] if the area is not registered.
    pub fn remove_area(&mut self, area: AreaId) -> Result<Vec<AgentId>, DispatchError> {
        self.areas
            .remove(&area)
            .ok_or(DispatchError::UnknownArea(area))?;
        let agents = self.assignments.remove(&area).unwrap_or_default();
        for agent in &agents {
            self.agent_areas.remove(agent);
        }
        self.context.remove_area(area);
        info!(%area, agents = agents.len(), "area removed");
        Ok(agents)
    }

    /// Put an agent to work in an area.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownArea`] if the area is not
    /// registered, or [`DispatchError::AgentAlreadyAssigned`] if the agent
    /// already works somewhere.
    pub fn assign_agent(&mut self, agent: AgentId, area: AreaId) -> Result<(), DispatchError> {
        if let Some(current) = self.agent_areas.get(&agent) {
            return Err(DispatchError::AgentAlreadyAssigned {
                agent,
                area: *current,
            });
        }
        let agents = self
            .assignments
            .get_mut(&area)
            .ok_or(DispatchError::UnknownArea(area))?;
        agents.push(agent);
        self.agent_areas.insert(agent, area);
        debug!(%agent, %area, "agent assigned");
        Ok(())
    }

    /// Stop dispatching an agent. Its claims are left to time out and its
    /// payload is kept in case it is assigned again.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownAgent`] if the agent is not assigned.
    pub fn remove_agent(&mut self, agent: AgentId) -> Result<AreaId, DispatchError> {
        let area = self
            .agent_areas
            .remove(&agent)
            .ok_or(DispatchError::UnknownAgent(agent))?;
        if let Some(agents) = self.assignments.get_mut(&area) {
            agents.retain(|a| *a != agent);
        }
        debug!(%agent, %area, "agent unassigned");
        Ok(area)
    }

    /// Replace the settings snapshot. Takes effect from the next tick.
    pub fn reconfigure(&mut self, settings: CoordinationSettings) {
        self.context.apply_settings(settings);
        info!("coordination settings replaced");
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The coordination state.
    pub const fn context(&self) -> &CoordinationContext {
        &self.context
    }

    /// Mutable coordination state.
    pub const fn context_mut(&mut self) -> &mut CoordinationContext {
        &mut self.context
    }

    /// Registered job types, in registration order.
    pub fn job_types(&self) -> Vec<JobType> {
        self.jobs.job_types()
    }

    /// The area an agent works in.
    pub fn area_of(&self, agent: AgentId) -> Option<AreaId> {
        self.agent_areas.get(&agent).copied()
    }

    /// A registered area.
    pub fn area(&self, area: AreaId) -> Option<&Area> {
        self.areas.get(&area)
    }

    /// Agents working in `area`, in assignment order.
    pub fn agents_in(&self, area: AreaId) -> &[AgentId] {
        self.assignments.get(&area).map_or(&[], Vec::as_slice)
    }

    // -----------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------

    /// Run one coordination tick against `world`.
    pub fn tick(&mut self, world: &mut W) -> TickSummary {
        let now = world.tick();
        let mut summary = TickSummary::new(now);

        for area in self.areas.values() {
            let scanned = self.context.scan_area(area, &*world, &self.jobs);
            summary.positions_scanned = summary.positions_scanned.saturating_add(scanned);
        }

        for (area_id, agents) in &self.assignments {
            let Some(area) = self.areas.get(area_id) else {
                continue;
            };
            for agent in agents {
                for job in self.jobs.iter_mut() {
                    let job_type = job.job_type();
                    // A payload is always delivered, even for a job that
                    // was disabled or became ineligible mid-carry.
                    let delivering = self.context.carry.carrying_for(*agent) == Some(job_type);
                    let config = self.context.settings.job(job_type);
                    if !delivering
                        && (!config.enabled
                            || !config.admits(&*world, *agent)
                            || !job.should_run(&*world, *agent))
                    {
                        continue;
                    }
                    let outcome = run_task(&mut self.context, world, job.as_mut(), area, *agent);
                    summary.record(&outcome);
                }
            }
        }
        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corral_types::ItemStack;
    use corral_world::{BlockState, GridWorld};

    use super::*;
    use crate::config::JobConfig;

    struct Mints;

    impl Job<GridWorld> for Mints {
        fn job_type(&self) -> JobType {
            JobType::MintHarvester
        }

        fn is_target(&self, world: &GridWorld, pos: BlockPos) -> bool {
            world.block(pos).is_some_and(|b| b.is("mint"))
        }

        fn interact(&mut self, world: &mut GridWorld, pos: BlockPos, _: AgentId) -> Vec<ItemStack> {
            world.remove_block(pos);
            vec![ItemStack::new("mint_leaf", 2)]
        }
    }

    /// Fishes whenever water lies under the area origin.
    struct Fish;

    const POND: BlockPos = BlockPos::new(0, -1, 0);

    impl Job<GridWorld> for Fish {
        fn job_type(&self) -> JobType {
            JobType::FishingLootGenerator
        }

        fn should_run(&self, world: &GridWorld, _: AgentId) -> bool {
            world.block(POND).is_some_and(|b| b.is("water"))
        }

        fn is_target(&self, _: &GridWorld, _: BlockPos) -> bool {
            false
        }

        fn interact(&mut self, _: &mut GridWorld, _: BlockPos, _: AgentId) -> Vec<ItemStack> {
            Vec::new()
        }

        fn generates(&self) -> bool {
            true
        }

        fn generate(&mut self, _: &mut GridWorld, _: AgentId) -> Vec<ItemStack> {
            vec![ItemStack::new("cod", 1)]
        }
    }

    fn small_settings() -> CoordinationSettings {
        CoordinationSettings {
            search_radius: 2,
            search_height: 1,
            ..CoordinationSettings::default()
        }
    }

    fn fishing(enabled: bool) -> CoordinationSettings {
        let mut settings = small_settings();
        settings.jobs.insert(
            JobType::FishingLootGenerator,
            JobConfig {
                enabled,
                generation_cooldown_ticks: 0,
                ..JobConfig::default()
            },
        );
        settings
    }

    /// One agent at the origin that has just caught a fish at tick 0,
    /// with a mint waiting and no storage anywhere.
    fn agent_with_catch() -> (Dispatcher<GridWorld>, GridWorld, AgentId) {
        let mut dispatcher = Dispatcher::<GridWorld>::new(fishing(true));
        dispatcher.register_job(Mints).unwrap();
        dispatcher.register_job(Fish).unwrap();
        let mut world = GridWorld::new();
        world.set_block(POND, BlockState::new("water"));
        let area = dispatcher.register_area_at(BlockPos::new(0, 0, 0)).unwrap();
        let agent = world.spawn_agent(BlockPos::new(0, 0, 0));
        dispatcher.assign_agent(agent, area).unwrap();

        let summary = dispatcher.tick(&mut world);
        assert_eq!(summary.count("generated"), 1);
        assert_eq!(
            dispatcher.context().carry().carrying_for(agent),
            Some(JobType::FishingLootGenerator)
        );
        world.set_block(BlockPos::new(1, 0, 0), BlockState::new("mint"));
        world.advance().unwrap();
        (dispatcher, world, agent)
    }

    /// Run ticks 1 to 7 and add up the summaries.
    fn run_seven(dispatcher: &mut Dispatcher<GridWorld>, world: &mut GridWorld) -> TickSummary {
        let mut total = TickSummary::new(0);
        for _ in 1..=7 {
            let summary = dispatcher.tick(world);
            for (kind, count) in summary.outcomes {
                let entry = total.outcomes.entry(kind).or_insert(0);
                *entry = entry.saturating_add(count);
            }
            total.items_dropped = total.items_dropped.saturating_add(summary.items_dropped);
            world.advance().unwrap();
        }
        total
    }

    fn assert_delivered_then_free(
        dispatcher: &Dispatcher<GridWorld>,
        world: &GridWorld,
        agent: AgentId,
        total: &TickSummary,
    ) {
        // Held while the first scan runs (ticks 1 to 3), dropped when it
        // finishes at tick 4. The second scan reaches the mint (index 38)
        // on its third batch, at tick 7.
        assert_eq!(total.count("busy"), 4);
        assert_eq!(total.count("holding"), 3);
        assert_eq!(total.count("dropped"), 1);
        assert_eq!(total.items_dropped, 1);
        assert_eq!(total.count("generated"), 0);
        assert_eq!(world.dropped().len(), 1);
        assert!(dispatcher.context().carry().payload(agent).is_none());
        assert_eq!(total.count("claimed"), 1);
        assert_eq!(
            dispatcher.context().claim_owner(agent),
            Some(JobType::MintHarvester)
        );
    }

    #[test]
    fn disabled_job_still_delivers_its_payload() {
        let (mut dispatcher, mut world, agent) = agent_with_catch();
        dispatcher.reconfigure(fishing(false));

        let total = run_seven(&mut dispatcher, &mut world);
        assert_delivered_then_free(&dispatcher, &world, agent, &total);
    }

    #[test]
    fn ineligible_job_still_delivers_its_payload() {
        let (mut dispatcher, mut world, agent) = agent_with_catch();
        world.remove_block(POND);

        let total = run_seven(&mut dispatcher, &mut world);
        assert_delivered_then_free(&dispatcher, &world, agent, &total);
    }

    #[test]
    fn area_and_agent_registration() {
        let mut dispatcher = Dispatcher::<GridWorld>::new(small_settings());
        let area = dispatcher.register_area_at(BlockPos::new(0, 0, 0)).unwrap();
        assert!(matches!(
            dispatcher.register_area_at(BlockPos::new(0, 0, 0)),
            Err(DispatchError::DuplicateArea(_))
        ));

        let agent = AgentId::new();
        dispatcher.assign_agent(agent, area).unwrap();
        assert!(matches!(
            dispatcher.assign_agent(agent, area),
            Err(DispatchError::AgentAlreadyAssigned { .. })
        ));
        assert_eq!(dispatcher.area_of(agent), Some(area));
        assert_eq!(dispatcher.agents_in(area), &[agent]);

        assert_eq!(dispatcher.remove_agent(agent).unwrap(), area);
        assert!(dispatcher.agents_in(area).is_empty());
        assert!(matches!(
            dispatcher.remove_agent(agent),
            Err(DispatchError::UnknownAgent(_))
        ));
    }

    #[test]
    fn assign_to_unknown_area_fails() {
        let mut dispatcher = Dispatcher::<GridWorld>::new(small_settings());
        let result = dispatcher.assign_agent(AgentId::new(), AreaId(BlockPos::new(9, 9, 9)));
        assert!(matches!(result, Err(DispatchError::UnknownArea(_))));
    }

    #[test]
    fn remove_area_clears_everything() {
        let mut dispatcher = Dispatcher::<GridWorld>::new(small_settings());
        let mut world = GridWorld::new();
        let area = dispatcher.register_area_at(BlockPos::new(0, 0, 0)).unwrap();
        let agent = world.spawn_agent(BlockPos::new(0, 0, 0));
        dispatcher.assign_agent(agent, area).unwrap();
        dispatcher.tick(&mut world);
        assert!(dispatcher.context().scanner().is_scan_active(area));

        assert_eq!(dispatcher.remove_area(area).unwrap(), vec![agent]);
        assert!(!dispatcher.context().scanner().is_scan_active(area));
        assert!(!dispatcher.context().cache().has_area(area));
        assert_eq!(dispatcher.area_of(agent), None);
        assert!(matches!(
            dispatcher.remove_area(area),
            Err(DispatchError::UnknownArea(_))
        ));
    }

    #[test]
    fn tick_scans_then_harvests() {
        let mut dispatcher = Dispatcher::<GridWorld>::new(small_settings());
        dispatcher.register_job(Mints).unwrap();
        let mut world = GridWorld::new();
        let area = dispatcher.register_area_at(BlockPos::new(0, 0, 0)).unwrap();
        let mint = BlockPos::new(1, 0, 0);
        world.set_block(mint, BlockState::new("mint"));
        let agent = world.spawn_agent(BlockPos::new(2, 0, 0));
        dispatcher.assign_agent(agent, area).unwrap();

        // 75 cells at 15 per tick: the mint is found during the third batch.
        let mut claimed_at = None;
        for _ in 0..5 {
            let summary = dispatcher.tick(&mut world);
            assert_eq!(summary.positions_scanned, 15);
            if summary.count("claimed") == 1 {
                claimed_at = Some(summary.tick);
                break;
            }
            world.advance().unwrap();
        }
        assert_eq!(claimed_at, Some(2));

        world.advance().unwrap();
        let summary = dispatcher.tick(&mut world);
        assert_eq!(summary.count("interacted"), 1);
        assert_eq!(summary.items_collected, 2);
        assert!(world.block(mint).is_none());
    }

    #[test]
    fn disabled_jobs_are_skipped() {
        let mut settings = small_settings();
        settings.jobs.insert(
            JobType::MintHarvester,
            JobConfig {
                enabled: false,
                ..JobConfig::default()
            },
        );
        let mut dispatcher = Dispatcher::<GridWorld>::new(settings);
        dispatcher.register_job(Mints).unwrap();
        let mut world = GridWorld::new();
        let area = dispatcher.register_area_at(BlockPos::new(0, 0, 0)).unwrap();
        let agent = world.spawn_agent(BlockPos::new(0, 0, 0));
        dispatcher.assign_agent(agent, area).unwrap();

        let summary = dispatcher.tick(&mut world);
        assert_eq!(summary.steps, 0);

        dispatcher.reconfigure(small_settings());
        let summary = dispatcher.tick(&mut world);
        assert_eq!(summary.steps, 1);
    }

    #[test]
    fn workers_list_limits_who_runs_a_job() {
        let mut settings = small_settings();
        settings.jobs.insert(
            JobType::MintHarvester,
            JobConfig {
                workers: vec!["grass".to_owned()],
                ..JobConfig::default()
            },
        );
        let mut dispatcher = Dispatcher::<GridWorld>::new(settings);
        dispatcher.register_job(Mints).unwrap();
        let mut world = GridWorld::new();
        let area = dispatcher.register_area_at(BlockPos::new(0, 0, 0)).unwrap();
        let plain = world.spawn_agent(BlockPos::new(0, 0, 0));
        let grassy = world.spawn_agent(BlockPos::new(0, 0, 0));
        world.tag_agent(grassy, "grass").unwrap();
        dispatcher.assign_agent(plain, area).unwrap();
        dispatcher.assign_agent(grassy, area).unwrap();

        let summary = dispatcher.tick(&mut world);
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.count("idle"), 1);
    }

    #[test]
    fn summary_tallies_items() {
        let mut summary = TickSummary::new(3);
        summary.record(&TaskOutcome::Generated { items: 2 });
        summary.record(&TaskOutcome::Dropped { items: 5 });
        summary.record(&TaskOutcome::Idle);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.items_collected, 2);
        assert_eq!(summary.items_dropped, 5);
        assert_eq!(summary.count("idle"), 1);
        assert_eq!(summary.count("deposited"), 0);
    }
}

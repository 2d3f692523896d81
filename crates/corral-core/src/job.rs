//! Job descriptors and the job registry.
//!
//! A [`Job`] supplies the resource semantics the coordination core does not
//! know about: which positions are targets, what happens on arrival, and
//! (optionally) what an idle agent produces. Everything else, from
//! claiming to depositing, is handled generically by the executor.

use corral_types::{AgentId, BlockPos, ItemStack, JobType};
use corral_world::World;

use crate::error::DispatchError;
use crate::scanner::ValidatorSet;

/// One kind of task, written against a concrete world type.
pub trait Job<W: World> {
    /// Stable identifier of this job.
    fn job_type(&self) -> JobType;

    /// Cheap eligibility check evaluated before the executor runs at all.
    fn should_run(&self, _world: &W, _agent: AgentId) -> bool {
        true
    }

    /// Whether `pos` is currently a valid target. Used both by the scanner
    /// and to re-validate cached candidates against the live world.
    fn is_target(&self, world: &W, pos: BlockPos) -> bool;

    /// Act on `pos` after the agent arrived. Returns the items the agent
    /// picks up, if any.
    fn interact(&mut self, world: &mut W, pos: BlockPos, agent: AgentId) -> Vec<ItemStack>;

    /// Whether this job produces output while it has no target.
    fn generates(&self) -> bool {
        false
    }

    /// Produce output for an idle agent. Only called when
    /// [`Job::generates`] is true and the generation cooldown has passed.
    fn generate(&mut self, _world: &mut W, _agent: AgentId) -> Vec<ItemStack> {
        Vec::new()
    }
}

/// Registered jobs, in registration order.
pub struct JobRegistry<W: World> {
    jobs: Vec<Box<dyn Job<W>>>,
}

impl<W: World> core::fmt::Debug for JobRegistry<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.jobs.iter().map(|job| job.job_type()))
            .finish()
    }
}

impl<W: World> Default for JobRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: World> JobRegistry<W> {
    /// An empty registry.
    pub const fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Add a job.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ReservedJobType`] for [`JobType::Storage`],
    /// which the core scans on its own, or [`DispatchError::DuplicateJob`]
    /// if a job of the same type is already registered.
    pub fn register(&mut self, job: Box<dyn Job<W>>) -> Result<(), DispatchError> {
        let job_type = job.job_type();
        if job_type == JobType::Storage {
            return Err(DispatchError::ReservedJobType(job_type));
        }
        if self.contains(job_type) {
            return Err(DispatchError::DuplicateJob(job_type));
        }
        self.jobs.push(job);
        Ok(())
    }

    /// Whether a job of this type is registered.
    pub fn contains(&self, job_type: JobType) -> bool {
        self.jobs.iter().any(|job| job.job_type() == job_type)
    }

    /// Registered job types, in registration order.
    pub fn job_types(&self) -> Vec<JobType> {
        self.jobs.iter().map(|job| job.job_type()).collect()
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Mutable iteration in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Job<W>>> {
        self.jobs.iter_mut()
    }
}

/// The scanner evaluates every registered job plus storage destinations.
impl<W: World> ValidatorSet<W> for JobRegistry<W> {
    fn for_each_match(&self, world: &W, pos: BlockPos, on_match: &mut dyn FnMut(JobType)) {
        if world.is_inventory_block(pos) {
            on_match(JobType::Storage);
        }
        for job in &self.jobs {
            if job.is_target(world, pos) {
                on_match(job.job_type());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corral_world::{BlockState, GridWorld};

    use super::*;

    struct Picker(JobType, &'static str);

    impl Job<GridWorld> for Picker {
        fn job_type(&self) -> JobType {
            self.0
        }

        fn is_target(&self, world: &GridWorld, pos: BlockPos) -> bool {
            world.block(pos).is_some_and(|b| b.is(self.1))
        }

        fn interact(&mut self, _: &mut GridWorld, _: BlockPos, _: AgentId) -> Vec<ItemStack> {
            vec![ItemStack::new(self.1, 1)]
        }
    }

    #[test]
    fn register_rejects_duplicates_and_storage() {
        let mut registry = JobRegistry::<GridWorld>::new();
        registry
            .register(Box::new(Picker(JobType::MintHarvester, "mint")))
            .unwrap();
        assert!(matches!(
            registry.register(Box::new(Picker(JobType::MintHarvester, "mint"))),
            Err(DispatchError::DuplicateJob(JobType::MintHarvester))
        ));
        assert!(matches!(
            registry.register(Box::new(Picker(JobType::Storage, "chest"))),
            Err(DispatchError::ReservedJobType(JobType::Storage))
        ));
        assert_eq!(registry.job_types(), vec![JobType::MintHarvester]);
    }

    #[test]
    fn validators_include_storage() {
        let mut registry = JobRegistry::<GridWorld>::new();
        registry
            .register(Box::new(Picker(JobType::HoneyCollector, "beehive")))
            .unwrap();

        let mut world = GridWorld::new();
        let hive = BlockPos::new(1, 0, 0);
        let chest = BlockPos::new(2, 0, 0);
        world.set_block(hive, BlockState::new("beehive"));
        world.place_inventory(chest, "chest", 9);

        let mut matches = Vec::new();
        for pos in [hive, chest, BlockPos::new(3, 0, 0)] {
            registry.for_each_match(&world, pos, &mut |job| matches.push((pos, job)));
        }
        assert_eq!(
            matches,
            vec![(hive, JobType::HoneyCollector), (chest, JobType::Storage)]
        );
    }

    #[test]
    fn default_hooks() {
        let mut job = Picker(JobType::CropHarvester, "wheat");
        let mut world = GridWorld::new();
        let agent = world.spawn_agent(BlockPos::new(0, 0, 0));
        assert!(job.should_run(&world, agent));
        assert!(!job.generates());
        assert!(job.generate(&mut world, agent).is_empty());
    }
}

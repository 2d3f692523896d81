//! Error types for dispatcher setup.
//!
//! Only registration and assignment can fail. The per-tick paths report
//! recoverable conditions as [`TaskOutcome`]s instead.
//!
//! [`TaskOutcome`]: crate::executor::TaskOutcome

use corral_types::{AgentId, AreaId, JobType};

/// Errors returned by [`Dispatcher`](crate::dispatcher::Dispatcher) and
/// [`JobRegistry`](crate::job::JobRegistry) setup operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// A job of this type is already registered.
    #[error("job {0} is already registered")]
    DuplicateJob(JobType),

    /// This job type is handled by the core and cannot be registered.
    #[error("job type {0} is reserved")]
    ReservedJobType(JobType),

    /// An area with this origin is already registered.
    #[error("{0} is already registered")]
    DuplicateArea(AreaId),

    /// No area with this origin is registered.
    #[error("{0} is not registered")]
    UnknownArea(AreaId),

    /// The agent is not assigned to any area.
    #[error("agent {0} is not assigned to an area")]
    UnknownAgent(AgentId),

    /// The agent already works in an area.
    #[error("agent {agent} is already assigned to {area}")]
    AgentAlreadyAssigned {
        /// The agent.
        agent: AgentId,
        /// Its current area.
        area: AreaId,
    },
}

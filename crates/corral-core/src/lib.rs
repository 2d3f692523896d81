//! Coordination core of the Corral engine.
//!
//! Agents working in an area share one view of which positions are worth
//! visiting (built by an amortized scanner), one table of who is going
//! where (claims with timeouts and cooldowns), and one place to put what
//! they collect (storage destinations found by the same scan). A
//! [`Dispatcher`] ties these together and drives every agent once per
//! tick.
//!
//! # Modules
//!
//! - [`area`] -- [`Area`], a search volume anchored at an origin block.
//! - [`cache`] -- [`TargetCache`], candidate positions per area and job.
//! - [`carry`] -- Per-agent payloads, tried destinations, and generation
//!   timestamps.
//! - [`claims`] -- [`ClaimCoordinator`], exclusive position and agent
//!   claims.
//! - [`config`] -- Configuration loading from `corral-config.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`CoordinationContext`], all mutable coordination
//!   state of one simulation.
//! - [`dispatcher`] -- The per-tick entry point.
//! - [`error`] -- Error types for dispatcher setup.
//! - [`executor`] -- The seek-or-deposit step run for each agent and job.
//! - [`job`] -- The [`Job`] trait and its registry.
//! - [`scanner`] -- [`DeferredScanner`], budgeted area scans.
//!
//! [`Area`]: area::Area
//! [`ClaimCoordinator`]: claims::ClaimCoordinator
//! [`CoordinationContext`]: context::CoordinationContext
//! [`DeferredScanner`]: scanner::DeferredScanner
//! [`Dispatcher`]: dispatcher::Dispatcher
//! [`Job`]: job::Job
//! [`TargetCache`]: cache::TargetCache

pub mod area;
pub mod cache;
pub mod carry;
pub mod claims;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod job;
pub mod scanner;

// Re-export primary types at crate root.
pub use area::Area;
pub use cache::TargetCache;
pub use carry::CarryState;
pub use claims::{ClaimCoordinator, ClaimError, ClaimTimeouts};
pub use config::{ConfigError, CoordinationSettings, CorralConfig};
pub use context::CoordinationContext;
pub use dispatcher::{Dispatcher, TickSummary};
pub use error::DispatchError;
pub use executor::{TaskOutcome, run_task};
pub use job::{Job, JobRegistry};
pub use scanner::{DeferredScanner, ValidatorSet};

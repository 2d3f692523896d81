//! Shared type definitions for the Corral coordination engine.
//!
//! This crate is the single source of truth for the value types passed
//! between the world seam, the coordination core, and the engine binary.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agent identifiers
//! - [`geometry`] -- Block positions, inclusive search volumes, and
//!   floating-point bounding boxes
//! - [`item`] -- Item stacks carried by agents and stored in inventories
//! - [`job`] -- The [`JobType`] enumeration
//!
//! [`JobType`]: job::JobType

pub mod geometry;
pub mod ids;
pub mod item;
pub mod job;

// Re-export all public types at crate root for convenience.
pub use geometry::{Aabb, AreaId, BlockPos, Bounds, BoundsIter};
pub use ids::AgentId;
pub use item::{DEFAULT_MAX_STACK, ItemStack, total_count};
pub use job::JobType;

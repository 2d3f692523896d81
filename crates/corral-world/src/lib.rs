//! The world seam of the Corral coordination engine.
//!
//! The coordination core never owns world state. It reads and mutates the
//! world through the [`World`] trait and moves items into destinations
//! through the [`Inventory`] trait. This crate defines both seams, the
//! transfer logic that bin-packs payloads into inventories, and a small
//! in-memory world used by tests and the demo engine.
//!
//! # Modules
//!
//! - [`block`] -- [`BlockState`], the per-position state of [`GridWorld`].
//! - [`error`] -- Error types for world operations.
//! - [`grid`] -- [`GridWorld`], a deterministic in-memory voxel world.
//! - [`inventory`] -- The [`Inventory`] trait and [`SlotInventory`].
//! - [`transfer`] -- Merge-then-place insertion of payloads into inventories.
//! - [`world`] -- The [`World`] trait consumed by the coordination core.
//!
//! [`BlockState`]: block::BlockState
//! [`GridWorld`]: grid::GridWorld
//! [`Inventory`]: inventory::Inventory
//! [`SlotInventory`]: inventory::SlotInventory
//! [`World`]: world::World

pub mod block;
pub mod error;
pub mod grid;
pub mod inventory;
pub mod transfer;
pub mod world;

// Re-export primary types at crate root.
pub use block::BlockState;
pub use error::WorldError;
pub use grid::{AGENT_INSET, DroppedStack, GridWorld};
pub use inventory::{Inventory, SlotInventory};
pub use transfer::{insert_stack, insert_stacks};
pub use world::World;

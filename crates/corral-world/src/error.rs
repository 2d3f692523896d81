//! Error types for the `corral-world` crate.
//!
//! Only the explicit mutation helpers of [`GridWorld`] can fail; the
//! [`World`] trait itself is infallible and reports absence with `Option`.
//!
//! [`GridWorld`]: crate::grid::GridWorld
//! [`World`]: crate::world::World

use corral_types::{AgentId, BlockPos};

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The agent is not present in the world.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The position does not hold an inventory block entity.
    #[error("no inventory at {0}")]
    NotAnInventory(BlockPos),

    /// A slot index beyond the inventory's size was addressed.
    #[error("slot {index} out of range at {pos} (size {size})")]
    SlotOutOfRange {
        /// The inventory position.
        pos: BlockPos,
        /// The requested slot.
        index: usize,
        /// Number of slots in the inventory.
        size: usize,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

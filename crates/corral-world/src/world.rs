//! The [`World`] trait: everything the coordination core needs from the
//! host simulation.
//!
//! Block semantics (what a "ready" resource looks like) are deliberately
//! absent. Jobs are written against a concrete world type and inspect its
//! blocks directly; the core only needs time, agent bodies, navigation,
//! and inventory capability.

use corral_types::{Aabb, AgentId, BlockPos, ItemStack};

use crate::inventory::Inventory;

/// Host simulation interface consumed by the coordination core.
///
/// Every method is infallible: a missing agent or a position without an
/// inventory is a normal outcome reported through `Option`.
pub trait World {
    /// Current tick counter of the simulation.
    fn tick(&self) -> u64;

    /// Whether the block at `pos` is of a kind that is expected to hold an
    /// inventory. This is a cheap block-kind check used by the scanner and
    /// may disagree with [`World::inventory_at`] when the block entity is
    /// missing.
    fn is_inventory_block(&self, pos: BlockPos) -> bool;

    /// Capability query: the inventory at `pos`, if one actually exists.
    fn inventory_at(&mut self, pos: BlockPos) -> Option<&mut dyn Inventory>;

    /// Spill a stack into the world at `pos`.
    fn drop_stack(&mut self, pos: BlockPos, stack: ItemStack);

    /// Bounding box of the agent's body, or `None` if it is not present.
    fn agent_box(&self, agent: AgentId) -> Option<Aabb>;

    /// Block the agent currently stands in, or `None` if it is not present.
    fn agent_position(&self, agent: AgentId) -> Option<BlockPos>;

    /// Order the agent to walk toward `target`. Repeated calls with the
    /// same target are expected every tick and must be idempotent.
    fn navigate_to(&mut self, agent: AgentId, target: BlockPos);

    /// Cancel any pending navigation for the agent.
    fn stop_navigation(&mut self, agent: AgentId);

    /// Whether the agent carries `tag` (a species, a type, a role). Worlds
    /// without tags report none.
    fn agent_has_tag(&self, _agent: AgentId, _tag: &str) -> bool {
        false
    }
}

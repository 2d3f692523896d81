//! [`GridWorld`]: a deterministic in-memory voxel world.
//!
//! Blocks are sparse (`BTreeMap<BlockPos, BlockState>`); positions without an
//! entry are air. Inventory-capable blocks may carry a [`SlotInventory`]
//! block entity. Agents are points on the grid that walk one step per axis
//! per tick toward their navigation destination when the world advances.
//!
//! A block whose kind is inventory-capable but which has no block entity is
//! allowed. It models a destination that looked like storage in a scan but
//! has no usable inventory.

use std::collections::{BTreeMap, BTreeSet};

use corral_types::{Aabb, AgentId, BlockPos, ItemStack};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::BlockState;
use crate::error::WorldError;
use crate::inventory::{Inventory, SlotInventory};
use crate::world::World;

/// How far an agent's body is inset from the block it stands in.
pub const AGENT_INSET: f64 = 0.2;

/// Block kinds recognised as inventory-capable in a fresh world.
const DEFAULT_INVENTORY_KINDS: [&str; 2] = ["chest", "barrel"];

/// A stack spilled into the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedStack {
    /// Where the stack was dropped.
    pub position: BlockPos,
    /// The dropped items.
    pub stack: ItemStack,
    /// Tick at which the drop happened.
    pub tick: u64,
}

#[derive(Debug, Clone)]
struct AgentBody {
    position: BlockPos,
    destination: Option<BlockPos>,
    tags: BTreeSet<String>,
}

/// An in-memory world implementing [`World`].
#[derive(Debug, Clone)]
pub struct GridWorld {
    tick: u64,
    blocks: BTreeMap<BlockPos, BlockState>,
    inventory_kinds: BTreeSet<String>,
    inventories: BTreeMap<BlockPos, SlotInventory>,
    agents: BTreeMap<AgentId, AgentBody>,
    dropped: Vec<DroppedStack>,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl GridWorld {
    /// An empty world at tick 0 that treats chests and barrels as storage.
    pub fn new() -> Self {
        Self {
            tick: 0,
            blocks: BTreeMap::new(),
            inventory_kinds: DEFAULT_INVENTORY_KINDS
                .iter()
                .map(|k| (*k).to_owned())
                .collect(),
            inventories: BTreeMap::new(),
            agents: BTreeMap::new(),
            dropped: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------

    /// Jump the clock to `tick` without moving agents.
    pub const fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Advance the clock by one tick and move every navigating agent one
    /// step toward its destination.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TickOverflow`] if the counter is at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, WorldError> {
        self.tick = self.tick.checked_add(1).ok_or(WorldError::TickOverflow)?;
        for body in self.agents.values_mut() {
            let Some(destination) = body.destination else {
                continue;
            };
            body.position = body.position.step_toward(&destination);
            if body.position == destination {
                body.destination = None;
            }
        }
        Ok(self.tick)
    }

    // -----------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------

    /// The block at `pos`, or `None` for air.
    pub fn block(&self, pos: BlockPos) -> Option<&BlockState> {
        self.blocks.get(&pos)
    }

    /// Mutable access to the block at `pos`.
    pub fn block_mut(&mut self, pos: BlockPos) -> Option<&mut BlockState> {
        self.blocks.get_mut(&pos)
    }

    /// Place a block, replacing whatever was there. A replaced inventory
    /// block entity is discarded.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) {
        self.inventories.remove(&pos);
        self.blocks.insert(pos, state);
    }

    /// Remove the block at `pos` (and its inventory), returning it.
    pub fn remove_block(&mut self, pos: BlockPos) -> Option<BlockState> {
        self.inventories.remove(&pos);
        self.blocks.remove(&pos)
    }

    /// Positions of every block of the given kind, in position order.
    pub fn positions_of(&self, kind: &str) -> Vec<BlockPos> {
        self.blocks
            .iter()
            .filter(|(_, state)| state.is(kind))
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Register additional block kinds as inventory-capable.
    pub fn add_inventory_kinds<I, S>(&mut self, kinds: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inventory_kinds.extend(kinds.into_iter().map(Into::into));
    }

    // -----------------------------------------------------------------
    // Inventories
    // -----------------------------------------------------------------

    /// Place an inventory block of `kind` with `size` empty slots.
    pub fn place_inventory(&mut self, pos: BlockPos, kind: impl Into<String>, size: usize) {
        self.blocks.insert(pos, BlockState::new(kind));
        self.inventories.insert(pos, SlotInventory::with_size(size));
    }

    /// Read-only view of the inventory at `pos`.
    pub fn inventory(&self, pos: BlockPos) -> Option<&SlotInventory> {
        self.inventories.get(&pos)
    }

    /// Overwrite one slot of the inventory at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotAnInventory`] if no inventory exists at
    /// `pos`, or [`WorldError::SlotOutOfRange`] for a bad index.
    pub fn set_inventory_slot(
        &mut self,
        pos: BlockPos,
        index: usize,
        stack: Option<ItemStack>,
    ) -> Result<(), WorldError> {
        let inventory = self
            .inventories
            .get_mut(&pos)
            .ok_or(WorldError::NotAnInventory(pos))?;
        let size = inventory.size();
        if index >= size {
            return Err(WorldError::SlotOutOfRange { pos, index, size });
        }
        inventory.set_slot(index, stack);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Agents
    // -----------------------------------------------------------------

    /// Add a new agent standing at `position`.
    pub fn spawn_agent(&mut self, position: BlockPos) -> AgentId {
        let id = AgentId::new();
        self.agents.insert(
            id,
            AgentBody {
                position,
                destination: None,
                tags: BTreeSet::new(),
            },
        );
        id
    }

    /// Give an agent a tag.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if the agent is not present.
    pub fn tag_agent(&mut self, agent: AgentId, tag: &str) -> Result<(), WorldError> {
        let body = self
            .agents
            .get_mut(&agent)
            .ok_or(WorldError::AgentNotFound(agent))?;
        body.tags.insert(tag.to_owned());
        Ok(())
    }

    /// Remove an agent from the world.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if the agent is not present.
    pub fn despawn_agent(&mut self, agent: AgentId) -> Result<(), WorldError> {
        self.agents
            .remove(&agent)
            .map(|_| ())
            .ok_or(WorldError::AgentNotFound(agent))
    }

    /// Move an agent instantly, cancelling its navigation.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if the agent is not present.
    pub fn teleport_agent(&mut self, agent: AgentId, position: BlockPos) -> Result<(), WorldError> {
        let body = self
            .agents
            .get_mut(&agent)
            .ok_or(WorldError::AgentNotFound(agent))?;
        body.position = position;
        body.destination = None;
        Ok(())
    }

    /// The agent's pending navigation destination.
    pub fn agent_destination(&self, agent: AgentId) -> Option<BlockPos> {
        self.agents.get(&agent).and_then(|b| b.destination)
    }

    /// Ids of every agent in the world, in id order.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    // -----------------------------------------------------------------
    // Dropped items
    // -----------------------------------------------------------------

    /// Every stack dropped so far.
    pub fn dropped(&self) -> &[DroppedStack] {
        &self.dropped
    }

    /// Drain the dropped-stack log.
    pub fn take_dropped(&mut self) -> Vec<DroppedStack> {
        std::mem::take(&mut self.dropped)
    }
}

impl World for GridWorld {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn is_inventory_block(&self, pos: BlockPos) -> bool {
        self.blocks
            .get(&pos)
            .is_some_and(|state| self.inventory_kinds.contains(&state.kind))
    }

    fn inventory_at(&mut self, pos: BlockPos) -> Option<&mut dyn Inventory> {
        self.inventories
            .get_mut(&pos)
            .map(|inv| inv as &mut dyn Inventory)
    }

    fn drop_stack(&mut self, pos: BlockPos, stack: ItemStack) {
        if stack.is_empty() {
            return;
        }
        debug!(tick = self.tick, %pos, item = %stack.item, count = stack.count, "stack dropped");
        self.dropped.push(DroppedStack {
            position: pos,
            stack,
            tick: self.tick,
        });
    }

    fn agent_box(&self, agent: AgentId) -> Option<Aabb> {
        self.agents
            .get(&agent)
            .map(|b| Aabb::of_block(b.position).expand(-AGENT_INSET))
    }

    fn agent_position(&self, agent: AgentId) -> Option<BlockPos> {
        self.agents.get(&agent).map(|b| b.position)
    }

    fn navigate_to(&mut self, agent: AgentId, target: BlockPos) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.destination = (body.position != target).then_some(target);
        }
    }

    fn stop_navigation(&mut self, agent: AgentId) {
        if let Some(body) = self.agents.get_mut(&agent) {
            body.destination = None;
        }
    }

    fn agent_has_tag(&self, agent: AgentId, tag: &str) -> bool {
        self.agents.get(&agent).is_some_and(|b| b.tags.contains(tag))
    }
}

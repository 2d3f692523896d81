//! Slot-based inventories.
//!
//! [`Inventory`] is the abstract destination the transfer logic writes into:
//! a fixed number of slots, each empty or holding one stack.

use corral_types::ItemStack;
use serde::{Deserialize, Serialize};

/// A fixed-size, slot-addressed item container.
pub trait Inventory {
    /// Number of slots.
    fn size(&self) -> usize;

    /// The stack in slot `index`, or `None` if the slot is empty or out of
    /// range.
    fn slot(&self, index: usize) -> Option<&ItemStack>;

    /// Replace the contents of slot `index`. Writes beyond `size()` are
    /// ignored; empty stacks are stored as an empty slot.
    fn set_slot(&mut self, index: usize, stack: Option<ItemStack>);

    /// Notify the host that the contents changed.
    fn mark_dirty(&mut self) {}
}

/// A plain vector-backed inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInventory {
    slots: Vec<Option<ItemStack>>,
    #[serde(skip)]
    dirty: bool,
}

impl SlotInventory {
    /// An inventory with `size` empty slots.
    pub fn with_size(size: usize) -> Self {
        Self {
            slots: vec![None; size],
            dirty: false,
        }
    }

    /// Iterate over the occupied slots.
    pub fn stacks(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().flatten()
    }

    /// Total item count across all slots, saturating at `u64::MAX`.
    pub fn item_count(&self) -> u64 {
        self.stacks()
            .fold(0_u64, |acc, s| acc.saturating_add(u64::from(s.count)))
    }

    /// Total count of a specific item across all slots.
    pub fn count_of(&self, item: &str) -> u64 {
        self.stacks()
            .filter(|s| s.item == item)
            .fold(0_u64, |acc, s| acc.saturating_add(u64::from(s.count)))
    }

    /// Whether the contents changed since the last [`SlotInventory::take_dirty`].
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the dirty flag.
    pub const fn take_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }
}

impl Inventory for SlotInventory {
    fn size(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .filter(|s| !s.is_empty())
    }

    fn set_slot(&mut self, index: usize, stack: Option<ItemStack>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = stack.filter(|s| !s.is_empty());
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

//! Item stacks: the payload agents carry and inventories store.
//!
//! Two stacks hold "the same item" when both the item identifier and the
//! attached component data are equal. Only same-item stacks merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default maximum number of items in one stack.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// A counted stack of one kind of item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item identifier, e.g. `"oran_berry"`.
    pub item: String,
    /// Attached data that distinguishes otherwise identical items.
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Number of items in the stack. Zero means empty.
    pub count: u32,
    /// Largest count a single inventory slot may hold for this item.
    #[serde(default = "default_max_count")]
    pub max_count: u32,
}

const fn default_max_count() -> u32 {
    DEFAULT_MAX_STACK
}

impl ItemStack {
    /// Create a stack of `count` items with the default stack limit.
    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            components: BTreeMap::new(),
            count,
            max_count: DEFAULT_MAX_STACK,
        }
    }

    /// Builder: override the per-slot stack limit.
    #[must_use]
    pub const fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// Builder: attach a component value.
    #[must_use]
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Whether the stack holds no items.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether `other` is the same item (identifier and components).
    pub fn is_same_item(&self, other: &Self) -> bool {
        self.item == other.item && self.components == other.components
    }

    /// Free room left in this stack before it reaches `max_count`.
    pub const fn headroom(&self) -> u32 {
        self.max_count.saturating_sub(self.count)
    }

    /// Remove up to `amount` items from this stack and return them as a new
    /// stack of the same item.
    pub fn split(&mut self, amount: u32) -> Self {
        let taken = amount.min(self.count);
        self.count = self.count.saturating_sub(taken);
        Self {
            item: self.item.clone(),
            components: self.components.clone(),
            count: taken,
            max_count: self.max_count,
        }
    }
}

/// Sum of the counts of `stacks`, saturating at `u64::MAX`.
pub fn total_count(stacks: &[ItemStack]) -> u64 {
    stacks
        .iter()
        .fold(0_u64, |acc, s| acc.saturating_add(u64::from(s.count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_moves_items_out() {
        let mut stack = ItemStack::new("oran_berry", 10);
        let taken = stack.split(4);
        assert_eq!(taken.count, 4);
        assert_eq!(stack.count, 6);
        assert!(taken.is_same_item(&stack));
    }

    #[test]
    fn split_caps_at_available() {
        let mut stack = ItemStack::new("oran_berry", 3);
        let taken = stack.split(10);
        assert_eq!(taken.count, 3);
        assert!(stack.is_empty());
    }

    #[test]
    fn components_distinguish_items() {
        let plain = ItemStack::new("map", 1);
        let marked = ItemStack::new("map", 1).with_component("destination", "ruins");
        assert!(!plain.is_same_item(&marked));
        assert!(marked.is_same_item(&marked.clone()));
    }

    #[test]
    fn headroom_respects_max_count() {
        let stack = ItemStack::new("honeycomb", 40);
        assert_eq!(stack.headroom(), 24);
        let small = ItemStack::new("egg", 16).with_max_count(16);
        assert_eq!(small.headroom(), 0);
    }

    #[test]
    fn total_count_sums_stacks() {
        let stacks = vec![ItemStack::new("a", 5), ItemStack::new("b", 7)];
        assert_eq!(total_count(&stacks), 12);
        assert_eq!(total_count(&[]), 0);
    }

    #[test]
    fn max_count_defaults_when_missing_from_json() {
        let stack: Result<ItemStack, _> =
            serde_json::from_str(r#"{"item":"apricorn","count":2}"#);
        let stack = stack.ok();
        assert_eq!(stack.as_ref().map(|s| s.max_count), Some(DEFAULT_MAX_STACK));
        assert_eq!(stack.map(|s| s.components.len()), Some(0));
    }
}

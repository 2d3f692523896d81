//! Bin-packing insertion of payloads into inventories.
//!
//! Each input stack is first merged into existing slots that hold the same
//! item, in slot order, up to the slot's stack limit. Whatever is left then
//! goes into empty slots, in slot order, split to the stack limit. Filling
//! existing stacks first keeps destinations from fragmenting.
//!
//! Item counts are conserved: for every call, the items offered equal the
//! items placed plus the items returned.

use corral_types::ItemStack;

use crate::inventory::Inventory;

/// Insert every stack of `stacks` into `inventory`.
///
/// Returns the unconsumed remainder of each input stack, in input order.
/// Stacks that were fully consumed are omitted, so an empty result means
/// the whole payload was absorbed.
pub fn insert_stacks(inventory: &mut dyn Inventory, stacks: &[ItemStack]) -> Vec<ItemStack> {
    stacks
        .iter()
        .cloned()
        .map(|stack| insert_stack(inventory, stack))
        .filter(|remainder| !remainder.is_empty())
        .collect()
}

/// Insert a single stack and return what did not fit (possibly empty).
pub fn insert_stack(inventory: &mut dyn Inventory, mut stack: ItemStack) -> ItemStack {
    if stack.is_empty() {
        return stack;
    }

    let size = inventory.size();
    let mut changed = false;

    // Merge into existing same-item stacks.
    for index in 0..size {
        if stack.is_empty() {
            break;
        }
        let Some(existing) = inventory.slot(index) else {
            continue;
        };
        if !existing.is_same_item(&stack) {
            continue;
        }
        let room = existing.headroom();
        if room == 0 {
            continue;
        }
        let mut merged = existing.clone();
        let moved = stack.split(room);
        merged.count = merged.count.saturating_add(moved.count);
        inventory.set_slot(index, Some(merged));
        changed = true;
    }

    // Place the rest into empty slots.
    for index in 0..size {
        if stack.is_empty() || stack.max_count == 0 {
            break;
        }
        if inventory.slot(index).is_some() {
            continue;
        }
        let placed = stack.split(stack.max_count);
        inventory.set_slot(index, Some(placed));
        changed = true;
    }

    if changed {
        inventory.mark_dirty();
    }
    stack
}

#[cfg(test)]
mod tests {
    use corral_types::total_count;

    use super::*;
    use crate::inventory::SlotInventory;

    fn inventory_with(slots: &[Option<ItemStack>]) -> SlotInventory {
        let mut inv = SlotInventory::with_size(slots.len());
        for (index, slot) in slots.iter().enumerate() {
            inv.set_slot(index, slot.clone());
        }
        inv
    }

    #[test]
    fn overflow_with_no_empty_slot_is_returned() {
        let mut inv = inventory_with(&[Some(ItemStack::new("x", 40))]);
        let rest = insert_stacks(&mut inv, &[ItemStack::new("x", 30)]);
        assert_eq!(inv.slot(0).map(|s| s.count), Some(64));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.first().map(|s| s.count), Some(6));
    }

    #[test]
    fn overflow_spills_into_empty_slot() {
        let mut inv = inventory_with(&[Some(ItemStack::new("x", 40)), None]);
        let rest = insert_stacks(&mut inv, &[ItemStack::new("x", 30)]);
        assert!(rest.is_empty());
        assert_eq!(inv.slot(0).map(|s| s.count), Some(64));
        assert_eq!(inv.slot(1).map(|s| s.count), Some(6));
    }

    #[test]
    fn existing_stacks_fill_before_earlier_empty_slots() {
        let mut inv = inventory_with(&[None, Some(ItemStack::new("x", 60))]);
        let rest = insert_stacks(&mut inv, &[ItemStack::new("x", 10)]);
        assert!(rest.is_empty());
        assert_eq!(inv.slot(1).map(|s| s.count), Some(64));
        assert_eq!(inv.slot(0).map(|s| s.count), Some(6));
    }

    #[test]
    fn large_stack_splits_across_empty_slots_in_order() {
        let mut inv = SlotInventory::with_size(3);
        let rest = insert_stacks(&mut inv, &[ItemStack::new("x", 150)]);
        assert!(rest.is_empty());
        assert_eq!(inv.slot(0).map(|s| s.count), Some(64));
        assert_eq!(inv.slot(1).map(|s| s.count), Some(64));
        assert_eq!(inv.slot(2).map(|s| s.count), Some(22));
    }

    #[test]
    fn respects_item_stack_limit() {
        let mut inv = SlotInventory::with_size(2);
        let eggs = ItemStack::new("egg", 20).with_max_count(16);
        let rest = insert_stacks(&mut inv, &[eggs]);
        assert!(rest.is_empty());
        assert_eq!(inv.slot(0).map(|s| s.count), Some(16));
        assert_eq!(inv.slot(1).map(|s| s.count), Some(4));
    }

    #[test]
    fn different_components_do_not_merge() {
        let plain = ItemStack::new("map", 1).with_max_count(1);
        let marked = ItemStack::new("map", 1)
            .with_max_count(1)
            .with_component("destination", "ruins");
        let mut inv = inventory_with(&[Some(plain)]);
        let rest = insert_stacks(&mut inv, &[marked.clone()]);
        assert_eq!(rest, vec![marked]);
    }

    #[test]
    fn remainders_keep_input_order_and_omit_consumed() {
        let mut inv = inventory_with(&[Some(ItemStack::new("a", 60)), None]);
        let rest = insert_stacks(
            &mut inv,
            &[
                ItemStack::new("b", 64),
                ItemStack::new("a", 10),
                ItemStack::new("c", 3),
            ],
        );
        // "b" takes the empty slot, "a" tops up slot 0 and loses 6, "c" has nowhere to go.
        let summary: Vec<(&str, u32)> = rest.iter().map(|s| (s.item.as_str(), s.count)).collect();
        assert_eq!(summary, vec![("a", 6), ("c", 3)]);
    }

    #[test]
    fn item_counts_are_conserved() {
        let cases: Vec<(Vec<Option<ItemStack>>, Vec<ItemStack>)> = vec![
            (vec![None; 2], vec![ItemStack::new("x", 200)]),
            (
                vec![Some(ItemStack::new("x", 63)), None, Some(ItemStack::new("y", 1))],
                vec![ItemStack::new("y", 70), ItemStack::new("x", 5), ItemStack::new("z", 9)],
            ),
            (vec![], vec![ItemStack::new("x", 1)]),
        ];
        for (slots, offered) in cases {
            let mut inv = inventory_with(&slots);
            let before = inv.item_count();
            let rest = insert_stacks(&mut inv, &offered);
            let placed = inv.item_count().saturating_sub(before);
            assert_eq!(total_count(&offered), placed.saturating_add(total_count(&rest)));
        }
    }

    #[test]
    fn empty_input_changes_nothing() {
        let mut inv = SlotInventory::with_size(1);
        let rest = insert_stacks(&mut inv, &[ItemStack::new("x", 0)]);
        assert!(rest.is_empty());
        assert!(!inv.is_dirty());
    }

    #[test]
    fn successful_insert_marks_dirty() {
        let mut inv = SlotInventory::with_size(1);
        let _ = insert_stack(&mut inv, ItemStack::new("x", 1));
        assert!(inv.is_dirty());
    }
}

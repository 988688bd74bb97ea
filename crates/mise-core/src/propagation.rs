//! # Price Propagation Ordering
//!
//! When a material's purchase price changes, every sellable item whose
//! recipe graph references it, directly or through nested linked items,
//! must have its cached `unit_cost` recomputed.
//!
//! ## Why Leaves-First?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Material A changes                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Drink (uses A directly)        ← recompute FIRST                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Combo (links Drink)            ← recompute SECOND, reusing Drink's    │
//! │                                   already-updated cached unit cost     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module only computes the order; mise-db re-runs the rollup with the
//! base context (no optionals, no selection) per item and persists the new
//! cached costs.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::Catalog;
use crate::types::RecipeRef;

/// Returns the ids of every item affected by a price change of
/// `material_id`, ordered leaves-first (an item always appears after the
/// affected linked items its recipe references).
///
/// Any reference counts, whether mandatory, optional, or a group
/// alternative: each keeps the item's cost dependent on the material. Cycles in
/// the graph are tolerated: members of a cycle are emitted in a stable
/// (sorted) order once no further progress is possible.
pub fn affected_items(catalog: &Catalog, material_id: &str) -> Vec<String> {
    // Items whose own recipe lines name the material.
    let direct: HashSet<&str> = catalog
        .all_lines()
        .filter(|l| matches!(&l.reference, RecipeRef::Material(id) if id == material_id))
        .map(|l| l.owner_item_id.as_str())
        .collect();

    if direct.is_empty() {
        return Vec::new();
    }

    // Reverse linked-item edges: child item -> owning parents.
    let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
    for line in catalog.all_lines() {
        if let RecipeRef::LinkedItem(child) = &line.reference {
            parents
                .entry(child.as_str())
                .or_default()
                .push(line.owner_item_id.as_str());
        }
    }

    // Closure upward from the direct users.
    let mut affected: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = direct.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if !affected.insert(id) {
            continue;
        }
        if let Some(ups) = parents.get(id) {
            queue.extend(ups.iter().copied());
        }
    }

    // Kahn-style emit: an item is ready once every affected linked child
    // of its recipe has been emitted.
    let children_of = |id: &str| -> Vec<&str> {
        catalog
            .lines_for(id)
            .iter()
            .filter_map(|l| match &l.reference {
                RecipeRef::LinkedItem(child) if affected.contains(child.as_str()) => {
                    Some(child.as_str())
                }
                _ => None,
            })
            .collect()
    };

    let mut emitted: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::with_capacity(affected.len());
    let mut remaining: Vec<&str> = {
        let mut v: Vec<&str> = affected.iter().copied().collect();
        v.sort_unstable();
        v
    };

    while !remaining.is_empty() {
        let mut progressed = false;
        remaining.retain(|id| {
            let ready = children_of(*id)
                .iter()
                .all(|c| emitted.contains(c) || c == id);
            if ready {
                emitted.insert(*id);
                order.push((*id).to_string());
                progressed = true;
                false
            } else {
                true
            }
        });

        if !progressed {
            // Cycle: flush the rest in sorted order rather than spinning.
            for id in remaining.drain(..) {
                order.push(id.to_string());
            }
        }
    }

    order
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{combo_catalog, item, line_linked, line_material, material_with};

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|x| x == id).unwrap()
    }

    #[test]
    fn test_unreferenced_material_affects_nothing() {
        let catalog = combo_catalog();
        assert!(affected_items(&catalog, "nowhere").is_empty());
    }

    #[test]
    fn test_chain_orders_children_before_parents() {
        // mat-a is used by drink-small and drink-large; combo links both.
        let catalog = combo_catalog();
        let order = affected_items(&catalog, "mat-a");

        assert_eq!(order.len(), 3);
        assert!(position(&order, "drink-small") < position(&order, "combo"));
        assert!(position(&order, "drink-large") < position(&order, "combo"));
    }

    #[test]
    fn test_diamond_emits_each_item_once() {
        // mat → base; left and right both link base; top links both.
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("mat", "Flour", 1.0, 1.0));
        for id in ["base", "left", "right", "top"] {
            catalog.insert_item(item(id, id));
        }
        catalog.insert_line(line_material("l0", "base", "mat", 1.0));
        catalog.insert_line(line_linked("l1", "left", "base", 1.0));
        catalog.insert_line(line_linked("l2", "right", "base", 1.0));
        catalog.insert_line(line_linked("l3", "top", "left", 1.0));
        catalog.insert_line(line_linked("l4", "top", "right", 1.0));

        let order = affected_items(&catalog, "mat");
        assert_eq!(order.len(), 4);
        assert_eq!(position(&order, "base"), 0);
        assert!(position(&order, "left") < position(&order, "top"));
        assert!(position(&order, "right") < position(&order, "top"));
    }

    #[test]
    fn test_cycle_still_emits_every_member() {
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("mat", "Flour", 1.0, 1.0));
        catalog.insert_item(item("a", "A"));
        catalog.insert_item(item("b", "B"));
        catalog.insert_line(line_material("l0", "a", "mat", 1.0));
        catalog.insert_line(line_linked("l1", "a", "b", 1.0));
        catalog.insert_line(line_linked("l2", "b", "a", 1.0));

        let order = affected_items(&catalog, "mat");
        assert_eq!(order.len(), 2);
        assert!(order.contains(&"a".to_string()));
        assert!(order.contains(&"b".to_string()));
    }
}

//! # Cost Rollup Calculator
//!
//! Given an item, a quantity, and a concrete resolution of choices,
//! recursively computes total monetary cost and a per-leaf breakdown.
//!
//! ## Inclusion Rules (per RecipeLine, multiplied by the enclosing level)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  material line            → line_cost = unit_cost × effective qty;     │
//! │                             included unless optional and not selected  │
//! │                                                                         │
//! │  linked item, no group,   → always included; recurse, multiplying      │
//! │  not optional               quantity down the tree                     │
//! │                                                                         │
//! │  linked/material line in  → include the alternative the selection     │
//! │  a selection group          names; an unresolved group contributes     │
//! │                             NOTHING (fail closed) unless it has        │
//! │                             exactly one alternative, which is          │
//! │                             auto-selected                              │
//! │                                                                         │
//! │  optional line            → included only when its line id is in       │
//! │                             selected_optional                          │
//! │                                                                         │
//! │  linked item with no      → a true primitive product: contributes      │
//! │  recipe lines               its cached unit_cost directly              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numeric Semantics
//! `total_cost` is the plain sum of line costs; nothing is rounded
//! mid-calculation. Display rounding is the caller's concern.
//!
//! ## Failure
//! An unknown item yields a zero-cost result flagged `no_recipe` rather
//! than an error: menu listings must degrade to "cost unknown" without
//! crashing. An item that exists but has no recipe lines is a true
//! primitive and is charged at its cached unit cost, exactly as when it
//! appears as a leaf inside another recipe. Problems inside the tree
//! become warnings on the result.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::error::EngineWarning;
use crate::types::{group_key, BundleSelection, CostLine, CostResult, RecipeLine, RecipeRef};
use crate::MAX_RECIPE_DEPTH;

/// Computes the cost of `quantity` units of `item_id` under `selection`.
///
/// Pass `None` for the selection to cost the base context: no optionals,
/// and only single-alternative groups resolve. This is the context price
/// propagation uses to refresh cached unit costs.
pub fn calculate_cost(
    catalog: &Catalog,
    item_id: &str,
    quantity: f64,
    selection: Option<&BundleSelection>,
) -> CostResult {
    let mut result = CostResult::default();

    let Some(root) = catalog.item(item_id) else {
        // "Cost unknown", not an error: the item doesn't exist.
        result.no_recipe = true;
        return result;
    };

    if catalog.lines_for(item_id).is_empty() {
        // True primitive product: charged at its cached unit cost, the
        // same as when it appears as a leaf inside another recipe.
        let line_cost = root.unit_cost * quantity;
        result.breakdown.push(CostLine {
            name: root.name.clone(),
            material_id: None,
            unit_cost: root.unit_cost,
            quantity,
            line_cost,
        });
        result.total_cost = line_cost;
        return result;
    }

    let mut path: HashSet<String> = HashSet::new();
    walk_item(catalog, item_id, quantity, selection, 0, &mut path, &mut result);
    result
}

/// Walks one item's recipe lines with `multiplier` units of the owner.
fn walk_item(
    catalog: &Catalog,
    item_id: &str,
    multiplier: f64,
    selection: Option<&BundleSelection>,
    depth: usize,
    path: &mut HashSet<String>,
    result: &mut CostResult,
) {
    if depth >= MAX_RECIPE_DEPTH {
        result.warnings.push(EngineWarning::DepthExceeded {
            item_id: item_id.to_string(),
            max_depth: MAX_RECIPE_DEPTH,
        });
        return;
    }
    if !path.insert(item_id.to_string()) {
        result.warnings.push(EngineWarning::CycleDetected {
            item_id: item_id.to_string(),
        });
        return;
    }

    let lines = catalog.lines_for(item_id);
    let mut handled_groups: HashSet<&str> = HashSet::new();

    for line in lines {
        if line.is_optional {
            let chosen = selection.is_some_and(|s| s.optional_chosen(&line.id));
            if chosen {
                include_line(catalog, line, line.quantity * multiplier, selection, depth, path, result);
            }
            continue;
        }

        if let Some(group) = line.selection_group.as_deref() {
            // Resolve each group once, at its first line.
            if !handled_groups.insert(group) {
                continue;
            }
            let alternatives: Vec<&RecipeLine> = lines
                .iter()
                .filter(|l| l.is_group_alternative() && l.selection_group.as_deref() == Some(group))
                .collect();

            match resolve_group(item_id, group, &alternatives, selection) {
                Some(chosen) => include_line(
                    catalog,
                    chosen,
                    chosen.quantity * multiplier,
                    selection,
                    depth,
                    path,
                    result,
                ),
                None => result.warnings.push(EngineWarning::UnresolvedGroup {
                    group_key: group_key(item_id, group),
                }),
            }
            continue;
        }

        include_line(catalog, line, line.quantity * multiplier, selection, depth, path, result);
    }

    path.remove(item_id);
}

/// Picks the alternative of a mandatory exclusive group.
///
/// Fail-closed policy: an unresolved group yields `None` (no cost
/// contribution), except that a group with exactly one alternative
/// auto-selects. That covers recipes with no real choice and call sites
/// that pass no selection.
fn resolve_group<'a>(
    owner_item_id: &str,
    group: &str,
    alternatives: &[&'a RecipeLine],
    selection: Option<&BundleSelection>,
) -> Option<&'a RecipeLine> {
    let key = group_key(owner_item_id, group);

    if let Some(chosen_id) = selection.and_then(|s| s.chosen_for(&key)) {
        return alternatives
            .iter()
            .find(|l| l.reference.id() == chosen_id)
            .copied();
    }

    if alternatives.len() == 1 {
        return Some(alternatives[0]);
    }

    None
}

/// Charges one included line: a material leaf, a primitive item leaf, or a
/// recursion into a composed linked item.
fn include_line(
    catalog: &Catalog,
    line: &RecipeLine,
    effective_quantity: f64,
    selection: Option<&BundleSelection>,
    depth: usize,
    path: &mut HashSet<String>,
    result: &mut CostResult,
) {
    match &line.reference {
        RecipeRef::Material(material_id) => {
            let Some(material) = catalog.material(material_id) else {
                result.warnings.push(EngineWarning::MissingMaterial {
                    line_id: line.id.clone(),
                    material_id: material_id.clone(),
                });
                return;
            };
            if !material.has_valid_purchase_quantity() {
                result.warnings.push(EngineWarning::ZeroPurchaseQuantity {
                    material_id: material_id.clone(),
                });
            }
            let unit_cost = material.unit_cost();
            let line_cost = unit_cost * effective_quantity;
            result.breakdown.push(CostLine {
                name: material.name.clone(),
                material_id: Some(material.id.clone()),
                unit_cost,
                quantity: effective_quantity,
                line_cost,
            });
            result.total_cost += line_cost;
        }

        RecipeRef::LinkedItem(linked_id) => {
            let Some(linked) = catalog.item(linked_id) else {
                result.warnings.push(EngineWarning::MissingItem {
                    line_id: line.id.clone(),
                    item_id: linked_id.clone(),
                });
                return;
            };

            if catalog.lines_for(linked_id).is_empty() {
                // True primitive product: charge its cached unit cost.
                let line_cost = linked.unit_cost * effective_quantity;
                result.breakdown.push(CostLine {
                    name: linked.name.clone(),
                    material_id: None,
                    unit_cost: linked.unit_cost,
                    quantity: effective_quantity,
                    line_cost,
                });
                result.total_cost += line_cost;
                return;
            }

            walk_item(
                catalog,
                linked_id,
                effective_quantity,
                selection,
                depth + 1,
                path,
                result,
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        combo_catalog, in_group, item, line_linked, line_material, material_with,
    };

    const EPS: f64 = 1e-9;

    #[test]
    fn test_combo_with_large_and_cookie() {
        // Large = 3 × mat-a @ 0.50, Cookie = 1 × mat-b @ 1.20 → 2.70
        let catalog = combo_catalog();
        let selection = BundleSelection::empty()
            .choose("combo:size", "drink-large")
            .add_optional("l-cookie");

        let cost = calculate_cost(&catalog, "combo", 1.0, Some(&selection));

        assert!((cost.total_cost - 2.70).abs() < EPS);
        assert_eq!(cost.breakdown.len(), 2);
        assert!(!cost.no_recipe);
        assert!(cost.warnings.is_empty());
    }

    #[test]
    fn test_combo_without_optional() {
        // Large = 3 × mat-a @ 0.50 → 1.50; no cookie line charged.
        let catalog = combo_catalog();
        let selection = BundleSelection::empty().choose("combo:size", "drink-large");

        let cost = calculate_cost(&catalog, "combo", 1.0, Some(&selection));

        assert!((cost.total_cost - 1.50).abs() < EPS);
        assert_eq!(cost.breakdown.len(), 1);
        assert!(cost
            .breakdown
            .iter()
            .all(|l| l.material_id.as_deref() != Some("mat-b")));
    }

    #[test]
    fn test_total_is_sum_of_breakdown() {
        let catalog = combo_catalog();
        let selection = BundleSelection::empty()
            .choose("combo:size", "drink-large")
            .add_optional("l-cookie");

        let cost = calculate_cost(&catalog, "combo", 3.0, Some(&selection));
        let summed: f64 = cost.breakdown.iter().map(|l| l.line_cost).sum();
        assert!((cost.total_cost - summed).abs() < EPS);
    }

    #[test]
    fn test_linearity_without_choices() {
        // latte = 2 × beans + 1 × milk, no groups, no optionals.
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("beans", "Beans", 1000.0, 18.0));
        catalog.insert_material(material_with("milk", "Milk", 10.0, 9.0));
        catalog.insert_item(item("latte", "Latte"));
        catalog.insert_line(line_material("l1", "latte", "beans", 18.0));
        catalog.insert_line(line_material("l2", "latte", "milk", 0.2));

        let one = calculate_cost(&catalog, "latte", 1.0, None);
        let seven = calculate_cost(&catalog, "latte", 7.0, None);
        assert!((seven.total_cost - 7.0 * one.total_cost).abs() < EPS);
    }

    #[test]
    fn test_duplicate_material_at_two_depths_is_additive() {
        // root → 1 × mat directly, and → sub (1 × mat). No coalescing.
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("mat", "Sugar", 1.0, 0.10));
        catalog.insert_item(item("root", "Root"));
        catalog.insert_item(item("sub", "Sub"));
        catalog.insert_line(line_material("l1", "root", "mat", 1.0));
        catalog.insert_line(line_linked("l2", "root", "sub", 2.0));
        catalog.insert_line(line_material("l3", "sub", "mat", 3.0));

        let cost = calculate_cost(&catalog, "root", 1.0, None);

        // Two separate breakdown lines for the same material.
        assert_eq!(cost.breakdown.len(), 2);
        assert!((cost.breakdown[0].quantity - 1.0).abs() < EPS);
        assert!((cost.breakdown[1].quantity - 6.0).abs() < EPS);
        assert!((cost.total_cost - 0.70).abs() < EPS);
    }

    #[test]
    fn test_unresolved_multi_alternative_group_fails_closed() {
        let catalog = combo_catalog();
        let cost = calculate_cost(&catalog, "combo", 1.0, None);

        assert!((cost.total_cost - 0.0).abs() < EPS);
        assert!(cost
            .warnings
            .iter()
            .any(|w| matches!(w, EngineWarning::UnresolvedGroup { group_key } if group_key == "combo:size")));
    }

    #[test]
    fn test_single_alternative_group_auto_selects() {
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("mat", "Beans", 1.0, 0.50));
        catalog.insert_item(item("drink", "Drink"));
        catalog.insert_line(in_group(line_material("l1", "drink", "mat", 2.0), "size"));

        let cost = calculate_cost(&catalog, "drink", 1.0, None);
        assert!((cost.total_cost - 1.00).abs() < EPS);
        assert!(cost.warnings.is_empty());
    }

    #[test]
    fn test_selection_naming_unknown_alternative_is_unresolved() {
        let catalog = combo_catalog();
        let selection = BundleSelection::empty().choose("combo:size", "not-a-drink");
        let cost = calculate_cost(&catalog, "combo", 1.0, Some(&selection));

        assert_eq!(cost.total_cost, 0.0);
        assert!(cost
            .warnings
            .iter()
            .any(|w| matches!(w, EngineWarning::UnresolvedGroup { .. })));
    }

    #[test]
    fn test_primitive_linked_item_charges_cached_unit_cost() {
        let mut catalog = Catalog::new();
        catalog.insert_item(item("root", "Root"));
        let mut bottled = item("water", "Bottled Water");
        bottled.unit_cost = 0.35;
        catalog.insert_item(bottled);
        catalog.insert_line(line_linked("l1", "root", "water", 2.0));

        let cost = calculate_cost(&catalog, "root", 1.0, None);
        assert!((cost.total_cost - 0.70).abs() < EPS);
        assert_eq!(cost.breakdown.len(), 1);
        assert!(cost.breakdown[0].material_id.is_none());
    }

    #[test]
    fn test_unknown_item_is_no_recipe_not_error() {
        let catalog = Catalog::new();
        let cost = calculate_cost(&catalog, "ghost", 1.0, None);
        assert!(cost.no_recipe);
        assert_eq!(cost.total_cost, 0.0);
        assert!(cost.breakdown.is_empty());
    }

    #[test]
    fn test_primitive_item_at_top_level_charges_cached_cost() {
        // Quoting a line-less item directly behaves like quoting it as a
        // leaf: its cached unit cost is charged, not zero.
        let mut catalog = Catalog::new();
        let mut bottled = item("water", "Bottled Water");
        bottled.unit_cost = 0.35;
        catalog.insert_item(bottled);

        let cost = calculate_cost(&catalog, "water", 2.0, None);
        assert!(!cost.no_recipe);
        assert!((cost.total_cost - 0.70).abs() < EPS);
        assert_eq!(cost.breakdown.len(), 1);
        assert!(cost.breakdown[0].material_id.is_none());
        assert_eq!(cost.breakdown[0].name, "Bottled Water");
    }

    #[test]
    fn test_zero_purchase_quantity_costs_zero_with_warning() {
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("bad", "Bad Batch", 0.0, 10.0));
        catalog.insert_item(item("root", "Root"));
        catalog.insert_line(line_material("l1", "root", "bad", 5.0));

        let cost = calculate_cost(&catalog, "root", 1.0, None);
        assert_eq!(cost.total_cost, 0.0);
        assert_eq!(cost.breakdown.len(), 1);
        assert!(cost
            .warnings
            .iter()
            .any(|w| matches!(w, EngineWarning::ZeroPurchaseQuantity { .. })));
    }

    #[test]
    fn test_cycle_terminates_with_warning() {
        let mut catalog = Catalog::new();
        catalog.insert_material(material_with("mat", "Sugar", 1.0, 0.10));
        catalog.insert_item(item("a", "A"));
        catalog.insert_item(item("b", "B"));
        catalog.insert_line(line_material("l0", "a", "mat", 1.0));
        catalog.insert_line(line_linked("l1", "a", "b", 1.0));
        catalog.insert_line(line_linked("l2", "b", "a", 1.0));

        let cost = calculate_cost(&catalog, "a", 1.0, None);
        // The direct material is still charged; the cycle is cut.
        assert!((cost.total_cost - 0.10).abs() < EPS);
        assert!(cost
            .warnings
            .iter()
            .any(|w| matches!(w, EngineWarning::CycleDetected { .. })));
    }
}

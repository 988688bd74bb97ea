//! # Consumption Planner
//!
//! The pure half of the consumption recorder: mirrors the cost rollup's
//! traversal but produces the stock draws to apply instead of only a cost.
//!
//! ## Split of Responsibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mise-core (here)                 mise-db (engine.rs)                  │
//! │                                                                         │
//! │  plan_consumption(...)  ───────►  one transaction:                     │
//! │    pure walk over the              ├── stock_quantity -= draw.quantity │
//! │    Catalog snapshot,               └── INSERT consumption_record       │
//! │    no side effects                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Correctness Property
//! For the same `(item, quantity, selection)` and catalog snapshot, the
//! plan's total cost equals [`crate::rollup::calculate_cost`]'s total when
//! every leaf of the included subtree is a material. The two walks are
//! implemented independently on purpose; the equivalence is pinned by
//! tests, not by sharing code.
//!
//! A material referenced at two nesting depths yields two entries; draws
//! are never coalesced, so per-line reporting keeps full resolution.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineResult, EngineWarning};
use crate::types::{group_key, BundleSelection, ConsumptionPlan, PlannedDraw, RecipeRef};
use crate::MAX_RECIPE_DEPTH;

/// Plans the material draws for selling `quantity` units of `item_id`.
///
/// ## Failure
/// Unknown root item → [`EngineError::ItemNotFound`]: a confirmed sale
/// against a missing catalog record is a hard fault, unlike quoting.
/// An item with no recipe lines yields an empty plan (nothing to draw).
pub fn plan_consumption(
    catalog: &Catalog,
    item_id: &str,
    quantity: f64,
    selection: Option<&BundleSelection>,
) -> EngineResult<ConsumptionPlan> {
    if catalog.item(item_id).is_none() {
        return Err(EngineError::ItemNotFound(item_id.to_string()));
    }

    let mut plan = ConsumptionPlan::default();
    let mut path: HashSet<String> = HashSet::new();
    draw_from_item(catalog, item_id, quantity, selection, 0, &mut path, &mut plan);
    Ok(plan)
}

fn draw_from_item(
    catalog: &Catalog,
    item_id: &str,
    multiplier: f64,
    selection: Option<&BundleSelection>,
    depth: usize,
    path: &mut HashSet<String>,
    plan: &mut ConsumptionPlan,
) {
    if depth >= MAX_RECIPE_DEPTH {
        plan.warnings.push(EngineWarning::DepthExceeded {
            item_id: item_id.to_string(),
            max_depth: MAX_RECIPE_DEPTH,
        });
        return;
    }
    if !path.insert(item_id.to_string()) {
        plan.warnings.push(EngineWarning::CycleDetected {
            item_id: item_id.to_string(),
        });
        return;
    }

    let lines = catalog.lines_for(item_id);
    let mut resolved_groups: HashSet<&str> = HashSet::new();

    for line in lines {
        // Optional lines draw only when explicitly chosen.
        if line.is_optional {
            if selection.is_some_and(|s| s.optional_chosen(&line.id)) {
                draw_reference(catalog, line, line.quantity * multiplier, selection, depth, path, plan);
            }
            continue;
        }

        // One pass per exclusive group: pick the chosen alternative, or the
        // only one; otherwise the group contributes nothing (fail closed).
        if let Some(group) = line.selection_group.as_deref() {
            if !resolved_groups.insert(group) {
                continue;
            }
            let key = group_key(item_id, group);
            let alternatives: Vec<_> = lines
                .iter()
                .filter(|l| l.is_group_alternative() && l.selection_group.as_deref() == Some(group))
                .collect();

            let chosen = match selection.and_then(|s| s.chosen_for(&key)) {
                Some(chosen_id) => alternatives
                    .iter()
                    .find(|l| l.reference.id() == chosen_id)
                    .copied(),
                None if alternatives.len() == 1 => Some(alternatives[0]),
                None => None,
            };

            match chosen {
                Some(alternative) => draw_reference(
                    catalog,
                    alternative,
                    alternative.quantity * multiplier,
                    selection,
                    depth,
                    path,
                    plan,
                ),
                None => plan.warnings.push(EngineWarning::UnresolvedGroup { group_key: key }),
            }
            continue;
        }

        draw_reference(catalog, line, line.quantity * multiplier, selection, depth, path, plan);
    }

    path.remove(item_id);
}

/// Draws from one included line: a material leaf becomes a planned draw,
/// a composed linked item recurses, a primitive linked item draws nothing
/// (it has no materials; its cost lives on the item record).
fn draw_reference(
    catalog: &Catalog,
    line: &crate::types::RecipeLine,
    effective_quantity: f64,
    selection: Option<&BundleSelection>,
    depth: usize,
    path: &mut HashSet<String>,
    plan: &mut ConsumptionPlan,
) {
    match &line.reference {
        RecipeRef::Material(material_id) => {
            let Some(material) = catalog.material(material_id) else {
                plan.warnings.push(EngineWarning::MissingMaterial {
                    line_id: line.id.clone(),
                    material_id: material_id.clone(),
                });
                return;
            };
            if !material.has_valid_purchase_quantity() {
                plan.warnings.push(EngineWarning::ZeroPurchaseQuantity {
                    material_id: material_id.clone(),
                });
            }
            plan.entries.push(PlannedDraw {
                material_id: material.id.clone(),
                material_name: material.name.clone(),
                quantity: effective_quantity,
                cost: material.unit_cost() * effective_quantity,
            });
        }

        RecipeRef::LinkedItem(linked_id) => {
            if catalog.item(linked_id).is_none() {
                plan.warnings.push(EngineWarning::MissingItem {
                    line_id: line.id.clone(),
                    item_id: linked_id.clone(),
                });
                return;
            }
            if catalog.lines_for(linked_id).is_empty() {
                // Primitive product: no materials behind it to draw.
                return;
            }
            draw_from_item(
                catalog,
                linked_id,
                effective_quantity,
                selection,
                depth + 1,
                path,
                plan,
            );
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

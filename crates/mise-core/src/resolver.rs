//! # Choice Flattening Resolver
//!
//! Recursively walks a recipe graph and surfaces every choice the buyer
//! must or may make as one flat list, regardless of nesting depth.
//!
//! ## Traversal Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each RecipeLine of the current item:                               │
//! │                                                                         │
//! │  is_optional?            → emit into `optionals`, tagged with the      │
//! │                            declaring item; do NOT recurse              │
//! │                                                                         │
//! │  selection_group set?    → one alternative of a mandatory exclusive    │
//! │                            group keyed `owner_id:group`; do NOT        │
//! │                            recurse into any alternative (the buyer's   │
//! │                            later choice decides which branch costs)    │
//! │                                                                         │
//! │  linked item, no groups  → transparent sub-bundle: recurse, merging    │
//! │  of its own?               its groups/optionals into the same result   │
//! │                                                                         │
//! │  otherwise               → mandatory inclusion (material leaf, or a    │
//! │                            linked item that declares its own groups);  │
//! │                            not part of the choice UI, stop here        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Groups are always leaves of the flattening: the resolver never expands a
//! linked item that declares an exclusive group of its own.
//!
//! Read-only; the only hard failure is an unknown root item.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineResult, EngineWarning};
use crate::types::{
    group_key, ChoiceGroup, ChoiceOption, FlattenedChoices, OptionalAddOn, RecipeLine, RecipeRef,
};
use crate::MAX_RECIPE_DEPTH;

/// Flattens every buyer-facing choice reachable from `root_item_id`.
///
/// ## Failure
/// * Unknown root item → [`EngineError::ItemNotFound`]. Everything inside
///   the tree degrades to warnings on the result instead.
pub fn flatten_choices(catalog: &Catalog, root_item_id: &str) -> EngineResult<FlattenedChoices> {
    if catalog.item(root_item_id).is_none() {
        return Err(EngineError::ItemNotFound(root_item_id.to_string()));
    }

    let mut result = FlattenedChoices::default();
    let mut path: HashSet<String> = HashSet::new();
    walk(catalog, root_item_id, 0, &mut path, &mut result);
    Ok(result)
}

/// Walks one item's recipe lines, merging discovered groups and optionals
/// into `result`. `path` holds the item ids on the current recursion path
/// for cycle rejection.
fn walk(
    catalog: &Catalog,
    item_id: &str,
    depth: usize,
    path: &mut HashSet<String>,
    result: &mut FlattenedChoices,
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

    let declaring_name = catalog
        .item(item_id)
        .map(|i| i.name.clone())
        .unwrap_or_default();

    for line in catalog.lines_for(item_id) {
        if line.is_optional {
            if let Some(option) = describe_line(catalog, line, result) {
                result.optionals.push(OptionalAddOn {
                    line_id: option.line_id,
                    reference: option.reference,
                    name: option.name,
                    quantity: option.quantity,
                    unit: option.unit,
                    declared_by_item_id: item_id.to_string(),
                    declared_by_item_name: declaring_name.clone(),
                });
            }
            continue;
        }

        if let Some(group) = &line.selection_group {
            if let Some(option) = describe_line(catalog, line, result) {
                push_group_option(result, item_id, group, option);
            }
            continue;
        }

        match &line.reference {
            // Mandatory material inclusion: not a choice, nothing to surface.
            RecipeRef::Material(_) => {}

            RecipeRef::LinkedItem(linked_id) => {
                let Some(_linked) = catalog.item(linked_id) else {
                    result.warnings.push(EngineWarning::MissingItem {
                        line_id: line.id.clone(),
                        item_id: linked_id.clone(),
                    });
                    continue;
                };

                // A linked item with exclusive groups of its own is a closed
                // sub-item: a mandatory inclusion, never expanded here.
                if catalog.item_declares_groups(linked_id) {
                    continue;
                }

                // Transparent sub-bundle: merge its choices into this level.
                walk(catalog, linked_id, depth + 1, path, result);
            }
        }
    }

    path.remove(item_id);
}

/// Resolves a line's display payload, emitting a warning (and returning
/// `None`) when the reference dangles.
fn describe_line(
    catalog: &Catalog,
    line: &RecipeLine,
    result: &mut FlattenedChoices,
) -> Option<ChoiceOption> {
    let name = match &line.reference {
        RecipeRef::Material(material_id) => match catalog.material(material_id) {
            Some(m) => m.name.clone(),
            None => {
                result.warnings.push(EngineWarning::MissingMaterial {
                    line_id: line.id.clone(),
                    material_id: material_id.clone(),
                });
                return None;
            }
        },
        RecipeRef::LinkedItem(item_id) => match catalog.item(item_id) {
            Some(i) => i.name.clone(),
            None => {
                result.warnings.push(EngineWarning::MissingItem {
                    line_id: line.id.clone(),
                    item_id: item_id.clone(),
                });
                return None;
            }
        },
    };

    Some(ChoiceOption {
        line_id: line.id.clone(),
        reference: line.reference.clone(),
        name,
        quantity: line.quantity,
        unit: line.unit.clone(),
    })
}

/// Appends an option to its flattened group, creating the group entry on
/// first sight. Discovery order is preserved for display.
fn push_group_option(
    result: &mut FlattenedChoices,
    owner_item_id: &str,
    selection_group: &str,
    option: ChoiceOption,
) {
    let key = group_key(owner_item_id, selection_group);

    if let Some(existing) = result.groups.iter_mut().find(|g| g.key == key) {
        existing.options.push(option);
        return;
    }

    result.groups.push(ChoiceGroup {
        key,
        display_name: selection_group.to_string(),
        owner_item_id: owner_item_id.to_string(),
        options: vec![option],
    });
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Catalog Snapshot
//!
//! An in-memory, read-only snapshot of the recipe graph that the three
//! recursive traversals run over.
//!
//! ## Why a Snapshot?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mise-db                         mise-core                              │
//! │                                                                         │
//! │  load_catalog(root) ──────────►  Catalog (HashMaps)                    │
//! │    (bounded BFS over              │                                     │
//! │     linked items)                 ├── flatten_choices   (read-only)    │
//! │                                   ├── calculate_cost    (read-only)    │
//! │                                   └── plan_consumption  (read-only)    │
//! │                                                                         │
//! │  One load per request; every traversal then runs synchronously with    │
//! │  no I/O, which keeps the core pure and the algorithms unit-testable    │
//! │  without a database.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshot is allowed to be partial: a dangling reference discovered
//! mid-walk is an [`crate::error::EngineWarning`], not a load failure.

use std::collections::HashMap;

use crate::types::{Material, RecipeLine, SellableItem};

/// In-memory recipe graph: materials, sellable items, and each item's
/// recipe lines, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    materials: HashMap<String, Material>,
    items: HashMap<String, SellableItem>,
    lines: HashMap<String, Vec<RecipeLine>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a material.
    pub fn insert_material(&mut self, material: Material) {
        self.materials.insert(material.id.clone(), material);
    }

    /// Adds or replaces a sellable item.
    pub fn insert_item(&mut self, item: SellableItem) {
        self.items.insert(item.id.clone(), item);
    }

    /// Appends a recipe line under its owning item, keeping lines in
    /// `sort_order` within each owner.
    pub fn insert_line(&mut self, line: RecipeLine) {
        let lines = self.lines.entry(line.owner_item_id.clone()).or_default();
        lines.push(line);
        lines.sort_by_key(|l| l.sort_order);
    }

    /// Looks up a material by id.
    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Looks up a sellable item by id.
    pub fn item(&self, id: &str) -> Option<&SellableItem> {
        self.items.get(id)
    }

    /// The recipe lines of an item, in sort order. Empty slice when the
    /// item has no recipe (a true primitive product).
    pub fn lines_for(&self, item_id: &str) -> &[RecipeLine] {
        self.lines.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether an item declares any mandatory exclusive group of its own.
    ///
    /// The choice-flattening resolver treats such an item as a closed
    /// sub-item: its groups are surfaced when IT is the root, never
    /// expanded through a parent.
    pub fn item_declares_groups(&self, item_id: &str) -> bool {
        self.lines_for(item_id)
            .iter()
            .any(|l| l.is_group_alternative())
    }

    /// Overwrites an item's cached unit cost in the snapshot, so a
    /// leaves-first propagation pass can reuse already-updated children.
    pub fn set_item_unit_cost(&mut self, item_id: &str, unit_cost: f64) {
        if let Some(item) = self.items.get_mut(item_id) {
            item.unit_cost = unit_cost;
        }
    }

    /// Iterates all items in the snapshot.
    pub fn items(&self) -> impl Iterator<Item = &SellableItem> {
        self.items.values()
    }

    /// Iterates all materials in the snapshot.
    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    /// Iterates every recipe line in the snapshot, across all owners.
    pub fn all_lines(&self) -> impl Iterator<Item = &RecipeLine> {
        self.lines.values().flatten()
    }

    /// Number of items in the snapshot.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

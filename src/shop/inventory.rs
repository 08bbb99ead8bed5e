//! Per-user inventory records and the on-disk inventory document.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::catalog::{CapacityKind, Catalog, Slot};
use crate::config::ShopConfig;
use crate::errors::ShopError;
use crate::privilege::Privileges;

pub const INVENTORY_VERSION: u32 = 1;

/// Held items, equip slots and capacities of one user.
///
/// Equipped items sit in their slot and are not counted against either capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryRecord {
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
    #[serde(default)]
    pub equipped: BTreeMap<Slot, String>,
    #[serde(default)]
    pub item_capacity: u32,
    #[serde(default)]
    pub pet_capacity: u32,
    #[serde(default)]
    pub unlimited_slots: bool,
}

impl InventoryRecord {
    pub fn new(settings: &ShopConfig, unlimited_slots: bool) -> Self {
        Self {
            items: BTreeMap::new(),
            equipped: BTreeMap::new(),
            item_capacity: settings.item_capacity,
            pet_capacity: settings.pet_capacity,
            unlimited_slots,
        }
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    pub fn capacity(&self, kind: CapacityKind) -> u32 {
        match kind {
            CapacityKind::Item => self.item_capacity,
            CapacityKind::Pet => self.pet_capacity,
        }
    }

    pub(crate) fn grow_capacity(&mut self, kind: CapacityKind, amount: u32) -> u32 {
        let cap = match kind {
            CapacityKind::Item => &mut self.item_capacity,
            CapacityKind::Pet => &mut self.pet_capacity,
        };
        *cap = cap.saturating_add(amount);
        *cap
    }

    /// Units held in `kind`'s pool. IDs the catalog no longer knows count as items.
    pub fn used(&self, kind: CapacityKind, catalog: &Catalog) -> u32 {
        self.items
            .iter()
            .filter(|(id, _)| {
                catalog
                    .get(id)
                    .map(|item| item.category.capacity_kind())
                    .unwrap_or(CapacityKind::Item)
                    == kind
            })
            .map(|(_, qty)| *qty)
            .fold(0u32, u32::saturating_add)
    }

    /// Fail unless `extra` more units of `kind` fit.
    pub fn ensure_room(
        &self,
        kind: CapacityKind,
        extra: u32,
        catalog: &Catalog,
    ) -> Result<(), ShopError> {
        if self.unlimited_slots || extra == 0 {
            return Ok(());
        }
        let used = self.used(kind, catalog);
        let capacity = self.capacity(kind);
        if used.saturating_add(extra) > capacity {
            return Err(ShopError::CapacityFull {
                kind,
                used,
                capacity,
            });
        }
        Ok(())
    }

    pub(crate) fn add(&mut self, item_id: &str, qty: u32) -> u32 {
        let held = self.items.entry(item_id.to_string()).or_insert(0);
        *held = held.saturating_add(qty);
        *held
    }

    /// Caller has checked that at least `qty` units are held.
    pub(crate) fn take(&mut self, item_id: &str, qty: u32) -> u32 {
        let remaining = self.count(item_id).saturating_sub(qty);
        if remaining == 0 {
            self.items.remove(item_id);
        } else {
            self.items.insert(item_id.to_string(), remaining);
        }
        remaining
    }
}

/// On-disk inventory document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub inventories: HashMap<String, InventoryRecord>,
}

impl InventoryDocument {
    /// Normalise every record once after load. Returns how many records changed.
    pub fn migrate(&mut self, privileges: &Privileges, settings: &ShopConfig) -> usize {
        let mut touched = 0;
        for (user_id, record) in self.inventories.iter_mut() {
            let mut changed = false;
            if record.item_capacity == 0 {
                record.item_capacity = settings.item_capacity;
                changed = true;
            }
            if record.pet_capacity == 0 {
                record.pet_capacity = settings.pet_capacity;
                changed = true;
            }
            let before = record.items.len();
            record.items.retain(|_, qty| *qty > 0);
            changed |= record.items.len() != before;
            if privileges.is_owner(user_id) && !record.unlimited_slots {
                record.unlimited_slots = true;
                changed = true;
            }
            if changed {
                touched += 1;
            }
        }
        self.version = INVENTORY_VERSION;
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_splits_pets_from_items() {
        let catalog = Catalog::builtin().unwrap();
        let mut record = InventoryRecord::new(&ShopConfig::default(), false);
        record.add("cookie", 3);
        record.add("pet_cat", 1);
        record.add("retired_item", 2);
        record.equipped.insert(Slot::Pet, "pet_dog".into());
        assert_eq!(record.used(CapacityKind::Item, &catalog), 5);
        assert_eq!(record.used(CapacityKind::Pet, &catalog), 1);
        assert!(record.ensure_room(CapacityKind::Pet, 1, &catalog).is_ok());
        assert_eq!(
            record.ensure_room(CapacityKind::Pet, 2, &catalog),
            Err(ShopError::CapacityFull {
                kind: CapacityKind::Pet,
                used: 1,
                capacity: 2
            })
        );
    }

    #[test]
    fn take_removes_empty_entries() {
        let mut record = InventoryRecord::new(&ShopConfig::default(), false);
        record.add("gem", 2);
        assert_eq!(record.take("gem", 1), 1);
        assert_eq!(record.take("gem", 1), 0);
        assert!(!record.items.contains_key("gem"));
    }

    #[test]
    fn migrate_fills_capacities_and_owner_slots() {
        let raw = r#"{"inventories": {"o": {"items": {"gem": 0, "cookie": 2}}, "u": {"item_capacity": 40, "pet_capacity": 3}}}"#;
        let mut doc: InventoryDocument = serde_json::from_str(raw).unwrap();
        let touched = doc.migrate(&Privileges::new(["o"]), &ShopConfig::default());
        assert_eq!(touched, 1);
        let owner = &doc.inventories["o"];
        assert!(owner.unlimited_slots);
        assert_eq!(owner.item_capacity, 30);
        assert_eq!(owner.count("gem"), 0);
        assert_eq!(owner.count("cookie"), 2);
        assert_eq!(doc.inventories["u"].item_capacity, 40);
    }
}

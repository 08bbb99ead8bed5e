//! Inventory and shop: the static [`Catalog`], per-user [`InventoryRecord`]s and the
//! [`Shop`] engine that moves items between them.

pub mod catalog;
pub mod engine;
pub mod inventory;

pub use catalog::{CapacityKind, Catalog, Category, ItemEffect, LootTable, LootTier, ShopItem, Slot};
pub use engine::{CapacityStatus, EquipOutcome, LootReport, Shop, UseOutcome};
pub use inventory::{InventoryDocument, InventoryRecord, INVENTORY_VERSION};

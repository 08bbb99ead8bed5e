//! The shop engine: purchases, capacity accounting, equip slots, item use and lootboxes.

use log::{debug, info};
use rand::Rng;

use super::catalog::{CapacityKind, Catalog, Category, ItemEffect, LootTier, ShopItem, Slot};
use super::inventory::{InventoryDocument, InventoryRecord};
use crate::config::ShopConfig;
use crate::economy::Ledger;
use crate::errors::{CatalogError, LedgerError, ShopError, StoreError};
use crate::privilege::Privileges;
use crate::storage::{self, JsonStore, INVENTORY_DOC};

/// Result of a successful equip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipOutcome {
    pub slot: Slot,
    pub item_id: String,
    /// Previously equipped item, now back in the bag.
    pub displaced: Option<String>,
}

/// Rewards drawn from one lootbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootReport {
    pub box_id: String,
    pub tier: LootTier,
    /// Coins for the caller to credit through the ledger.
    pub coins: u64,
    pub granted: Vec<String>,
    /// Drawn but not added because the bag was full.
    pub blocked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UseOutcome {
    Lootbox(LootReport),
    CapacityGranted {
        kind: CapacityKind,
        amount: u32,
        capacity: u32,
    },
    /// Effect for another engine to interpret (casino luck and the like).
    Effect(ItemEffect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityStatus {
    pub item_used: u32,
    pub item_capacity: u32,
    pub pet_used: u32,
    pub pet_capacity: u32,
    pub unlimited: bool,
}

/// Inventory engine over the item catalog.
#[derive(Debug)]
pub struct Shop {
    catalog: Catalog,
    doc: InventoryDocument,
    store: Option<JsonStore>,
    privileges: Privileges,
    settings: ShopConfig,
}

impl Shop {
    pub fn open(
        store: JsonStore,
        catalog: Catalog,
        privileges: Privileges,
        settings: ShopConfig,
    ) -> Result<Self, StoreError> {
        let mut doc: InventoryDocument = store.load(INVENTORY_DOC)?;
        let touched = doc.migrate(&privileges, &settings);
        info!(
            "shop: loaded {} inventories, {} catalog items",
            doc.inventories.len(),
            catalog.len()
        );
        let shop = Self {
            catalog,
            doc,
            store: Some(store),
            privileges,
            settings,
        };
        if touched > 0 {
            shop.persist();
        }
        Ok(shop)
    }

    pub fn in_memory(catalog: Catalog, privileges: Privileges, settings: ShopConfig) -> Self {
        Self {
            catalog,
            doc: InventoryDocument::default(),
            store: None,
            privileges,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn persist(&self) {
        storage::persist(self.store.as_ref(), INVENTORY_DOC, &self.doc);
    }

    fn record_mut(&mut self, user_id: &str) -> &mut InventoryRecord {
        let privileges = &self.privileges;
        let settings = &self.settings;
        self.doc
            .inventories
            .entry(user_id.to_string())
            .or_insert_with(|| InventoryRecord::new(settings, privileges.is_owner(user_id)))
    }

    fn ensure_room(
        &mut self,
        user_id: &str,
        kind: CapacityKind,
        qty: u32,
    ) -> Result<(), ShopError> {
        self.record_mut(user_id);
        match self.doc.inventories.get(user_id) {
            Some(record) => record.ensure_room(kind, qty, &self.catalog),
            None => Ok(()),
        }
    }

    fn item(&self, item_id: &str) -> Result<&ShopItem, ShopError> {
        self.catalog
            .find(item_id)
            .ok_or_else(|| ShopError::UnknownItem(item_id.to_string()))
    }

    /// Snapshot of a user's inventory, created with defaults on first access.
    pub fn inventory(&mut self, user_id: &str) -> InventoryRecord {
        self.record_mut(user_id).clone()
    }

    /// Buy one unit. Funds and capacity are both checked before the debit.
    pub fn purchase(
        &mut self,
        ledger: &mut Ledger,
        user_id: &str,
        item_id: &str,
    ) -> Result<ShopItem, ShopError> {
        let item = self.item(item_id)?.clone();
        self.ensure_room(user_id, item.category.capacity_kind(), 1)?;
        let funds = ledger.balance(user_id);
        if !funds.covers(item.price) {
            return Err(ShopError::Ledger(LedgerError::InsufficientFunds {
                needed: item.price,
                available: funds.amount().unwrap_or(0),
            }));
        }
        ledger.debit(user_id, item.price, false)?;
        self.record_mut(user_id).add(&item.id, 1);
        self.persist();
        info!("shop: {} bought {} for {}", user_id, item.id, item.price);
        Ok(item)
    }

    /// Add units to a user's bag, refusing without mutation when they would not fit.
    pub fn add_item(&mut self, user_id: &str, item_id: &str, qty: u32) -> Result<u32, ShopError> {
        if qty == 0 {
            return Err(ShopError::InvalidQuantity);
        }
        let item = self.item(item_id)?;
        let (id, kind) = (item.id.clone(), item.category.capacity_kind());
        self.ensure_room(user_id, kind, qty)?;
        let held = self.record_mut(user_id).add(&id, qty);
        self.persist();
        Ok(held)
    }

    /// Remove units, refusing without mutation when fewer are held.
    pub fn remove_item(
        &mut self,
        user_id: &str,
        item_id: &str,
        qty: u32,
    ) -> Result<u32, ShopError> {
        if qty == 0 {
            return Err(ShopError::InvalidQuantity);
        }
        let id = self.item(item_id)?.id.clone();
        let record = self.record_mut(user_id);
        check_held(record, &id, qty)?;
        let remaining = record.take(&id, qty);
        self.persist();
        Ok(remaining)
    }

    pub fn has_item(&self, user_id: &str, item_id: &str) -> bool {
        self.item_count(user_id, item_id) > 0
    }

    pub fn item_count(&self, user_id: &str, item_id: &str) -> u32 {
        self.doc
            .inventories
            .get(user_id)
            .map(|r| r.count(item_id))
            .unwrap_or(0)
    }

    /// Move one unit into its slot, returning any displaced item to the bag.
    ///
    /// All checks run before anything changes, so a refused equip leaves the inventory
    /// exactly as it was.
    pub fn equip(&mut self, user_id: &str, item_id: &str) -> Result<EquipOutcome, ShopError> {
        let item = self.item(item_id)?;
        let slot = item
            .category
            .slot()
            .ok_or_else(|| ShopError::NotEquippable(item.id.clone()))?;
        let (id, kind) = (item.id.clone(), item.category.capacity_kind());

        let Self { doc, catalog, .. } = &mut *self;
        let record = doc
            .inventories
            .get_mut(user_id)
            .ok_or_else(|| ShopError::NotOwned(id.clone()))?;
        if record.equipped.get(&slot) == Some(&id) {
            return Err(ShopError::AlreadyEquipped(id));
        }
        check_held(record, &id, 1)?;
        let displaced = record.equipped.get(&slot).cloned();
        if displaced.is_some() && !record.unlimited_slots {
            // One unit leaves the bag and the displaced one comes back into the same pool.
            let used = record.used(kind, catalog);
            let capacity = record.capacity(kind);
            if used > capacity {
                return Err(ShopError::CapacityFull {
                    kind,
                    used,
                    capacity,
                });
            }
        }

        record.take(&id, 1);
        if let Some(old) = &displaced {
            record.add(old, 1);
        }
        record.equipped.insert(slot, id.clone());
        self.persist();
        debug!("shop: {} equipped {} ({})", user_id, id, slot);
        Ok(EquipOutcome {
            slot,
            item_id: id,
            displaced,
        })
    }

    /// Return the equipped item in `slot` to the bag.
    pub fn unequip(&mut self, user_id: &str, slot: Slot) -> Result<String, ShopError> {
        let Self { doc, catalog, .. } = &mut *self;
        let record = doc
            .inventories
            .get_mut(user_id)
            .ok_or(ShopError::NothingEquipped(slot))?;
        let id = record
            .equipped
            .get(&slot)
            .cloned()
            .ok_or(ShopError::NothingEquipped(slot))?;
        let kind = catalog
            .get(&id)
            .map(|i| i.category.capacity_kind())
            .unwrap_or(CapacityKind::Item);
        record.ensure_room(kind, 1, catalog)?;
        record.equipped.remove(&slot);
        record.add(&id, 1);
        self.persist();
        Ok(id)
    }

    pub fn equipped(&self, user_id: &str, slot: Slot) -> Option<&str> {
        self.doc
            .inventories
            .get(user_id)
            .and_then(|r| r.equipped.get(&slot))
            .map(String::as_str)
    }

    /// Daily bonus percentage from the equipped ring, 0 when none.
    pub fn equipped_ring_bonus(&self, user_id: &str) -> f64 {
        self.equipped(user_id, Slot::Ring)
            .and_then(|id| self.catalog.get(id))
            .map(|item| match item.effect {
                ItemEffect::RingBonus { pct } => pct,
                _ => 0.0,
            })
            .unwrap_or(0.0)
    }

    /// XP bonus percentage from the equipped pet, 0 when none.
    pub fn equipped_xp_boost(&self, user_id: &str) -> f64 {
        match self
            .equipped(user_id, Slot::Pet)
            .and_then(|id| self.catalog.get(id))
            .map(|item| &item.effect)
        {
            Some(ItemEffect::XpBoost { pct }) => *pct,
            _ => 0.0,
        }
    }

    /// Consume one unit and resolve or report its effect.
    ///
    /// Lootboxes are opened in the same call and consume exactly one box. Capacity
    /// upgrades are applied here. Every other effect is returned for the caller.
    pub fn use_item(
        &mut self,
        user_id: &str,
        item_id: &str,
        rng: &mut impl Rng,
    ) -> Result<UseOutcome, ShopError> {
        let item = self.item(item_id)?.clone();
        if self.item_count(user_id, &item.id) == 0 {
            return Err(ShopError::NotOwned(item.id));
        }
        if !item.usable {
            return Err(ShopError::NotUsable(item.id));
        }
        match item.effect {
            ItemEffect::OpenLootbox(_) => self
                .open_lootbox(user_id, &item.id, rng)
                .map(UseOutcome::Lootbox),
            ItemEffect::CapacityGrant { kind, amount } => {
                let record = self.record_mut(user_id);
                record.take(&item.id, 1);
                let capacity = record.grow_capacity(kind, amount);
                self.persist();
                info!(
                    "shop: {} used {} ({} capacity now {})",
                    user_id, item.id, kind, capacity
                );
                Ok(UseOutcome::CapacityGranted {
                    kind,
                    amount,
                    capacity,
                })
            }
            effect => {
                self.record_mut(user_id).take(&item.id, 1);
                self.persist();
                Ok(UseOutcome::Effect(effect))
            }
        }
    }

    /// Consume one box and draw its rewards. Each drawn item is added independently; the
    /// ones that do not fit are reported as blocked.
    pub fn open_lootbox(
        &mut self,
        user_id: &str,
        box_id: &str,
        rng: &mut impl Rng,
    ) -> Result<LootReport, ShopError> {
        let item = self.item(box_id)?;
        let tier = match (item.category, &item.effect) {
            (Category::Lootbox, ItemEffect::OpenLootbox(tier)) => *tier,
            _ => return Err(ShopError::NotLootbox(item.id.clone())),
        };
        let id = item.id.clone();
        let table = self
            .catalog
            .loot_table(tier)
            .cloned()
            .ok_or(CatalogError::MissingLootTable(tier))?;
        let record = self.record_mut(user_id);
        check_held(record, &id, 1)?;
        record.take(&id, 1);

        let coins = rng.gen_range(table.coins.clone());
        let draws = rng.gen_range(table.items.clone());
        let mut granted = Vec::new();
        let mut blocked = Vec::new();
        for _ in 0..draws {
            let reward = &table.pool[rng.gen_range(0..table.pool.len())];
            let kind = self
                .catalog
                .get(reward)
                .map(|i| i.category.capacity_kind())
                .unwrap_or(CapacityKind::Item);
            let Self { doc, catalog, .. } = &mut *self;
            match doc.inventories.get_mut(user_id) {
                Some(record) if record.ensure_room(kind, 1, catalog).is_ok() => {
                    record.add(reward, 1);
                    granted.push(reward.clone());
                }
                _ => blocked.push(reward.clone()),
            }
        }
        self.persist();
        info!(
            "shop: {} opened {} -> {} coins, {} granted, {} blocked",
            user_id,
            id,
            coins,
            granted.len(),
            blocked.len()
        );
        Ok(LootReport {
            box_id: id,
            tier,
            coins,
            granted,
            blocked,
        })
    }

    /// Hand tradeable items to another user. The receiver's capacity is checked first.
    pub fn give_item(
        &mut self,
        from: &str,
        to: &str,
        item_id: &str,
        qty: u32,
    ) -> Result<(), ShopError> {
        if from == to {
            return Err(ShopError::SelfGift);
        }
        if qty == 0 {
            return Err(ShopError::InvalidQuantity);
        }
        let item = self.item(item_id)?;
        if !item.tradeable {
            return Err(ShopError::NotTradeable(item.id.clone()));
        }
        let (id, kind) = (item.id.clone(), item.category.capacity_kind());
        check_held(self.record_mut(from), &id, qty)?;
        self.ensure_room(to, kind, qty)?;
        self.record_mut(from).take(&id, qty);
        self.record_mut(to).add(&id, qty);
        self.persist();
        info!("shop: {} gave {}x {} to {}", from, qty, id, to);
        Ok(())
    }

    pub fn capacity_status(&mut self, user_id: &str) -> CapacityStatus {
        let record = self.record_mut(user_id).clone();
        CapacityStatus {
            item_used: record.used(CapacityKind::Item, &self.catalog),
            item_capacity: record.item_capacity,
            pet_used: record.used(CapacityKind::Pet, &self.catalog),
            pet_capacity: record.pet_capacity,
            unlimited: record.unlimited_slots,
        }
    }

    /// Catalog value of everything held or equipped.
    pub fn inventory_value(&self, user_id: &str) -> u64 {
        let Some(record) = self.doc.inventories.get(user_id) else {
            return 0;
        };
        let price = |id: &str| self.catalog.get(id).map(|i| i.price).unwrap_or(0);
        let held = record
            .items
            .iter()
            .map(|(id, qty)| price(id).saturating_mul(u64::from(*qty)));
        let worn = record.equipped.values().map(|id| price(id));
        held.chain(worn).fold(0u64, u64::saturating_add)
    }

    /// Owner command: toggle unlimited slots for a user.
    pub fn set_unlimited_slots(&mut self, user_id: &str, enabled: bool) {
        self.record_mut(user_id).unlimited_slots = enabled;
        self.persist();
        info!(target: "security", "shop: unlimited slots for {} set to {}", user_id, enabled);
    }
}

fn check_held(record: &InventoryRecord, item_id: &str, qty: u32) -> Result<(), ShopError> {
    match record.count(item_id) {
        0 => Err(ShopError::NotOwned(item_id.to_string())),
        held if held < qty => Err(ShopError::NotEnough {
            item: item_id.to_string(),
            held,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shop(item_capacity: u32) -> Shop {
        let settings = ShopConfig {
            item_capacity,
            pet_capacity: 1,
        };
        Shop::in_memory(
            Catalog::builtin().unwrap(),
            Privileges::new(["owner"]),
            settings,
        )
    }

    #[test]
    fn purchase_checks_funds_then_debits() {
        let mut shop = shop(30);
        let mut ledger = Ledger::in_memory(Privileges::default(), EconomyConfig::default());
        let err = shop.purchase(&mut ledger, "u", "cookie").unwrap_err();
        assert!(matches!(
            err,
            ShopError::Ledger(LedgerError::InsufficientFunds { needed: 5000, .. })
        ));
        ledger.credit("u", 5000, false);
        shop.purchase(&mut ledger, "u", "cookie").unwrap();
        assert_eq!(shop.item_count("u", "cookie"), 1);
        assert_eq!(ledger.stats("u").balance, 1000);
    }

    #[test]
    fn add_and_remove_refuse_without_mutation() {
        let mut shop = shop(2);
        shop.add_item("u", "gem", 2).unwrap();
        assert!(matches!(
            shop.add_item("u", "gem", 1),
            Err(ShopError::CapacityFull { used: 2, capacity: 2, .. })
        ));
        assert_eq!(shop.item_count("u", "gem"), 2);
        assert_eq!(
            shop.remove_item("u", "gem", 3),
            Err(ShopError::NotEnough {
                item: "gem".into(),
                held: 2
            })
        );
        assert_eq!(shop.remove_item("u", "gem", 2), Ok(0));
        assert!(!shop.has_item("u", "gem"));
    }

    #[test]
    fn equip_swaps_and_rejects_same_item() {
        let mut shop = shop(3);
        shop.add_item("u", "ring_love", 1).unwrap();
        shop.add_item("u", "ring_destiny", 1).unwrap();
        shop.equip("u", "ring_love").unwrap();
        assert_eq!(shop.equipped_ring_bonus("u"), 5.0);
        let swap = shop.equip("u", "ring_destiny").unwrap();
        assert_eq!(swap.displaced.as_deref(), Some("ring_love"));
        assert_eq!(shop.item_count("u", "ring_love"), 1);
        assert_eq!(shop.equipped_ring_bonus("u"), 50.0);
        shop.add_item("u", "ring_destiny", 1).unwrap();
        assert_eq!(
            shop.equip("u", "ring_destiny"),
            Err(ShopError::AlreadyEquipped("ring_destiny".into()))
        );
        assert_eq!(shop.equip("u", "gem"), Err(ShopError::NotEquippable("gem".into())));
    }

    #[test]
    fn unequip_needs_room() {
        let mut shop = shop(1);
        shop.add_item("u", "ring_love", 1).unwrap();
        shop.equip("u", "ring_love").unwrap();
        shop.add_item("u", "gem", 1).unwrap();
        assert!(matches!(
            shop.unequip("u", Slot::Ring),
            Err(ShopError::CapacityFull { .. })
        ));
        assert_eq!(shop.equipped("u", Slot::Ring), Some("ring_love"));
        shop.remove_item("u", "gem", 1).unwrap();
        assert_eq!(shop.unequip("u", Slot::Ring).unwrap(), "ring_love");
        assert_eq!(shop.equipped("u", Slot::Ring), None);
    }

    #[test]
    fn using_a_lootbox_consumes_exactly_one() {
        let mut shop = shop(30);
        let mut rng = StdRng::seed_from_u64(3);
        shop.add_item("u", "box_common", 2).unwrap();
        let outcome = shop.use_item("u", "box_common", &mut rng).unwrap();
        let UseOutcome::Lootbox(report) = outcome else {
            panic!("expected lootbox outcome");
        };
        assert_eq!(shop.item_count("u", "box_common"), 1);
        assert!((500..=2000).contains(&report.coins));
        assert!((1..=3).contains(&(report.granted.len() + report.blocked.len())));
        for id in &report.granted {
            assert!(["cookie", "pet_cat", "pet_dog", "gem"].contains(&id.as_str()));
        }
    }

    #[test]
    fn capacity_upgrade_is_applied() {
        let mut shop = shop(30);
        let mut rng = StdRng::seed_from_u64(1);
        shop.add_item("u", "pet_upgrade", 1).unwrap();
        let out = shop.use_item("u", "pet_upgrade", &mut rng).unwrap();
        assert_eq!(
            out,
            UseOutcome::CapacityGranted {
                kind: CapacityKind::Pet,
                amount: 1,
                capacity: 2
            }
        );
        assert_eq!(shop.capacity_status("u").pet_capacity, 2);
        assert!(!shop.has_item("u", "pet_upgrade"));
    }

    #[test]
    fn owners_have_unlimited_slots() {
        let mut shop = shop(1);
        shop.add_item("owner", "gem", 50).unwrap();
        assert!(shop.capacity_status("owner").unlimited);
    }

    #[test]
    fn inventory_value_counts_equipped() {
        let mut shop = shop(30);
        shop.add_item("u", "gem", 2).unwrap();
        shop.add_item("u", "pet_cat", 1).unwrap();
        shop.equip("u", "pet_cat").unwrap();
        assert_eq!(shop.inventory_value("u"), 2 * 40_000 + 30_000);
    }
}

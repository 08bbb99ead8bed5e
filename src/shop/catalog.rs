//! Static item catalog and loot tables.
//!
//! The catalog is built once at startup and validated as a whole; any inconsistency is a
//! [`CatalogError`] and the bot refuses to start.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::errors::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ring,
    Lootbox,
    Consumable,
    Collectible,
    Pet,
    Upgrade,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Ring,
        Category::Lootbox,
        Category::Consumable,
        Category::Collectible,
        Category::Pet,
        Category::Upgrade,
    ];

    /// Which capacity pool a held unit of this category occupies.
    pub fn capacity_kind(self) -> CapacityKind {
        match self {
            Category::Pet => CapacityKind::Pet,
            _ => CapacityKind::Item,
        }
    }

    /// Equip slot for equippable categories.
    pub fn slot(self) -> Option<Slot> {
        match self {
            Category::Ring => Some(Slot::Ring),
            Category::Pet => Some(Slot::Pet),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ring" | "rings" => Some(Category::Ring),
            "lootbox" | "lootboxes" | "box" | "boxes" => Some(Category::Lootbox),
            "consumable" | "consumables" | "luck" => Some(Category::Consumable),
            "collectible" | "collectibles" => Some(Category::Collectible),
            "pet" | "pets" => Some(Category::Pet),
            "upgrade" | "upgrades" => Some(Category::Upgrade),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Ring => "ring",
            Category::Lootbox => "lootbox",
            Category::Consumable => "consumable",
            Category::Collectible => "collectible",
            Category::Pet => "pet",
            Category::Upgrade => "upgrade",
        })
    }
}

/// Equip slot; at most one item per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Ring,
    Pet,
}

impl Slot {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ring" => Some(Slot::Ring),
            "pet" => Some(Slot::Pet),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::Ring => "ring",
            Slot::Pet => "pet",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityKind {
    Item,
    Pet,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapacityKind::Item => "item",
            CapacityKind::Pet => "pet",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LootTier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl fmt::Display for LootTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LootTier::Common => "common",
            LootTier::Rare => "rare",
            LootTier::Epic => "epic",
            LootTier::Legendary => "legendary",
        })
    }
}

/// What an item does. Percentages are whole percent points.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEffect {
    /// Daily payout bonus while equipped.
    RingBonus { pct: f64 },
    /// Permanent capacity increase, applied by the shop when used.
    CapacityGrant { kind: CapacityKind, amount: u32 },
    /// One-shot casino luck, reported to the caller.
    WinRateBoost { pct: f64 },
    /// XP bonus while equipped.
    XpBoost { pct: f64 },
    OpenLootbox(LootTier),
    Descriptive(String),
}

impl ItemEffect {
    pub fn describe(&self) -> String {
        match self {
            ItemEffect::RingBonus { pct } => format!("+{}% coins when claiming daily", pct),
            ItemEffect::CapacityGrant { kind, amount } => {
                format!("+{} {} slot(s), permanently", amount, kind)
            }
            ItemEffect::WinRateBoost { pct } => format!("+{}% casino win rate (1 time)", pct),
            ItemEffect::XpBoost { pct } => format!("+{}% XP daily", pct),
            ItemEffect::OpenLootbox(tier) => format!("open to receive {} items", tier),
            ItemEffect::Descriptive(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub price: u64,
    pub category: Category,
    pub usable: bool,
    pub tradeable: bool,
    pub effect: ItemEffect,
}

impl ShopItem {
    pub fn new(
        id: &str,
        emoji: &str,
        name: &str,
        description: &str,
        price: u64,
        category: Category,
        effect: ItemEffect,
    ) -> Self {
        let usable = matches!(
            category,
            Category::Lootbox | Category::Consumable | Category::Upgrade
        );
        Self {
            id: id.to_string(),
            name: name.to_string(),
            emoji: emoji.to_string(),
            description: description.to_string(),
            price,
            category,
            usable,
            tradeable: category != Category::Upgrade,
            effect,
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

/// Reward rules for one lootbox tier. Pool draws are uniform and independent.
#[derive(Debug, Clone, PartialEq)]
pub struct LootTable {
    pub tier: LootTier,
    pub coins: RangeInclusive<u64>,
    pub items: RangeInclusive<u32>,
    pub pool: Vec<String>,
}

impl LootTable {
    pub fn new(tier: LootTier, coins: RangeInclusive<u64>, items: RangeInclusive<u32>, pool: &[&str]) -> Self {
        Self {
            tier,
            coins,
            items,
            pool: pool.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Immutable catalog injected into the shop engine.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<ShopItem>,
    index: HashMap<String, usize>,
    loot: Vec<LootTable>,
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(items: Vec<ShopItem>, loot: Vec<LootTable>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateItem(item.id.clone()));
            }
            if item.price == 0 {
                return Err(CatalogError::ZeroPrice(item.id.clone()));
            }
            if item.category == Category::Upgrade
                && !matches!(item.effect, ItemEffect::CapacityGrant { amount, .. } if amount > 0)
            {
                return Err(CatalogError::MissingCapacityGrant(item.id.clone()));
            }
        }
        for table in &loot {
            if table.pool.is_empty()
                || table.coins.is_empty()
                || table.items.is_empty()
                || *table.items.start() == 0
            {
                return Err(CatalogError::EmptyLootTable(table.tier));
            }
            if let Some(unknown) = table.pool.iter().find(|id| !index.contains_key(*id)) {
                return Err(CatalogError::UnknownPoolItem {
                    tier: table.tier,
                    item: unknown.clone(),
                });
            }
        }
        for item in &items {
            if let ItemEffect::OpenLootbox(tier) = item.effect {
                if !loot.iter().any(|t| t.tier == tier) {
                    return Err(CatalogError::MissingLootTable(tier));
                }
            }
        }
        Ok(Self { items, index, loot })
    }

    /// The stock catalog: rings, lootboxes, luck consumables, collectibles, pets and
    /// capacity upgrades.
    #[rustfmt::skip]
    pub fn builtin() -> Result<Self, CatalogError> {
        use Category::*;
        let ring = |pct| ItemEffect::RingBonus { pct };
        let luck = |pct| ItemEffect::WinRateBoost { pct };
        let xp = |pct| ItemEffect::XpBoost { pct };
        let collectible = || ItemEffect::Descriptive("collectible item".into());

        let items = vec![
            ShopItem::new("ring_love", "💍", "Love Ring", "ring symbolizing true love", 50_000, Ring, ring(5.0)),
            ShopItem::new("ring_couple", "💕", "Couple Ring", "ring for loving couples", 120_000, Ring, ring(10.0)),
            ShopItem::new("ring_mandarin", "🦆", "Mandarin Duck Ring", "ring of inseparable mandarin ducks", 250_000, Ring, ring(15.0)),
            ShopItem::new("ring_eternal", "💎", "Eternal Ring", "diamond ring symbolizing eternal love", 500_000, Ring, ring(25.0)),
            ShopItem::new("ring_destiny", "✨", "Destiny Ring", "ring of those bound by destiny", 1_000_000, Ring, ring(50.0)),
            ShopItem::new("box_common", "📦", "Common Box", "basic lootbox containing random items", 8_000, Lootbox, ItemEffect::OpenLootbox(LootTier::Common)),
            ShopItem::new("box_rare", "🎁", "Rare Box", "rare lootbox containing valuable items", 25_000, Lootbox, ItemEffect::OpenLootbox(LootTier::Rare)),
            ShopItem::new("box_epic", "🎀", "Epic Box", "epic lootbox with big rewards", 60_000, Lootbox, ItemEffect::OpenLootbox(LootTier::Epic)),
            ShopItem::new("box_legendary", "🎊", "Legendary Box", "legendary lootbox with priceless treasures", 100_000, Lootbox, ItemEffect::OpenLootbox(LootTier::Legendary)),
            ShopItem::new("cookie", "🍪", "Lucky Cookie", "cookie bringing luck in casino", 5_000, Consumable, luck(10.0)),
            ShopItem::new("clover", "🍀", "Four Leaf Clover", "rare four leaf clover bringing fortune", 12_000, Consumable, luck(20.0)),
            ShopItem::new("horseshoe", "🧲", "Lucky Horseshoe", "ancient horseshoe bringing wealth", 25_000, Consumable, luck(30.0)),
            ShopItem::new("gem", "💠", "Precious Gem", "rare precious gem of high value", 40_000, Collectible, collectible()),
            ShopItem::new("trophy", "🏆", "Gold Trophy", "gold trophy for champions", 80_000, Collectible, collectible()),
            ShopItem::new("crown", "👑", "Royal Crown", "crown of royalty", 150_000, Collectible, collectible()),
            ShopItem::new("pet_cat", "🐱", "Pet Cat", "cute and loyal cat", 30_000, Pet, xp(5.0)),
            ShopItem::new("pet_dog", "🐶", "Pet Dog", "smart and brave dog", 30_000, Pet, xp(5.0)),
            ShopItem::new("pet_dragon", "🐉", "Divine Dragon", "legendary divine dragon bringing power", 120_000, Pet, xp(15.0)),
            ShopItem::new("pet_phoenix", "🦅", "Phoenix", "immortal phoenix with rebirth power", 250_000, Pet, xp(25.0)),
            ShopItem::new("bag_upgrade", "🎒", "Bigger Bag", "adds ten item slots to your bag", 15_000, Upgrade, ItemEffect::CapacityGrant { kind: CapacityKind::Item, amount: 10 }),
            ShopItem::new("pet_upgrade", "🏠", "Pet House", "room for one more pet", 40_000, Upgrade, ItemEffect::CapacityGrant { kind: CapacityKind::Pet, amount: 1 }),
        ];

        let loot = vec![
            LootTable::new(LootTier::Common, 500..=2_000, 1..=3, &["cookie", "pet_cat", "pet_dog", "gem"]),
            LootTable::new(LootTier::Rare, 2_000..=5_000, 2..=4, &["cookie", "clover", "ring_love", "ring_couple", "gem", "trophy"]),
            LootTable::new(LootTier::Epic, 5_000..=15_000, 3..=5, &["clover", "horseshoe", "ring_couple", "ring_mandarin", "ring_eternal", "trophy", "pet_dragon"]),
            LootTable::new(LootTier::Legendary, 15_000..=50_000, 4..=6, &["horseshoe", "ring_eternal", "ring_destiny", "trophy", "crown", "pet_dragon", "pet_phoenix"]),
        ];

        Catalog::new(items, loot)
    }

    pub fn get(&self, id: &str) -> Option<&ShopItem> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Like [`Catalog::get`] but case-insensitive on the ID.
    pub fn find(&self, id: &str) -> Option<&ShopItem> {
        self.get(id)
            .or_else(|| self.get(&id.trim().to_ascii_lowercase()))
    }

    pub fn items_in(&self, category: Category) -> impl Iterator<Item = &ShopItem> {
        self.items.iter().filter(move |i| i.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShopItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn loot_table(&self, tier: LootTier) -> Option<&LootTable> {
        self.loot.iter().find(|t| t.tier == tier)
    }
}

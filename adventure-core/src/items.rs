//! Consumable item catalog.
//!
//! Contains the potions and elixirs entities can carry, the catalog each kind
//! knows how to use, and the stock each kind starts with.

use crate::world::{EntityKind, Inventory, Role, Stat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What using an item does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restore health, clamped to max health.
    Heal(i32),
    /// Restore mana, clamped to max mana.
    RestoreMana(i32),
    /// Raise a stat until the buff expires.
    Buff(Stat, i32),
    /// Damage an opposing combatant.
    Damage(i32),
}

impl ItemEffect {
    /// Short effect code (`heal`, `mana`, `buff_strength`, ...).
    pub fn code(&self) -> String {
        match self {
            ItemEffect::Heal(_) => "heal".to_string(),
            ItemEffect::RestoreMana(_) => "mana".to_string(),
            ItemEffect::Buff(stat, _) => format!("buff_{}", stat.name().to_lowercase()),
            ItemEffect::Damage(_) => "damage".to_string(),
        }
    }

    /// Whether the item is aimed at the opposing party.
    pub fn targets_foes(&self) -> bool {
        matches!(self, ItemEffect::Damage(_))
    }

    pub fn magnitude(&self) -> i32 {
        match self {
            ItemEffect::Heal(v)
            | ItemEffect::RestoreMana(v)
            | ItemEffect::Buff(_, v)
            | ItemEffect::Damage(v) => *v,
        }
    }
}

impl fmt::Display for ItemEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Immutable item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub effect: ItemEffect,
    pub description: String,
    pub use_text: String,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        effect: ItemEffect,
        description: impl Into<String>,
        use_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            effect,
            description: description.into(),
            use_text: use_text.into(),
        }
    }
}

pub const HEALTH_POTION: &str = "Health Potion";
pub const MANA_POTION: &str = "Mana Potion";
pub const STRENGTH_ELIXIR: &str = "Strength Elixir";
pub const AGILITY_ELIXIR: &str = "Agility Elixir";

lazy_static::lazy_static! {
    /// Items usable by player-side kinds.
    pub static ref COMMON_ITEMS: Vec<Item> = vec![
        Item::new(
            HEALTH_POTION,
            ItemEffect::Heal(50),
            "Restores 50 health points",
            "You drink the potion and feel refreshed",
        ),
        Item::new(
            MANA_POTION,
            ItemEffect::RestoreMana(30),
            "Restores 30 mana points",
            "You drink the potion and feel restored",
        ),
        Item::new(
            STRENGTH_ELIXIR,
            ItemEffect::Buff(Stat::Strength, 10),
            "Temporarily increases strength by 10",
            "You drink the elixir and feel stronger!",
        ),
        Item::new(
            AGILITY_ELIXIR,
            ItemEffect::Buff(Stat::Agility, 10),
            "Temporarily increases agility by 10",
            "You drink the elixir and feel faster!",
        ),
    ];

    /// Items usable by bosses.
    pub static ref BOSS_ITEMS: Vec<Item> = vec![
        Item::new(
            MANA_POTION,
            ItemEffect::RestoreMana(20),
            "Restores 20 mana points",
            "drinks a potion and its eyes flare with power",
        ),
    ];
}

/// Look up a player-side catalog item by name (case-insensitive).
pub fn find_item(name: &str) -> Option<Item> {
    COMMON_ITEMS
        .iter()
        .find(|i| i.name.eq_ignore_ascii_case(name))
        .cloned()
}

/// The catalog of items a kind knows how to use.
pub fn known_items_for(kind: EntityKind) -> Vec<Item> {
    match kind.role() {
        Role::Player | Role::Npc => COMMON_ITEMS.clone(),
        Role::Boss => BOSS_ITEMS.clone(),
        Role::Enemy => Vec::new(),
    }
}

/// Starting stock for a kind; `None` for kinds that carry nothing.
pub fn starting_inventory(kind: EntityKind) -> Option<Inventory> {
    let stock: &[(&str, u32)] = match kind {
        EntityKind::Warrior | EntityKind::Fighter => &[(HEALTH_POTION, 3), (STRENGTH_ELIXIR, 1)],
        EntityKind::Mage | EntityKind::Healer => &[(HEALTH_POTION, 3), (MANA_POTION, 2)],
        EntityKind::Archer => &[(HEALTH_POTION, 3), (AGILITY_ELIXIR, 2)],
        EntityKind::Rogue => &[(HEALTH_POTION, 3), (AGILITY_ELIXIR, 1)],
        EntityKind::Dragon | EntityKind::Troll | EntityKind::Giant => &[(MANA_POTION, 3)],
        EntityKind::Ogre | EntityKind::Goblin | EntityKind::Orc => return None,
    };

    let mut inventory = Inventory::new();
    for (name, count) in stock {
        // Starting stock never exceeds the slot limit.
        let _ = inventory.add_item(name, *count);
    }
    Some(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_codes() {
        assert_eq!(find_item("health potion").unwrap().effect.code(), "heal");
        assert_eq!(find_item(MANA_POTION).unwrap().effect.code(), "mana");
        assert_eq!(
            find_item(STRENGTH_ELIXIR).unwrap().effect.code(),
            "buff_strength"
        );
        assert_eq!(
            find_item(AGILITY_ELIXIR).unwrap().effect.code(),
            "buff_agility"
        );
    }

    #[test]
    fn test_starting_stock() {
        let mage = starting_inventory(EntityKind::Mage).unwrap();
        assert_eq!(mage.count(HEALTH_POTION), 3);
        assert_eq!(mage.count(MANA_POTION), 2);

        let archer = starting_inventory(EntityKind::Archer).unwrap();
        assert_eq!(archer.count(AGILITY_ELIXIR), 2);

        let rogue = starting_inventory(EntityKind::Rogue).unwrap();
        assert_eq!(rogue.count(AGILITY_ELIXIR), 1);

        let troll = starting_inventory(EntityKind::Troll).unwrap();
        assert_eq!(troll.count(MANA_POTION), 3);
        assert_eq!(troll.count(HEALTH_POTION), 0);

        assert!(starting_inventory(EntityKind::Goblin).is_none());
    }

    #[test]
    fn test_boss_catalog_is_weaker_mana_potion() {
        let boss_items = known_items_for(EntityKind::Dragon);
        assert_eq!(boss_items.len(), 1);
        assert_eq!(boss_items[0].effect, ItemEffect::RestoreMana(20));
        assert!(known_items_for(EntityKind::Orc).is_empty());
    }
}

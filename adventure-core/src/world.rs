//! Core value types shared by entities, parties and the combat engine.
//!
//! Contains stats, entity kinds and roles, mana pools and inventories.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Stats
// ============================================================================

/// The named attributes that drive combat math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    Health,
    Defense,
    Magic,
    Agility,
}

impl Stat {
    pub fn name(&self) -> &'static str {
        match self {
            Stat::Strength => "Strength",
            Stat::Health => "Health",
            Stat::Defense => "Defense",
            Stat::Magic => "Magic",
            Stat::Agility => "Agility",
        }
    }

    pub fn all() -> [Stat; 5] {
        [
            Stat::Strength,
            Stat::Health,
            Stat::Defense,
            Stat::Magic,
            Stat::Agility,
        ]
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stat block. `health` is the current value, bounded by the owner's max health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    #[serde(rename = "Strength")]
    pub strength: i32,
    #[serde(rename = "Health")]
    pub health: i32,
    #[serde(rename = "Defense")]
    pub defense: i32,
    #[serde(rename = "Magic")]
    pub magic: i32,
    #[serde(rename = "Agility")]
    pub agility: i32,
}

impl StatBlock {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Health => self.health,
            Stat::Defense => self.defense,
            Stat::Magic => self.magic,
            Stat::Agility => self.agility,
        }
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        match stat {
            Stat::Strength => self.strength = value,
            Stat::Health => self.health = value,
            Stat::Defense => self.defense = value,
            Stat::Magic => self.magic = value,
            Stat::Agility => self.agility = value,
        }
    }

    pub fn add(&mut self, stat: Stat, delta: i32) {
        self.set(stat, self.get(stat) + delta);
    }
}

// ============================================================================
// Kinds and Roles
// ============================================================================

/// Which side of an encounter an entity or party belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    pub fn name(&self) -> &'static str {
        match self {
            Faction::Player => "player",
            Faction::Enemy => "enemy",
        }
    }

    pub fn opposing(&self) -> Faction {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Entity variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Player,
    Npc,
    Enemy,
    Boss,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Player => "Player",
            Role::Npc => "NPC",
            Role::Enemy => "Enemy",
            Role::Boss => "Boss",
        }
    }

    pub fn faction(&self) -> Faction {
        match self {
            Role::Player | Role::Npc => Faction::Player,
            Role::Enemy | Role::Boss => Faction::Enemy,
        }
    }

    /// Whether this role levels up by accumulating experience.
    pub fn gains_experience(&self) -> bool {
        matches!(self, Role::Player | Role::Npc)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Class or creature kind. Resolved once at construction and carried on every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    // Player classes
    Warrior,
    Mage,
    Archer,
    // Recruitable companions
    Fighter,
    Healer,
    Rogue,
    // Regular enemies
    Ogre,
    Goblin,
    Orc,
    // Bosses
    Dragon,
    Troll,
    Giant,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Warrior => "Warrior",
            EntityKind::Mage => "Mage",
            EntityKind::Archer => "Archer",
            EntityKind::Fighter => "Fighter",
            EntityKind::Healer => "Healer",
            EntityKind::Rogue => "Rogue",
            EntityKind::Ogre => "Ogre",
            EntityKind::Goblin => "Goblin",
            EntityKind::Orc => "Orc",
            EntityKind::Dragon => "Dragon",
            EntityKind::Troll => "Troll",
            EntityKind::Giant => "Giant",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            EntityKind::Warrior | EntityKind::Mage | EntityKind::Archer => Role::Player,
            EntityKind::Fighter | EntityKind::Healer | EntityKind::Rogue => Role::Npc,
            EntityKind::Ogre | EntityKind::Goblin | EntityKind::Orc => Role::Enemy,
            EntityKind::Dragon | EntityKind::Troll | EntityKind::Giant => Role::Boss,
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Warrior,
            EntityKind::Mage,
            EntityKind::Archer,
            EntityKind::Fighter,
            EntityKind::Healer,
            EntityKind::Rogue,
            EntityKind::Ogre,
            EntityKind::Goblin,
            EntityKind::Orc,
            EntityKind::Dragon,
            EntityKind::Troll,
            EntityKind::Giant,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error parsing an [`EntityKind`] from its name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown class or creature: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EntityKind::all()
            .iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| UnknownKind(wanted.to_string()))
    }
}

// ============================================================================
// Mana
// ============================================================================

/// Mana pool for spellcasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    pub current: i32,
    pub max: i32,
}

impl ManaPool {
    /// A full pool.
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    /// Spend mana if enough is available.
    pub fn spend(&mut self, cost: i32) -> bool {
        if self.current < cost {
            return false;
        }
        self.current -= cost;
        true
    }

    /// Restore mana up to the maximum. Returns the amount actually restored.
    pub fn restore(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.current = (self.current + amount.max(0)).min(self.max);
        self.current - before
    }

    /// Change the maximum, keeping the current/max proportion.
    pub fn rescale(&mut self, new_max: i32) {
        let new_max = new_max.max(0);
        self.current = if self.max > 0 {
            (self.current as i64 * new_max as i64 / self.max as i64) as i32
        } else {
            new_max
        };
        self.max = new_max;
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Default limit on distinct item names an inventory can hold.
pub const DEFAULT_INVENTORY_SLOTS: usize = 20;

/// Errors from inventory bookkeeping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Inventory is full!")]
    Full,
    #[error("Item not in inventory")]
    Missing,
    #[error("Not enough items")]
    NotEnough,
}

/// Item stock keyed by item name. Entries never hold a zero quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
    max_slots: usize,
}

impl Inventory {
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_INVENTORY_SLOTS)
    }

    pub fn with_slots(max_slots: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            max_slots,
        }
    }

    /// Add `quantity` of an item. The slot limit only applies to new names.
    pub fn add_item(&mut self, name: &str, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Ok(());
        }
        if let Some(count) = self.items.get_mut(name) {
            *count += quantity;
            return Ok(());
        }
        if self.items.len() >= self.max_slots {
            return Err(InventoryError::Full);
        }
        self.items.insert(name.to_string(), quantity);
        Ok(())
    }

    /// Remove `quantity` of an item, dropping the entry when it reaches zero.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> Result<(), InventoryError> {
        let count = self.items.get_mut(name).ok_or(InventoryError::Missing)?;
        if *count < quantity {
            return Err(InventoryError::NotEnough);
        }
        *count -= quantity;
        if *count == 0 {
            self.items.remove(name);
        }
        Ok(())
    }

    pub fn count(&self, name: &str) -> u32 {
        self.items.get(name).copied().unwrap_or(0)
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.count(name) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct item names held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roles() {
        assert_eq!(EntityKind::Warrior.role(), Role::Player);
        assert_eq!(EntityKind::Healer.role(), Role::Npc);
        assert_eq!(EntityKind::Goblin.role(), Role::Enemy);
        assert_eq!(EntityKind::Dragon.role(), Role::Boss);
        assert_eq!(Role::Npc.faction(), Faction::Player);
        assert_eq!(Role::Boss.faction(), Faction::Enemy);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("mage".parse::<EntityKind>(), Ok(EntityKind::Mage));
        assert_eq!(" Troll ".parse::<EntityKind>(), Ok(EntityKind::Troll));
        assert!("paladin".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_mana_rescale_keeps_proportion() {
        let mut pool = ManaPool::new(30);
        assert!(pool.spend(15));
        pool.rescale(40);
        assert_eq!(pool.current, 20);
        assert_eq!(pool.max, 40);
    }

    #[test]
    fn test_mana_rescale_from_empty_pool_fills() {
        let mut pool = ManaPool { current: 0, max: 0 };
        pool.rescale(25);
        assert_eq!(pool.current, 25);
    }

    #[test]
    fn test_mana_restore_clamps() {
        let mut pool = ManaPool::new(30);
        pool.spend(10);
        assert_eq!(pool.restore(30), 10);
        assert_eq!(pool.current, 30);
    }

    #[test]
    fn test_inventory_zero_removes_entry() {
        let mut inv = Inventory::new();
        inv.add_item("Health Potion", 2).unwrap();
        inv.remove_item("Health Potion", 2).unwrap();
        assert!(!inv.has_item("Health Potion"));
        assert!(inv.is_empty());
        assert_eq!(
            inv.remove_item("Health Potion", 1),
            Err(InventoryError::Missing)
        );
    }

    #[test]
    fn test_inventory_slot_limit_only_for_new_names() {
        let mut inv = Inventory::with_slots(2);
        inv.add_item("A", 1).unwrap();
        inv.add_item("B", 1).unwrap();
        assert_eq!(inv.add_item("C", 1), Err(InventoryError::Full));
        // Existing names can still stack.
        inv.add_item("A", 5).unwrap();
        assert_eq!(inv.count("A"), 6);
    }

    #[test]
    fn test_inventory_not_enough() {
        let mut inv = Inventory::new();
        inv.add_item("Mana Potion", 1).unwrap();
        assert_eq!(
            inv.remove_item("Mana Potion", 2),
            Err(InventoryError::NotEnough)
        );
        assert_eq!(inv.count("Mana Potion"), 1);
    }

    #[test]
    fn test_stat_block_serializes_named_keys() {
        let stats = StatBlock {
            strength: 20,
            health: 100,
            ..Default::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["Strength"], 20);
        assert_eq!(json["Health"], 100);
    }
}

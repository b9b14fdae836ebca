//! Combat participants.
//!
//! An [`Entity`] is any Player, NPC, Enemy or Boss. Its stats come from the
//! per-kind formula table for its level, plus any active buffs.

use crate::items::{known_items_for, starting_inventory, Item, ItemEffect};
use crate::spells::{spells_for, Spell};
use crate::world::{
    EntityId, EntityKind, Faction, Inventory, InventoryError, ManaPool, Role, Stat, StatBlock,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;
use tracing::info;

/// Experience needed to go from level 1 to level 2.
pub const BASE_EXPERIENCE_THRESHOLD: u32 = 100;

/// Each level-up multiplies the next threshold by this.
pub const EXPERIENCE_GROWTH: f64 = 1.5;

/// Why an item could not be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("No {0} left in inventory")]
    NotInInventory(String),

    #[error("{item} has no effect on {target}")]
    NotApplicable { item: String, target: String },

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// A combat participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    kind: EntityKind,
    level: u32,
    experience: u32,
    experience_to_next_level: u32,
    stats: StatBlock,
    max_health: i32,
    mana: Option<ManaPool>,
    spellbook: BTreeMap<String, Spell>,
    inventory: Option<Inventory>,
    known_items: BTreeMap<String, Item>,
    /// Pending buff deltas per stat, oldest first.
    buffs: BTreeMap<Stat, VecDeque<i32>>,
}

impl Entity {
    /// Create an entity of `kind` at `level` (at least 1), at full health and mana.
    pub fn new(name: impl Into<String>, kind: EntityKind, level: u32) -> Self {
        let level = level.max(1);
        let data = kind.data();
        let stats = data.stats_at(level);

        Self {
            id: EntityId::new(),
            name: name.into(),
            kind,
            level,
            experience: 0,
            experience_to_next_level: BASE_EXPERIENCE_THRESHOLD,
            max_health: stats.health,
            stats,
            mana: data.max_mana_at(level).map(ManaPool::new),
            spellbook: spells_for(kind)
                .iter()
                .map(|s| (s.name.clone(), s.clone()))
                .collect(),
            inventory: starting_inventory(kind),
            known_items: known_items_for(kind)
                .into_iter()
                .map(|i| (i.name.clone(), i))
                .collect(),
            buffs: BTreeMap::new(),
        }
    }

    /// A regular enemy scaled to the player's level.
    pub fn scaled_enemy(name: impl Into<String>, kind: EntityKind, player_level: u32) -> Self {
        let level = match player_level {
            0..=2 => 1,
            3 => 2,
            n => n,
        };
        Self::new(name, kind, level)
    }

    /// A boss scaled to the player's level and the size of the player's party.
    pub fn scaled_boss(
        name: impl Into<String>,
        kind: EntityKind,
        player_level: u32,
        party_size: usize,
    ) -> Self {
        Self::new(name, kind, player_level + party_size as u32 + 1)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn faction(&self) -> Faction {
        self.kind.role().faction()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> u32 {
        self.experience
    }

    pub fn experience_to_next_level(&self) -> u32 {
        self.experience_to_next_level
    }

    /// Experience awarded for defeating this entity.
    pub fn experience_value(&self) -> u32 {
        self.kind.data().experience_value_at(self.level)
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        self.stats.get(stat)
    }

    pub fn health(&self) -> i32 {
        self.stats.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.stats.health > 0
    }

    pub fn is_defeated(&self) -> bool {
        !self.is_alive()
    }

    pub fn mana(&self) -> Option<&ManaPool> {
        self.mana.as_ref()
    }

    pub fn mana_mut(&mut self) -> Option<&mut ManaPool> {
        self.mana.as_mut()
    }

    pub fn spells(&self) -> impl Iterator<Item = &Spell> {
        self.spellbook.values()
    }

    /// Look up a spell in this entity's spellbook (case-insensitive).
    pub fn spell(&self, name: &str) -> Option<&Spell> {
        self.spellbook
            .get(name)
            .or_else(|| {
                self.spellbook
                    .values()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
            })
    }

    pub fn inventory(&self) -> Option<&Inventory> {
        self.inventory.as_ref()
    }

    pub fn inventory_mut(&mut self) -> Option<&mut Inventory> {
        self.inventory.as_mut()
    }

    pub fn known_items(&self) -> impl Iterator<Item = &Item> {
        self.known_items.values()
    }

    /// Look up an item this entity knows how to use (case-insensitive).
    pub fn known_item(&self, name: &str) -> Option<&Item> {
        self.known_items.get(name).or_else(|| {
            self.known_items
                .values()
                .find(|i| i.name.eq_ignore_ascii_case(name))
        })
    }

    /// Teach this entity a new usable item.
    pub fn learn_item(&mut self, item: Item) {
        self.known_items.insert(item.name.clone(), item);
    }

    /// Number of `name` carried.
    pub fn item_count(&self, name: &str) -> u32 {
        self.inventory.as_ref().map_or(0, |inv| inv.count(name))
    }

    /// Pending buff deltas for a stat, oldest first.
    pub fn active_buffs(&self, stat: Stat) -> Vec<i32> {
        self.buffs
            .get(&stat)
            .map(|stack| stack.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_buffs(&self) -> bool {
        self.buffs.values().any(|stack| !stack.is_empty())
    }

    // ========================================================================
    // Health & Mana
    // ========================================================================

    /// Set current health, clamped to `[0, max_health]`.
    pub fn set_health(&mut self, health: i32) {
        self.stats.health = health.clamp(0, self.max_health);
    }

    /// Apply damage. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.stats.health;
        self.set_health(before - amount.max(0));
        before - self.stats.health
    }

    /// Restore health. Returns the health actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.stats.health;
        self.set_health(before + amount.max(0));
        self.stats.health - before
    }

    /// Spend mana. Fails without a pool or with too little in it.
    pub fn spend_mana(&mut self, cost: i32) -> bool {
        self.mana.as_mut().is_some_and(|pool| pool.spend(cost))
    }

    // ========================================================================
    // Progression
    // ========================================================================

    /// Add experience, levelling up while it covers the threshold.
    ///
    /// Returns the number of levels gained. Enemies and bosses never gain
    /// experience.
    pub fn gain_experience(&mut self, amount: u32) -> u32 {
        if !self.role().gains_experience() {
            return 0;
        }
        self.experience = self.experience.saturating_add(amount);

        let mut gained = 0;
        while self.experience >= self.experience_to_next_level {
            self.level_up();
            gained += 1;
        }
        gained
    }

    /// Advance one level: consume the threshold, grow it, recompute stats.
    pub fn level_up(&mut self) {
        self.experience = self
            .experience
            .saturating_sub(self.experience_to_next_level);
        self.experience_to_next_level = next_threshold(self.experience_to_next_level);
        self.level += 1;
        self.recompute_stats();

        info!(
            name = %self.name,
            kind = %self.kind,
            level = self.level,
            "Level up"
        );
    }

    /// Set level and experience directly, as when loading a save.
    pub fn restore_progress(&mut self, level: u32, experience: u32) {
        self.level = level.max(1);
        self.experience_to_next_level =
            (1..self.level).fold(BASE_EXPERIENCE_THRESHOLD, |t, _| next_threshold(t));
        self.experience = experience;
        self.recompute_stats();
    }

    /// Set the level directly and recompute stats.
    pub fn synchronize_level(&mut self, level: u32) {
        self.level = level.max(1);
        self.recompute_stats();
    }

    /// Rebuild stats from the formula table plus active buffs.
    ///
    /// Living entities are restored to their new max health; defeated ones
    /// stay at 0. Mana keeps its current/max proportion.
    pub fn recompute_stats(&mut self) {
        let data = self.kind.data();
        let base = data.stats_at(self.level);
        let alive = self.is_alive();

        let mut stats = base;
        for (stat, stack) in &self.buffs {
            if *stat != Stat::Health {
                stats.add(*stat, stack.iter().sum());
            }
        }

        self.max_health = base.health;
        stats.health = if alive { self.max_health } else { 0 };
        self.stats = stats;

        if let Some(max) = data.max_mana_at(self.level) {
            match self.mana.as_mut() {
                Some(pool) => pool.rescale(max),
                None => self.mana = Some(ManaPool::new(max)),
            }
        }
    }

    // ========================================================================
    // Items & Buffs
    // ========================================================================

    /// Use one unit of an item on `target`, or on this entity when `None`.
    ///
    /// Nothing is consumed unless the effect applies.
    pub fn use_item(
        &mut self,
        name: &str,
        target: Option<&mut Entity>,
    ) -> Result<String, ItemError> {
        let item = self
            .known_item(name)
            .cloned()
            .ok_or_else(|| ItemError::UnknownItem(name.to_string()))?;

        if self.item_count(&item.name) == 0 {
            return Err(ItemError::NotInInventory(item.name));
        }

        let message = match target {
            Some(other) => other.apply_item(&item)?,
            None => self.apply_item(&item)?,
        };

        if let Some(inventory) = self.inventory.as_mut() {
            inventory.remove_item(&item.name, 1)?;
        }
        Ok(message)
    }

    fn apply_item(&mut self, item: &Item) -> Result<String, ItemError> {
        let target = self.name.clone();
        let not_applicable = || ItemError::NotApplicable {
            item: item.name.clone(),
            target,
        };

        match item.effect {
            ItemEffect::Heal(amount) => {
                let restored = self.heal(amount);
                Ok(format!("{}. Restored {restored} health", item.use_text))
            }
            ItemEffect::RestoreMana(amount) => {
                let Some(pool) = self.mana.as_mut() else {
                    return Err(not_applicable());
                };
                let restored = pool.restore(amount);
                Ok(format!("{}. Restored {restored} mana", item.use_text))
            }
            ItemEffect::Buff(Stat::Health, _) => Err(not_applicable()),
            ItemEffect::Buff(stat, amount) => {
                self.apply_buff(stat, amount);
                Ok(format!("{}. {stat} +{amount}", item.use_text))
            }
            ItemEffect::Damage(amount) => {
                let dealt = self.take_damage(amount);
                Ok(format!("{}. Dealt {dealt} damage", item.use_text))
            }
        }
    }

    /// Raise a stat and remember the delta so it can be reverted.
    pub fn apply_buff(&mut self, stat: Stat, amount: i32) {
        if stat == Stat::Health {
            return;
        }
        self.buffs.entry(stat).or_default().push_back(amount);
        self.stats.add(stat, amount);
    }

    /// Expire the oldest pending buff on every stat.
    pub fn update_buffs(&mut self) {
        for (stat, stack) in self.buffs.iter_mut() {
            if let Some(delta) = stack.pop_front() {
                self.stats.add(*stat, -delta);
            }
        }
        self.buffs.retain(|_, stack| !stack.is_empty());
    }

    /// Expire every pending buff.
    pub fn clear_buffs(&mut self) {
        while self.has_buffs() {
            self.update_buffs();
        }
    }
}

fn next_threshold(threshold: u32) -> u32 {
    ((threshold as f64 * EXPERIENCE_GROWTH) as u32).max(1)
}

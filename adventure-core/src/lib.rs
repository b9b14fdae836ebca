//! Turn-based party combat engine for a console text adventure.
//!
//! This crate provides:
//! - The entity model: classes and creatures with level-scaled stats, mana,
//!   spellbooks, inventories and buffs
//! - Faction-tagged parties with aggregate queries
//! - Spell and item catalogs
//! - The combat engine: initiative, turn order and action resolution
//! - A headless driver and JSON save files
//!
//! # Quick Start
//!
//! ```ignore
//! use adventure_core::{Action, Combat, Entity, EntityKind, GameRng, Party};
//!
//! let mut heroes = Party::player();
//! heroes.add_member(Entity::new("Brom", EntityKind::Warrior, 1))?;
//! let mut foes = Party::enemy();
//! foes.add_member(Entity::new("Goblin", EntityKind::Goblin, 1))?;
//!
//! let mut combat = Combat::new(&mut heroes, &mut foes, GameRng::new(42))?;
//! while !combat.is_over() {
//!     let outcome = combat.take_action(Action::attack(0));
//!     println!("{outcome}");
//! }
//! ```

pub mod class_data;
pub mod combat;
pub mod dice;
pub mod entity;
pub mod headless;
pub mod items;
pub mod party;
pub mod persist;
pub mod rules;
pub mod spells;
pub mod testing;
pub mod world;

// Primary public API
pub use combat::{BattleView, Combat, CombatError, CombatState};
pub use dice::{Dice, GameRng};
pub use entity::{Entity, ItemError};
pub use headless::{AutoPilot, BattleReport, BattleResult, CommandSource, HeadlessBattle, HeadlessConfig};
pub use items::{Item, ItemEffect};
pub use party::{InvalidMember, Party};
pub use persist::{PersistError, SaveSlot, SaveStore, SavedGame, SavedPlayer};
pub use rules::{Action, CombatRules, CombatantRef, Outcome, Rejection};
pub use spells::{Spell, SpellEffect};
pub use world::{EntityKind, Faction, Inventory, Role, Stat, StatBlock};

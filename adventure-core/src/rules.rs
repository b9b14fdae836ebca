//! Combat rules, actions and outcomes.
//!
//! [`CombatRules`] holds every tunable constant the combat engine uses.
//! [`Action`] is what a combatant wants to do on its turn, [`Outcome`] is
//! what the engine reports back after resolving it.

use crate::entity::ItemError;
use crate::spells::SpellEffect;
use crate::world::Faction;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Rules
// ============================================================================

/// Tunable combat constants.
///
/// `Default` is the canonical rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRules {
    /// Percent chance that a physical attack lands.
    pub hit_chance: i32,
    /// Percent chance that a flee attempt succeeds.
    pub flee_chance: i32,
    /// Boss physical damage rolls against `strength / boss_damage_divisor`.
    pub boss_damage_divisor: i32,
    /// Lower bound of every physical damage roll.
    pub min_physical_damage: i32,
    /// Size of the initiative die.
    pub initiative_die: i32,
    /// Agility multiplier added to the initiative roll.
    pub agility_initiative_weight: f64,
    /// Spell base damage varies by this much either way.
    pub spell_variance: i32,
    /// Fraction of the target's Magic subtracted from spell damage.
    pub magic_resist_factor: f64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            hit_chance: 75,
            flee_chance: 50,
            boss_damage_divisor: 2,
            min_physical_damage: 5,
            initiative_die: 20,
            agility_initiative_weight: 0.5,
            spell_variance: 5,
            magic_resist_factor: 0.2,
        }
    }
}

impl CombatRules {
    pub fn with_hit_chance(mut self, percent: i32) -> Self {
        self.hit_chance = percent.clamp(0, 100);
        self
    }

    pub fn with_flee_chance(mut self, percent: i32) -> Self {
        self.flee_chance = percent.clamp(0, 100);
        self
    }

    pub fn with_boss_damage_divisor(mut self, divisor: i32) -> Self {
        self.boss_damage_divisor = divisor.max(1);
        self
    }

    pub fn with_min_physical_damage(mut self, damage: i32) -> Self {
        self.min_physical_damage = damage.max(0);
        self
    }

    pub fn with_initiative_die(mut self, sides: i32) -> Self {
        self.initiative_die = sides.max(1);
        self
    }

    pub fn with_agility_initiative_weight(mut self, weight: f64) -> Self {
        self.agility_initiative_weight = weight;
        self
    }

    pub fn with_spell_variance(mut self, variance: i32) -> Self {
        self.spell_variance = variance.max(0);
        self
    }

    pub fn with_magic_resist_factor(mut self, factor: f64) -> Self {
        self.magic_resist_factor = factor;
        self
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Addresses one combatant: which party, and the index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantRef {
    pub side: Faction,
    pub index: usize,
}

impl CombatantRef {
    pub fn player(index: usize) -> Self {
        Self {
            side: Faction::Player,
            index,
        }
    }

    pub fn enemy(index: usize) -> Self {
        Self {
            side: Faction::Enemy,
            index,
        }
    }
}

impl fmt::Display for CombatantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.side, self.index)
    }
}

/// What the active combatant does on its turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Physical attack. Player-side attackers name an index into the enemy
    /// party; enemy-side attackers pick a random living player and ignore it.
    Attack { target: Option<usize> },
    /// Cast a spell from the caster's spellbook.
    CastSpell { spell: String, target: CombatantRef },
    /// Use an item. `None` targets the user.
    UseItem {
        item: String,
        target: Option<CombatantRef>,
    },
    /// Try to abandon the encounter.
    Flee,
}

impl Action {
    pub fn attack(target: usize) -> Self {
        Action::Attack {
            target: Some(target),
        }
    }

    pub fn cast(spell: impl Into<String>, target: CombatantRef) -> Self {
        Action::CastSpell {
            spell: spell.into(),
            target,
        }
    }

    pub fn use_item(item: impl Into<String>, target: Option<CombatantRef>) -> Self {
        Action::UseItem {
            item: item.into(),
            target,
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why an action was refused. The turn is not consumed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("Invalid target")]
    InvalidTarget,
    #[error("Invalid Spell")]
    UnknownSpell,
    #[error("Not enough mana")]
    NotEnoughMana,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Enemies cannot flee")]
    CannotFlee,
    #[error(transparent)]
    Item(#[from] ItemError),
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::InvalidTarget => "INVALID_TARGET",
            Rejection::UnknownSpell => "INVALID_SPELL",
            Rejection::NotEnoughMana => "NOT_ENOUGH_MANA",
            Rejection::NotYourTurn => "NOT_YOUR_TURN",
            Rejection::CannotFlee => "CANNOT_FLEE",
            Rejection::Item(_) => "ITEM_FAILED",
        }
    }
}

/// Result of a physical attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub attacker: CombatantRef,
    pub attacker_name: String,
    pub defender: CombatantRef,
    pub defender_name: String,
    pub hit: bool,
    /// Damage after mitigation. Zero on a miss.
    pub damage: i32,
    pub defender_health: i32,
    pub defeated: bool,
    /// Experience awarded to the attacker for the kill.
    pub experience: u32,
    pub levels_gained: u32,
}

/// Result of a cast spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellReport {
    pub caster: CombatantRef,
    pub caster_name: String,
    pub target: CombatantRef,
    pub target_name: String,
    pub spell: String,
    pub effect: SpellEffect,
    pub mana_spent: i32,
    /// Damage dealt or health restored.
    pub amount: i32,
    pub target_health: i32,
    pub defeated: bool,
    pub experience: u32,
    pub levels_gained: u32,
}

/// Result of a used item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub user: CombatantRef,
    pub user_name: String,
    pub target: CombatantRef,
    pub item: String,
    pub message: String,
    pub defeated: bool,
    pub experience: u32,
    pub levels_gained: u32,
}

/// What resolving an action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Attack(AttackReport),
    Spell(SpellReport),
    Item(ItemReport),
    FleeFailed,
    Fled,
    Victory,
    Defeat,
    Rejected(Rejection),
}

impl Outcome {
    /// Short result code (`HIT_15`, `MISS`, `VICTORY`, ...).
    pub fn code(&self) -> String {
        match self {
            Outcome::Attack(r) if r.hit => format!("HIT_{}", r.damage),
            Outcome::Attack(_) => "MISS".to_string(),
            Outcome::Spell(r) => match r.effect {
                SpellEffect::Damage => format!("SPELL_{}", r.amount),
                SpellEffect::Heal => format!("HEAL_{}", r.amount),
            },
            Outcome::Item(_) => "ITEM_USED".to_string(),
            Outcome::FleeFailed => "FAILED_FLEE".to_string(),
            Outcome::Fled => "FLED".to_string(),
            Outcome::Victory => "VICTORY".to_string(),
            Outcome::Defeat => "DEFEAT".to_string(),
            Outcome::Rejected(r) => r.code().to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::Fled | Outcome::Victory | Outcome::Defeat)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Attack(r) if r.hit => {
                write!(
                    f,
                    "{} hits {} for {} damage",
                    r.attacker_name, r.defender_name, r.damage
                )?;
                if r.defeated {
                    write!(f, ". {} is defeated", r.defender_name)?;
                }
                write_experience(f, r.experience)
            }
            Outcome::Attack(r) => write!(f, "{} misses {}", r.attacker_name, r.defender_name),
            Outcome::Spell(r) => {
                match r.effect {
                    SpellEffect::Damage => write!(
                        f,
                        "{} casts {} on {} for {} damage",
                        r.caster_name, r.spell, r.target_name, r.amount
                    )?,
                    SpellEffect::Heal => write!(
                        f,
                        "{} casts {} on {}, restoring {} health",
                        r.caster_name, r.spell, r.target_name, r.amount
                    )?,
                }
                if r.defeated {
                    write!(f, ". {} is defeated", r.target_name)?;
                }
                write_experience(f, r.experience)
            }
            Outcome::Item(r) => {
                write!(f, "{} uses {}: {}", r.user_name, r.item, r.message)?;
                write_experience(f, r.experience)
            }
            Outcome::FleeFailed => write!(f, "Failed to flee"),
            Outcome::Fled => write!(f, "Fled the encounter"),
            Outcome::Victory => write!(f, "Victory!"),
            Outcome::Defeat => write!(f, "Defeat..."),
            Outcome::Rejected(r) => write!(f, "Rejected: {r}"),
        }
    }
}

fn write_experience(f: &mut fmt::Formatter<'_>, experience: u32) -> fmt::Result {
    if experience > 0 {
        write!(f, " ({experience} XP)")?;
    }
    Ok(())
}

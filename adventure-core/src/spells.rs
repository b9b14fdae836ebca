//! Spell catalog and spellcasting math.
//!
//! Each spellcasting kind has a fixed set of signature spells. Magnitudes
//! scale with the caster's Magic stat; damage is reduced by the target's
//! magic resistance, healing is applied in full.

use crate::dice::Dice;
use crate::entity::Entity;
use crate::rules::CombatRules;
use crate::world::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// What a spell does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellEffect {
    Damage,
    Heal,
}

/// Immutable spell definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub mana_cost: i32,
    pub base_damage: i32,
    /// Multiplies the caster's Magic stat.
    pub scaling_factor: f64,
    pub effect: SpellEffect,
}

impl Spell {
    pub fn damage(name: &str, mana_cost: i32, base_damage: i32, scaling_factor: f64) -> Self {
        Self {
            name: name.to_string(),
            mana_cost,
            base_damage,
            scaling_factor,
            effect: SpellEffect::Damage,
        }
    }

    pub fn heal(name: &str, mana_cost: i32, base_damage: i32, scaling_factor: f64) -> Self {
        Self {
            effect: SpellEffect::Heal,
            ..Self::damage(name, mana_cost, base_damage, scaling_factor)
        }
    }

    pub fn is_heal(&self) -> bool {
        self.effect == SpellEffect::Heal
    }

    /// Whether `caster` has a mana pool holding at least this spell's cost.
    pub fn can_cast(&self, caster: &Entity) -> bool {
        caster
            .mana()
            .is_some_and(|pool| pool.current >= self.mana_cost)
    }

    /// Roll the raw magnitude: base damage with variance plus scaled Magic.
    pub fn roll_magnitude<D: Dice>(&self, caster_magic: i32, rules: &CombatRules, dice: &mut D) -> i32 {
        let spread = rules.spell_variance;
        let base = dice.range(self.base_damage - spread, self.base_damage + spread);
        let total = base as f64 + caster_magic as f64 * self.scaling_factor;
        total.round() as i32
    }
}

/// Damage left after the target's magic resistance, never negative.
pub fn resisted_damage(magnitude: i32, target_magic: i32, rules: &CombatRules) -> i32 {
    let resist = target_magic.max(0) as f64 * rules.magic_resist_factor;
    (magnitude as f64 - resist).round().max(0.0) as i32
}

static SPELLBOOKS: LazyLock<HashMap<EntityKind, Vec<Spell>>> = LazyLock::new(build_spellbooks);

/// Signature spells for a kind; empty for kinds that cannot cast.
pub fn spells_for(kind: EntityKind) -> &'static [Spell] {
    SPELLBOOKS.get(&kind).map(Vec::as_slice).unwrap_or(&[])
}

/// Find a catalog spell by name (case-insensitive) across all kinds.
pub fn find_spell(name: &str) -> Option<&'static Spell> {
    SPELLBOOKS
        .values()
        .flatten()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

fn build_spellbooks() -> HashMap<EntityKind, Vec<Spell>> {
    let arcane = vec![
        Spell::damage("Fireball", 20, 25, 0.6),
        Spell::damage("Ice Shard", 15, 20, 0.4),
        Spell::damage("Lightning Bolt", 25, 30, 0.7),
    ];
    let divine = vec![
        Spell::heal("Heal", 15, 20, 0.4),
        Spell::damage("Smite", 10, 15, 0.3),
        Spell::heal("Blessing", 20, 15, 0.4),
    ];

    let mut books = HashMap::new();
    books.insert(EntityKind::Mage, arcane);
    books.insert(EntityKind::Healer, divine);
    books.insert(
        EntityKind::Dragon,
        vec![
            Spell::damage("Fire Breath", 30, 25, 0.7),
            Spell::damage("Tail Whip", 15, 20, 0.4),
            Spell::damage("Claw Swipe", 10, 15, 0.5),
            Spell::damage("Roar", 20, 15, 0.6),
        ],
    );
    books.insert(
        EntityKind::Troll,
        vec![
            Spell::damage("Hammer Fist", 30, 25, 0.6),
            Spell::damage("Stomp", 10, 15, 0.5),
            Spell::damage("Boulder Throw", 20, 20, 0.4),
        ],
    );
    books.insert(
        EntityKind::Giant,
        vec![
            Spell::damage("Club Swing", 30, 25, 0.6),
            Spell::damage("Stomp", 10, 15, 0.5),
            Spell::damage("Boulder Throw", 20, 20, 0.4),
        ],
    );
    books
}

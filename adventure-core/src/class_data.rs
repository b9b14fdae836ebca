//! Per-kind stat formulas.
//!
//! Every stat grows linearly with level: `base + increment * (level - 1)`.

use crate::world::{EntityKind, Stat, StatBlock};

/// A stat that grows linearly with level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearStat {
    pub base: i32,
    pub increment: i32,
}

impl LinearStat {
    pub const ZERO: LinearStat = LinearStat::new(0, 0);

    pub const fn new(base: i32, increment: i32) -> Self {
        Self { base, increment }
    }

    /// Value at `level` (levels start at 1).
    pub fn at(&self, level: u32) -> i32 {
        let steps = level.saturating_sub(1) as i32;
        self.base + self.increment * steps
    }
}

/// Formula table for one kind.
#[derive(Debug, Clone, Copy)]
pub struct KindData {
    pub strength: LinearStat,
    pub health: LinearStat,
    pub defense: LinearStat,
    pub magic: LinearStat,
    pub agility: LinearStat,
    /// Maximum mana; `None` for kinds without a mana pool.
    pub mana: Option<LinearStat>,
    /// Experience awarded for defeating this kind; `None` for player-side kinds.
    pub experience_value: Option<LinearStat>,
}

impl KindData {
    /// Stats at `level`, with health at its maximum.
    pub fn stats_at(&self, level: u32) -> StatBlock {
        StatBlock {
            strength: self.strength.at(level),
            health: self.health.at(level),
            defense: self.defense.at(level),
            magic: self.magic.at(level),
            agility: self.agility.at(level),
        }
    }

    pub fn formula(&self, stat: Stat) -> LinearStat {
        match stat {
            Stat::Strength => self.strength,
            Stat::Health => self.health,
            Stat::Defense => self.defense,
            Stat::Magic => self.magic,
            Stat::Agility => self.agility,
        }
    }

    pub fn max_mana_at(&self, level: u32) -> Option<i32> {
        self.mana.map(|m| m.at(level))
    }

    pub fn experience_value_at(&self, level: u32) -> u32 {
        self.experience_value
            .map(|xp| xp.at(level).max(0) as u32)
            .unwrap_or(0)
    }
}

const fn lin(base: i32, increment: i32) -> LinearStat {
    LinearStat::new(base, increment)
}

const MELEE: KindData = KindData {
    strength: lin(20, 5),
    health: lin(100, 20),
    defense: lin(15, 3),
    magic: LinearStat::ZERO,
    agility: lin(5, 5),
    mana: None,
    experience_value: None,
};

const CASTER: KindData = KindData {
    strength: lin(10, 2),
    health: lin(60, 10),
    defense: lin(5, 1),
    magic: lin(30, 5),
    agility: LinearStat::ZERO,
    mana: Some(lin(30, 5)),
    experience_value: None,
};

const SKIRMISHER: KindData = KindData {
    strength: lin(15, 3),
    health: lin(80, 15),
    defense: lin(10, 2),
    magic: LinearStat::ZERO,
    agility: lin(25, 5),
    mana: None,
    experience_value: None,
};

impl EntityKind {
    /// Stat formulas for this kind.
    pub fn data(&self) -> KindData {
        match self {
            EntityKind::Warrior | EntityKind::Fighter => MELEE,
            EntityKind::Mage | EntityKind::Healer => CASTER,
            EntityKind::Archer | EntityKind::Rogue => SKIRMISHER,
            EntityKind::Ogre => KindData {
                strength: lin(12, 5),
                health: lin(75, 10),
                defense: lin(12, 3),
                magic: LinearStat::ZERO,
                agility: LinearStat::ZERO,
                mana: None,
                experience_value: Some(lin(30, 5)),
            },
            EntityKind::Goblin => KindData {
                strength: lin(10, 3),
                health: lin(50, 10),
                defense: lin(5, 1),
                magic: LinearStat::ZERO,
                agility: lin(5, 2),
                mana: None,
                experience_value: Some(lin(20, 5)),
            },
            EntityKind::Orc => KindData {
                strength: lin(12, 3),
                health: lin(65, 15),
                defense: lin(8, 2),
                magic: LinearStat::ZERO,
                agility: LinearStat::ZERO,
                mana: None,
                experience_value: Some(lin(25, 5)),
            },
            EntityKind::Dragon => KindData {
                strength: lin(30, 10),
                health: lin(200, 10),
                defense: lin(20, 5),
                magic: lin(20, 5),
                agility: LinearStat::ZERO,
                mana: Some(lin(20, 5)),
                experience_value: Some(lin(100, 20)),
            },
            EntityKind::Troll => KindData {
                strength: lin(25, 10),
                health: lin(150, 30),
                defense: lin(15, 5),
                magic: lin(20, 5),
                agility: LinearStat::ZERO,
                mana: Some(lin(20, 5)),
                experience_value: Some(lin(75, 15)),
            },
            EntityKind::Giant => KindData {
                strength: lin(20, 12),
                health: lin(100, 20),
                defense: lin(15, 4),
                magic: lin(20, 5),
                agility: LinearStat::ZERO,
                mana: Some(lin(20, 5)),
                experience_value: Some(lin(55, 10)),
            },
        }
    }
}

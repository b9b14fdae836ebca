//! Testing utilities for the combat engine.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedDice` for forcing specific roll values
//! - `ScriptedCommands` for replaying a fixed list of actions
//! - Party builders for common encounter setups

use crate::combat::BattleView;
use crate::dice::{Dice, GameRng};
use crate::entity::Entity;
use crate::headless::{AutoPilot, CommandSource};
use crate::party::Party;
use crate::rules::Action;
use crate::world::EntityKind;
use std::collections::VecDeque;

/// Dice that return scripted values in order.
///
/// Each scripted value is clamped into the requested range. Collapsed
/// ranges (`high <= low`) return `low` without consuming a value, matching
/// [`GameRng`]. Once the script runs out, rolls come from a seeded
/// fallback generator.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    /// Values still to be returned.
    values: VecDeque<i32>,
    /// Used after the script is exhausted.
    fallback: GameRng,
    /// Scripted values consumed so far.
    consumed: usize,
}

impl ScriptedDice {
    /// Create dice that will return `values` in order.
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback: GameRng::new(0),
            consumed: 0,
        }
    }

    /// Append more values to the script.
    pub fn push(&mut self, values: impl IntoIterator<Item = i32>) {
        self.values.extend(values);
    }

    /// Scripted values not yet used.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Scripted values used so far.
    pub fn rolls_made(&self) -> usize {
        self.consumed
    }
}

impl Dice for ScriptedDice {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        match self.values.pop_front() {
            Some(value) => {
                self.consumed += 1;
                value.clamp(low, high)
            }
            None => self.fallback.range(low, high),
        }
    }
}

/// A command source that replays a fixed list of actions.
///
/// Falls back to [`AutoPilot`] once the list is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommands {
    actions: VecDeque<Action>,
    issued: usize,
}

impl ScriptedCommands {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
            issued: 0,
        }
    }

    /// Scripted actions handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

impl CommandSource for ScriptedCommands {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action {
        match self.actions.pop_front() {
            Some(action) => {
                self.issued += 1;
                action
            }
            None => AutoPilot.next_action(view),
        }
    }
}

/// A player party built from `(name, kind, level)` triples.
///
/// Entries that cannot join are skipped.
pub fn player_party(members: &[(&str, EntityKind, u32)]) -> Party {
    build_party(Party::player(), members)
}

/// An enemy party built from `(name, kind, level)` triples.
pub fn enemy_party(members: &[(&str, EntityKind, u32)]) -> Party {
    build_party(Party::enemy(), members)
}

fn build_party(mut party: Party, members: &[(&str, EntityKind, u32)]) -> Party {
    for (name, kind, level) in members {
        let _ = party.add_member(Entity::new(*name, *kind, *level));
    }
    party
}

/// A level 1 Warrior against a level 1 Goblin.
pub fn warrior_vs_goblin() -> (Party, Party) {
    (
        player_party(&[("Brom", EntityKind::Warrior, 1)]),
        enemy_party(&[("Goblin", EntityKind::Goblin, 1)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_values_clamped() {
        let mut dice = ScriptedDice::new([150, -3, 7]);
        assert_eq!(dice.percent(), 100);
        assert_eq!(dice.range(0, 5), 0);
        assert_eq!(dice.range(1, 20), 7);
        assert_eq!(dice.rolls_made(), 3);
    }

    #[test]
    fn test_collapsed_range_keeps_script() {
        let mut dice = ScriptedDice::new([4]);
        assert_eq!(dice.range(5, 5), 5);
        assert_eq!(dice.range(0, 0), 0);
        assert_eq!(dice.remaining(), 1);
        assert_eq!(dice.range(1, 6), 4);
    }

    #[test]
    fn test_fallback_after_script() {
        let mut dice = ScriptedDice::new([]);
        let roll = dice.range(1, 20);
        assert!((1..=20).contains(&roll));
        assert_eq!(dice.rolls_made(), 0);
    }

    #[test]
    fn test_builders() {
        let (heroes, foes) = warrior_vs_goblin();
        assert_eq!(heroes.len(), 1);
        assert_eq!(foes.member(0).unwrap().kind(), EntityKind::Goblin);

        // Wrong-faction entries are skipped.
        let mixed = player_party(&[("Brom", EntityKind::Warrior, 1), ("Orc", EntityKind::Orc, 1)]);
        assert_eq!(mixed.len(), 1);
    }
}

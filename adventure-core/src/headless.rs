//! Headless battle driver.
//!
//! Runs a whole encounter without a console. Each side's decisions come from
//! a [`CommandSource`]; [`AutoPilot`] is a simple deterministic policy usable
//! for either side, for scripted runs and as the fallback when a source
//! submits an action the engine rejects.
//!
//! # Example
//!
//! ```ignore
//! use adventure_core::headless::{AutoPilot, HeadlessBattle, HeadlessConfig};
//!
//! let battle = HeadlessBattle::new(HeadlessConfig::new().with_seed(42));
//! let report = battle.run(&mut heroes, &mut goblins, &mut AutoPilot, &mut AutoPilot)?;
//! println!("{:?} after {} turns", report.result, report.turns);
//! ```

use crate::combat::{BattleView, Combat, CombatError, CombatState};
use crate::dice::GameRng;
use crate::entity::Entity;
use crate::items::{HEALTH_POTION, MANA_POTION};
use crate::party::Party;
use crate::rules::{Action, CombatRules, CombatantRef, Outcome, Rejection};
use crate::world::Faction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Supplies the action for whichever combatant is active.
pub trait CommandSource {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action;

    /// Told when the engine refused the last action. The turn is still open.
    ///
    /// Return `true` to be asked again for the same turn, `false` to let
    /// [`AutoPilot`] act instead.
    fn rejected(&mut self, _reason: &Rejection) -> bool {
        false
    }
}

impl<C: CommandSource + ?Sized> CommandSource for &mut C {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action {
        (**self).next_action(view)
    }

    fn rejected(&mut self, reason: &Rejection) -> bool {
        (**self).rejected(reason)
    }
}

impl<C: CommandSource + ?Sized> CommandSource for Box<C> {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action {
        (**self).next_action(view)
    }

    fn rejected(&mut self, reason: &Rejection) -> bool {
        (**self).rejected(reason)
    }
}

/// Deterministic decision policy.
///
/// In priority order: heal a badly wounded ally with a healing spell, cast
/// the most expensive affordable damage spell at the weakest foe, drink a
/// Health Potion when low, drink a Mana Potion when out of spells, then
/// attack the weakest foe.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPilot;

impl AutoPilot {
    fn weakest(party: &Party) -> Option<usize> {
        party
            .members()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive())
            .min_by_key(|(_, m)| m.health())
            .map(|(i, _)| i)
    }

    fn most_wounded(party: &Party) -> Option<usize> {
        party
            .members()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive() && m.health() * 2 < m.max_health())
            .min_by_key(|(_, m)| m.health() * 100 / m.max_health().max(1))
            .map(|(i, _)| i)
    }

    fn holds(actor: &Entity, item: &str) -> bool {
        actor.known_item(item).is_some() && actor.item_count(item) > 0
    }
}

impl CommandSource for AutoPilot {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action {
        let side = view.active.side;
        let Some(actor) = view.active_entity() else {
            return Action::Attack { target: None };
        };

        let heal = actor
            .spells()
            .filter(|s| s.is_heal() && s.can_cast(actor))
            .max_by_key(|s| s.mana_cost);
        if let (Some(spell), Some(ally)) = (heal, Self::most_wounded(view.allies())) {
            return Action::cast(spell.name.clone(), CombatantRef { side, index: ally });
        }

        let foe = Self::weakest(view.foes());
        let strike = actor
            .spells()
            .filter(|s| !s.is_heal() && s.can_cast(actor))
            .max_by_key(|s| s.mana_cost);
        if let (Some(spell), Some(index)) = (strike, foe) {
            let target = CombatantRef {
                side: side.opposing(),
                index,
            };
            return Action::cast(spell.name.clone(), target);
        }

        if actor.health() * 10 < actor.max_health() * 3 && Self::holds(actor, HEALTH_POTION) {
            return Action::use_item(HEALTH_POTION, None);
        }

        let out_of_spells = actor.spells().next().is_some() && strike.is_none();
        if out_of_spells && actor.mana().is_some() && Self::holds(actor, MANA_POTION) {
            return Action::use_item(MANA_POTION, None);
        }

        match side {
            Faction::Player => Action::Attack { target: foe },
            Faction::Enemy => Action::Attack { target: None },
        }
    }
}

/// Configuration for a headless battle.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// RNG seed; random when `None`.
    pub seed: Option<u64>,
    /// Stop after this many turns.
    pub max_turns: u32,
    pub rules: CombatRules,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_turns: 500,
            rules: CombatRules::default(),
        }
    }
}

impl HeadlessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_rules(mut self, rules: CombatRules) -> Self {
        self.rules = rules;
        self
    }
}

/// How a headless battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleResult {
    Victory,
    Defeat,
    Fled,
    /// The turn limit was reached first.
    Unfinished,
}

/// Summary of a finished headless battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleReport {
    pub result: BattleResult,
    pub seed: u64,
    /// Turns taken, including skipped ones.
    pub turns: u32,
    pub rounds: u32,
    /// One line per resolved action.
    pub log: Vec<String>,
}

/// Drives one encounter to completion.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBattle {
    config: HeadlessConfig,
}

impl HeadlessBattle {
    pub fn new(config: HeadlessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Fight until a terminal outcome or the turn limit.
    ///
    /// A rejected action goes back to its source through
    /// [`CommandSource::rejected`]. Sources that decline to retry are covered
    /// by one [`AutoPilot`] attempt; if that is also rejected the combatant
    /// loses its turn.
    pub fn run(
        &self,
        player: &mut Party,
        enemy: &mut Party,
        mut player_source: impl CommandSource,
        mut enemy_source: impl CommandSource,
    ) -> Result<BattleReport, CombatError> {
        let rng = self.config.seed.map(GameRng::new).unwrap_or_default();
        let seed = rng.seed();
        let mut combat = Combat::with_rules(player, enemy, rng, self.config.rules.clone())?;
        let mut log = Vec::new();
        let mut turns = 0;

        while turns < self.config.max_turns {
            let Some(view) = combat.view() else {
                break;
            };
            let side = view.active.side;
            let action = match side {
                Faction::Player => player_source.next_action(&view),
                Faction::Enemy => enemy_source.next_action(&view),
            };

            let mut outcome = combat.take_action(action);
            if let Outcome::Rejected(reason) = &outcome {
                let ask_again = match side {
                    Faction::Player => player_source.rejected(reason),
                    Faction::Enemy => enemy_source.rejected(reason),
                };
                if ask_again {
                    debug!(reason = %reason, "Command rejected, asking again");
                    continue;
                }
                warn!(reason = %reason, "Command rejected, falling back to autopilot");
                if let Some(view) = combat.view() {
                    let fallback = AutoPilot.next_action(&view);
                    outcome = combat.take_action(fallback);
                }
            }
            if let Outcome::Rejected(reason) = &outcome {
                warn!(reason = %reason, "Fallback rejected, skipping turn");
                log.push(format!("Turn skipped: {reason}"));
                combat.advance_turn();
                turns += 1;
                continue;
            }

            turns += 1;
            log.push(outcome.to_string());
            if let Some(done) = combat.check_terminal() {
                if done != outcome {
                    log.push(done.to_string());
                }
                break;
            }
        }

        let result = match combat.state() {
            CombatState::Victory => BattleResult::Victory,
            CombatState::Defeat => BattleResult::Defeat,
            CombatState::Fled => BattleResult::Fled,
            CombatState::AwaitingAction(_) => BattleResult::Unfinished,
        };
        info!(?result, turns, rounds = combat.round(), "Headless battle finished");

        Ok(BattleReport {
            result,
            seed,
            turns,
            rounds: combat.round(),
            log,
        })
    }
}

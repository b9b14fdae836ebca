//! Turn-based combat between a player party and an enemy party.
//!
//! A [`Combat`] borrows both parties for the length of one encounter. Turn
//! order is rolled once at construction; after that the caller submits one
//! action per turn for whichever combatant is active until the encounter
//! reaches a terminal state.
//!
//! ```ignore
//! let mut combat = Combat::new(&mut heroes, &mut goblins, GameRng::new(7))?;
//! while !combat.is_over() {
//!     let outcome = combat.take_action(Action::attack(0));
//!     println!("{outcome}");
//! }
//! ```

use crate::dice::Dice;
use crate::entity::{Entity, ItemError};
use crate::party::Party;
use crate::rules::{
    Action, AttackReport, CombatRules, CombatantRef, ItemReport, Outcome, Rejection, SpellReport,
};
use crate::spells::{resisted_damage, SpellEffect};
use crate::world::{Faction, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors constructing a combat session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CombatError {
    #[error("Invalid combat setup: {0}")]
    InvalidSetup(String),
}

/// Where the encounter stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatState {
    /// Waiting for the given combatant to act.
    AwaitingAction(CombatantRef),
    Victory,
    Defeat,
    Fled,
}

impl CombatState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CombatState::AwaitingAction(_))
    }

    fn outcome(&self) -> Option<Outcome> {
        match self {
            CombatState::AwaitingAction(_) => None,
            CombatState::Victory => Some(Outcome::Victory),
            CombatState::Defeat => Some(Outcome::Defeat),
            CombatState::Fled => Some(Outcome::Fled),
        }
    }
}

/// One slot in the initiative order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub combatant: CombatantRef,
    pub roll: i32,
    pub score: f64,
}

/// Read-only view of an encounter, handed to command sources.
#[derive(Debug, Clone, Copy)]
pub struct BattleView<'a> {
    pub active: CombatantRef,
    pub player: &'a Party,
    pub enemy: &'a Party,
    pub round: u32,
}

impl<'a> BattleView<'a> {
    pub fn party(&self, side: Faction) -> &'a Party {
        match side {
            Faction::Player => self.player,
            Faction::Enemy => self.enemy,
        }
    }

    pub fn entity(&self, who: CombatantRef) -> Option<&'a Entity> {
        self.party(who.side).member(who.index)
    }

    pub fn active_entity(&self) -> Option<&'a Entity> {
        self.entity(self.active)
    }

    pub fn allies(&self) -> &'a Party {
        self.party(self.active.side)
    }

    pub fn foes(&self) -> &'a Party {
        self.party(self.active.side.opposing())
    }
}

/// A single encounter.
pub struct Combat<'p, D: Dice> {
    player: &'p mut Party,
    enemy: &'p mut Party,
    dice: D,
    rules: CombatRules,
    initiative: Vec<Initiative>,
    turn: usize,
    round: u32,
    state: CombatState,
    history: Vec<Outcome>,
}

impl<'p, D: Dice> Combat<'p, D> {
    /// Start an encounter with the default rule set.
    pub fn new(player: &'p mut Party, enemy: &'p mut Party, dice: D) -> Result<Self, CombatError> {
        Self::with_rules(player, enemy, dice, CombatRules::default())
    }

    /// Start an encounter with custom rules.
    ///
    /// The first party must be tagged player and the second enemy, and both
    /// must have members.
    pub fn with_rules(
        player: &'p mut Party,
        enemy: &'p mut Party,
        dice: D,
        rules: CombatRules,
    ) -> Result<Self, CombatError> {
        if player.faction() != Faction::Player {
            return Err(CombatError::InvalidSetup(format!(
                "first party must be the player party, got {}",
                player.faction()
            )));
        }
        if enemy.faction() != Faction::Enemy {
            return Err(CombatError::InvalidSetup(format!(
                "second party must be the enemy party, got {}",
                enemy.faction()
            )));
        }
        if player.is_empty() || enemy.is_empty() {
            return Err(CombatError::InvalidSetup(
                "both parties need at least one member".to_string(),
            ));
        }

        let mut combat = Self {
            player,
            enemy,
            dice,
            rules,
            initiative: Vec::new(),
            turn: 0,
            round: 1,
            state: CombatState::AwaitingAction(CombatantRef::player(0)),
            history: Vec::new(),
        };
        combat.roll_initiative();

        info!(
            players = combat.player.len(),
            enemies = combat.enemy.len(),
            "Encounter started"
        );

        if combat.check_terminal().is_none() {
            combat.seek_living(0, false);
        }
        Ok(combat)
    }

    // ========================================================================
    // Initiative & Turns
    // ========================================================================

    fn roll_initiative(&mut self) {
        let mut order = Vec::with_capacity(self.player.len() + self.enemy.len());
        for (side, party) in [
            (Faction::Player, &*self.player),
            (Faction::Enemy, &*self.enemy),
        ] {
            for (index, member) in party.members().iter().enumerate() {
                let roll = self.dice.range(1, self.rules.initiative_die);
                let score =
                    roll as f64 + self.rules.agility_initiative_weight * member.stats().agility as f64;
                debug!(name = %member.name, roll, score, "Initiative rolled");
                order.push(Initiative {
                    combatant: CombatantRef { side, index },
                    roll,
                    score,
                });
            }
        }
        // Stable: ties keep player party first, then party order.
        order.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.initiative = order;
    }

    /// Point the turn at the first living combatant from `start`.
    ///
    /// With `skip_current` the slot at `start` itself is passed over. The round
    /// counter goes up whenever the scan wraps.
    fn seek_living(&mut self, start: usize, skip_current: bool) {
        let len = self.initiative.len();
        if len == 0 {
            return;
        }
        let mut idx = start;
        let first = usize::from(skip_current);
        for offset in first..=len {
            if offset > 0 {
                idx += 1;
                if idx >= len {
                    idx = 0;
                    self.round += 1;
                }
            }
            let who = self.initiative[idx].combatant;
            if self.entity(who).is_some_and(Entity::is_alive) {
                self.turn = idx;
                self.state = CombatState::AwaitingAction(who);
                return;
            }
        }
    }

    /// Move to the next living combatant in initiative order.
    pub fn advance_turn(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.seek_living(self.turn, true);
        if let CombatState::AwaitingAction(who) = self.state {
            debug!(combatant = %who, round = self.round, "Turn advanced");
        }
    }

    /// Settle Victory or Defeat if either side has no one standing.
    ///
    /// Terminal states are sticky; once reached they are returned again.
    pub fn check_terminal(&mut self) -> Option<Outcome> {
        if let Some(done) = self.state.outcome() {
            return Some(done);
        }
        if !self.enemy.is_alive() {
            Some(self.finish(CombatState::Victory, Outcome::Victory))
        } else if !self.player.is_alive() {
            Some(self.finish(CombatState::Defeat, Outcome::Defeat))
        } else {
            None
        }
    }

    /// Enter a terminal state. Every participant's buffs expire.
    fn finish(&mut self, state: CombatState, outcome: Outcome) -> Outcome {
        self.state = state;
        for member in self.player.iter_mut().chain(self.enemy.iter_mut()) {
            member.clear_buffs();
        }
        info!(outcome = %outcome.code(), round = self.round, "Encounter over");
        self.history.push(outcome.clone());
        outcome
    }

    /// Record a resolved action and move on, unless it ended the encounter.
    fn resolve(&mut self, outcome: Outcome) -> Outcome {
        debug!(outcome = %outcome, "Action resolved");
        self.history.push(outcome.clone());
        if self.check_terminal().is_none() {
            self.advance_turn();
        }
        outcome
    }

    /// Active combatant, or the terminal outcome if the encounter is over.
    fn begin(&mut self) -> Result<CombatantRef, Outcome> {
        if let Some(done) = self.check_terminal() {
            return Err(done);
        }
        self.active_ref()
            .ok_or(Outcome::Rejected(Rejection::NotYourTurn))
    }

    fn reject(&self, reason: Rejection) -> Outcome {
        debug!(reason = %reason, "Action rejected");
        Outcome::Rejected(reason)
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Resolve an action for the active combatant.
    pub fn take_action(&mut self, action: Action) -> Outcome {
        let actor = match self.begin() {
            Ok(who) => who,
            Err(done) => return done,
        };
        match action {
            Action::Attack { target } => self.attack(target),
            Action::CastSpell { spell, target } => self.cast_spell(actor, &spell, target),
            Action::UseItem { item, target } => self.use_item(actor, &item, target),
            Action::Flee => self.flee(),
        }
    }

    /// Physical attack by the active combatant.
    ///
    /// Player-side attackers must name a living enemy. Enemy-side attackers
    /// pick a random living player and ignore `target`.
    pub fn attack(&mut self, target: Option<usize>) -> Outcome {
        let attacker = match self.begin() {
            Ok(who) => who,
            Err(done) => return done,
        };

        let defender = match attacker.side {
            Faction::Player => {
                let Some(index) = target else {
                    return self.reject(Rejection::InvalidTarget);
                };
                let who = CombatantRef::enemy(index);
                if !self.is_living(who) {
                    return self.reject(Rejection::InvalidTarget);
                }
                who
            }
            Faction::Enemy => {
                let living = self.player.active_indices();
                let pick = self.dice.pick(living.len());
                match living.get(pick) {
                    Some(&index) => CombatantRef::player(index),
                    None => return self.reject(Rejection::InvalidTarget),
                }
            }
        };

        let Some(attacker_entity) = self.entity(attacker) else {
            return self.reject(Rejection::InvalidTarget);
        };
        let attacker_name = attacker_entity.name.clone();
        let strength = attacker_entity.stats().strength;
        let is_boss = attacker_entity.role() == Role::Boss;

        let hit_roll = self.dice.percent();
        let hit = hit_roll <= self.rules.hit_chance;

        let mut damage = 0;
        if hit {
            let ceiling = if is_boss {
                strength / self.rules.boss_damage_divisor.max(1)
            } else {
                strength
            };
            let floor = self.rules.min_physical_damage;
            let raw = self.dice.range(floor, ceiling.max(floor));
            let defense = self
                .entity(defender)
                .map_or(0, |d| d.stats().defense.max(0));
            let mitigation = self.dice.range(0, defense);
            damage = (raw - mitigation).max(0);
            debug!(hit_roll, raw, mitigation, damage, "Attack hit");
        } else {
            debug!(hit_roll, "Attack missed");
        }

        let Some(target_entity) = self.entity_mut(defender) else {
            return self.reject(Rejection::InvalidTarget);
        };
        target_entity.take_damage(damage);
        let defender_name = target_entity.name.clone();
        let defender_health = target_entity.health();
        let defeated = hit && target_entity.is_defeated();

        let (experience, levels_gained) = if defeated {
            self.award_kill(attacker, defender)
        } else {
            (0, 0)
        };

        self.resolve(Outcome::Attack(AttackReport {
            attacker,
            attacker_name,
            defender,
            defender_name,
            hit,
            damage,
            defender_health,
            defeated,
            experience,
            levels_gained,
        }))
    }

    /// Cast a spell from `caster`'s spellbook.
    ///
    /// Damage spells must target a living foe, healing spells a living ally.
    /// Mana is spent as soon as the spell is cast.
    pub fn cast_spell(&mut self, caster: CombatantRef, spell: &str, target: CombatantRef) -> Outcome {
        let active = match self.begin() {
            Ok(who) => who,
            Err(done) => return done,
        };
        if caster != active {
            return self.reject(Rejection::NotYourTurn);
        }
        let Some(caster_entity) = self.entity(caster) else {
            return self.reject(Rejection::InvalidTarget);
        };
        let Some(spell) = caster_entity.spell(spell).cloned() else {
            return self.reject(Rejection::UnknownSpell);
        };
        if !spell.can_cast(caster_entity) {
            return self.reject(Rejection::NotEnoughMana);
        }

        let wanted_side = match spell.effect {
            SpellEffect::Heal => caster.side,
            SpellEffect::Damage => caster.side.opposing(),
        };
        if target.side != wanted_side || !self.is_living(target) {
            return self.reject(Rejection::InvalidTarget);
        }

        let caster_name = caster_entity.name.clone();
        let magic = caster_entity.stats().magic;
        if let Some(caster_entity) = self.entity_mut(caster) {
            caster_entity.spend_mana(spell.mana_cost);
        }
        let magnitude = spell.roll_magnitude(magic, &self.rules, &mut self.dice);
        let target_magic = self.entity(target).map_or(0, |t| t.stats().magic);
        let damage = resisted_damage(magnitude, target_magic, &self.rules);

        let Some(target_entity) = self.entity_mut(target) else {
            return self.reject(Rejection::InvalidTarget);
        };
        let amount = match spell.effect {
            SpellEffect::Heal => target_entity.heal(magnitude),
            SpellEffect::Damage => target_entity.take_damage(damage),
        };
        let target_name = target_entity.name.clone();
        let target_health = target_entity.health();
        let defeated = spell.effect == SpellEffect::Damage && target_entity.is_defeated();
        debug!(spell = %spell.name, magnitude, amount, "Spell resolved");

        let (experience, levels_gained) = if defeated {
            self.award_kill(caster, target)
        } else {
            (0, 0)
        };

        self.resolve(Outcome::Spell(SpellReport {
            caster,
            caster_name,
            target,
            target_name,
            spell: spell.name,
            effect: spell.effect,
            mana_spent: spell.mana_cost,
            amount,
            target_health,
            defeated,
            experience,
            levels_gained,
        }))
    }

    /// Use an item carried by `actor`.
    ///
    /// Healing, mana and buff items target a living ally (the user when
    /// `target` is `None`); damage items need a living foe.
    pub fn use_item(
        &mut self,
        actor: CombatantRef,
        item: &str,
        target: Option<CombatantRef>,
    ) -> Outcome {
        let active = match self.begin() {
            Ok(who) => who,
            Err(done) => return done,
        };
        if actor != active {
            return self.reject(Rejection::NotYourTurn);
        }
        let Some(user) = self.entity(actor) else {
            return self.reject(Rejection::InvalidTarget);
        };
        let Some(known) = user.known_item(item).cloned() else {
            return self.reject(Rejection::Item(ItemError::UnknownItem(item.to_string())));
        };
        let user_name = user.name.clone();

        let target = if known.effect.targets_foes() {
            match target {
                Some(who) if who.side == actor.side.opposing() => who,
                _ => return self.reject(Rejection::InvalidTarget),
            }
        } else {
            let who = target.unwrap_or(actor);
            if who.side != actor.side {
                return self.reject(Rejection::InvalidTarget);
            }
            who
        };
        if !self.is_living(target) {
            return self.reject(Rejection::InvalidTarget);
        }

        let result = if target == actor {
            self.entity_mut(actor)
                .map(|user| user.use_item(&known.name, None))
        } else {
            self.with_pair(actor, target, |user, other| {
                user.use_item(&known.name, Some(other))
            })
        };

        let message = match result {
            Some(Ok(message)) => message,
            Some(Err(err)) => return self.reject(Rejection::Item(err)),
            None => return self.reject(Rejection::InvalidTarget),
        };
        let defeated = self.entity(target).is_some_and(Entity::is_defeated);
        let (experience, levels_gained) = if defeated {
            self.award_kill(actor, target)
        } else {
            (0, 0)
        };

        self.resolve(Outcome::Item(ItemReport {
            user: actor,
            user_name,
            target,
            item: known.name,
            message,
            defeated,
            experience,
            levels_gained,
        }))
    }

    /// Try to leave the encounter. Only the player side may flee.
    pub fn flee(&mut self) -> Outcome {
        let actor = match self.begin() {
            Ok(who) => who,
            Err(done) => return done,
        };
        if actor.side != Faction::Player {
            return self.reject(Rejection::CannotFlee);
        }

        let roll = self.dice.percent();
        if roll <= self.rules.flee_chance {
            debug!(roll, "Flee succeeded");
            return self.finish(CombatState::Fled, Outcome::Fled);
        }
        debug!(roll, "Flee failed");
        self.resolve(Outcome::FleeFailed)
    }

    /// Award experience to a Player who defeated an enemy.
    ///
    /// If the player levels up, the player party's NPCs follow.
    fn award_kill(&mut self, killer: CombatantRef, victim: CombatantRef) -> (u32, u32) {
        if killer.side != Faction::Player || victim.side != Faction::Enemy {
            return (0, 0);
        }
        let experience = self.entity(victim).map_or(0, Entity::experience_value);
        let Some(hero) = self.entity_mut(killer) else {
            return (0, 0);
        };
        if hero.role() != Role::Player {
            return (0, 0);
        }
        let levels = hero.gain_experience(experience);
        let level = hero.level();
        if levels > 0 {
            self.player.synchronize_level(level);
        }
        (experience, levels)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_player_turn(&self) -> bool {
        matches!(self.state, CombatState::AwaitingAction(who) if who.side == Faction::Player)
    }

    pub fn active_ref(&self) -> Option<CombatantRef> {
        match self.state {
            CombatState::AwaitingAction(who) => Some(who),
            _ => None,
        }
    }

    /// The entity whose turn it is.
    pub fn active_combatant(&self) -> Option<&Entity> {
        self.active_ref().and_then(|who| self.entity(who))
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }

    pub fn initiative_order(&self) -> &[Initiative] {
        &self.initiative
    }

    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    /// Status lines for the player party and the enemy party.
    pub fn status_snapshot(&self) -> (Vec<String>, Vec<String>) {
        (self.player.status_lines(), self.enemy.status_lines())
    }

    pub fn player_party(&self) -> &Party {
        self.player
    }

    pub fn enemy_party(&self) -> &Party {
        self.enemy
    }

    /// Snapshot for a command source. `None` once the encounter is over.
    pub fn view(&self) -> Option<BattleView<'_>> {
        self.active_ref().map(|active| BattleView {
            active,
            player: self.player,
            enemy: self.enemy,
            round: self.round,
        })
    }

    pub fn entity(&self, who: CombatantRef) -> Option<&Entity> {
        match who.side {
            Faction::Player => self.player.member(who.index),
            Faction::Enemy => self.enemy.member(who.index),
        }
    }

    /// Mutable access to one combatant. Party membership stays fixed for the
    /// whole encounter.
    pub fn entity_mut(&mut self, who: CombatantRef) -> Option<&mut Entity> {
        match who.side {
            Faction::Player => self.player.member_mut(who.index),
            Faction::Enemy => self.enemy.member_mut(who.index),
        }
    }

    fn is_living(&self, who: CombatantRef) -> bool {
        self.entity(who).is_some_and(Entity::is_alive)
    }

    /// Run `f` with two distinct combatants borrowed mutably.
    fn with_pair<R>(
        &mut self,
        a: CombatantRef,
        b: CombatantRef,
        f: impl FnOnce(&mut Entity, &mut Entity) -> R,
    ) -> Option<R> {
        match (a.side, b.side) {
            (Faction::Player, Faction::Player) => {
                self.player.pair_mut(a.index, b.index).map(|(x, y)| f(x, y))
            }
            (Faction::Enemy, Faction::Enemy) => {
                self.enemy.pair_mut(a.index, b.index).map(|(x, y)| f(x, y))
            }
            (Faction::Player, Faction::Enemy) => {
                let x = self.player.member_mut(a.index)?;
                let y = self.enemy.member_mut(b.index)?;
                Some(f(x, y))
            }
            (Faction::Enemy, Faction::Player) => {
                let x = self.enemy.member_mut(a.index)?;
                let y = self.player.member_mut(b.index)?;
                Some(f(x, y))
            }
        }
    }
}

//! Headless battles driven by the autopilot and scripted commands.

use adventure_core::testing::{enemy_party, player_party, warrior_vs_goblin, ScriptedCommands};
use adventure_core::{
    Action, AutoPilot, BattleResult, BattleView, CombatError, CombatRules, CombatantRef,
    CommandSource, EntityKind, HeadlessBattle, HeadlessConfig, Party, Rejection,
};
use std::collections::VecDeque;

/// Replays actions and asks to retry whenever one is refused.
#[derive(Default)]
struct Retrying {
    actions: VecDeque<Action>,
    refused: Vec<Rejection>,
}

impl CommandSource for Retrying {
    fn next_action(&mut self, view: &BattleView<'_>) -> Action {
        self.actions
            .pop_front()
            .unwrap_or_else(|| AutoPilot.next_action(view))
    }

    fn rejected(&mut self, reason: &Rejection) -> bool {
        self.refused.push(reason.clone());
        true
    }
}

#[test]
fn test_strong_hero_wins() {
    let mut heroes = player_party(&[("Brom", EntityKind::Warrior, 5)]);
    let mut foes = enemy_party(&[("Goblin", EntityKind::Goblin, 1)]);

    let battle = HeadlessBattle::new(HeadlessConfig::new().with_seed(11));
    let report = battle.run(&mut heroes, &mut foes, AutoPilot, AutoPilot).unwrap();

    assert_eq!(report.result, BattleResult::Victory);
    assert_eq!(report.seed, 11);
    assert_eq!(report.log.last().map(String::as_str), Some("Victory!"));
    assert!(!foes.is_alive());
    assert_eq!(heroes.member(0).unwrap().experience(), 20);
}

#[test]
fn test_same_seed_same_battle() {
    let run = |seed| {
        let mut heroes = player_party(&[
            ("Ilsa", EntityKind::Mage, 2),
            ("Sera", EntityKind::Healer, 2),
        ]);
        let mut foes = enemy_party(&[
            ("Goblin", EntityKind::Goblin, 2),
            ("Orc", EntityKind::Orc, 2),
        ]);
        HeadlessBattle::new(HeadlessConfig::new().with_seed(seed))
            .run(&mut heroes, &mut foes, AutoPilot, AutoPilot)
            .unwrap()
    };

    let first = run(99);
    let second = run(99);
    assert_eq!(first.result, second.result);
    assert_eq!(first.turns, second.turns);
    assert_eq!(first.log, second.log);
}

#[test]
fn test_turn_limit_leaves_battle_unfinished() {
    let (mut heroes, mut foes) = warrior_vs_goblin();
    let config = HeadlessConfig::new().with_seed(3).with_max_turns(1);
    let report = HeadlessBattle::new(config)
        .run(&mut heroes, &mut foes, AutoPilot, AutoPilot)
        .unwrap();

    assert_eq!(report.result, BattleResult::Unfinished);
    assert_eq!(report.turns, 1);
    assert_eq!(report.log.len(), 1);
}

#[test]
fn test_rejected_command_falls_back_to_autopilot() {
    let (mut heroes, mut foes) = warrior_vs_goblin();
    let mut commands = ScriptedCommands::new([Action::cast("Meteor", CombatantRef::enemy(0))]);

    let config = HeadlessConfig::new().with_seed(5).with_max_turns(2);
    let report = HeadlessBattle::new(config)
        .run(&mut heroes, &mut foes, &mut commands, AutoPilot)
        .unwrap();

    assert_eq!(commands.issued(), 1);
    assert_eq!(report.turns, 2);
    assert!(report.log.iter().all(|line| !line.starts_with("Turn skipped")));
    assert!(report
        .log
        .iter()
        .any(|line| line.starts_with("Brom hits") || line.starts_with("Brom misses")));
}

#[test]
fn test_rejected_command_is_asked_again() {
    let (mut heroes, mut foes) = warrior_vs_goblin();
    let mut commands = Retrying {
        actions: VecDeque::from([Action::attack(4), Action::attack(0)]),
        ..Default::default()
    };

    let config = HeadlessConfig::new().with_seed(5).with_max_turns(2);
    let report = HeadlessBattle::new(config)
        .run(&mut heroes, &mut foes, &mut commands, AutoPilot)
        .unwrap();

    assert_eq!(commands.refused, vec![Rejection::InvalidTarget]);
    assert!(commands.actions.is_empty());
    // The refused command did not use up a turn.
    assert_eq!(report.turns, 2);
    assert!(report.log.iter().all(|line| !line.starts_with("Turn skipped")));
}

#[test]
fn test_scripted_flee_ends_battle() {
    let (mut heroes, mut foes) = warrior_vs_goblin();
    let commands = ScriptedCommands::new(std::iter::repeat(Action::Flee).take(200));

    let rules = CombatRules::default().with_flee_chance(100);
    let config = HeadlessConfig::new().with_seed(8).with_rules(rules);
    let report = HeadlessBattle::new(config)
        .run(&mut heroes, &mut foes, commands, AutoPilot)
        .unwrap();

    assert_eq!(report.result, BattleResult::Fled);
    assert_eq!(report.log.last().map(String::as_str), Some("Fled the encounter"));
    assert!(foes.is_alive());
}

#[test]
fn test_invalid_parties_are_reported() {
    let mut heroes = Party::player();
    let mut foes = enemy_party(&[("Goblin", EntityKind::Goblin, 1)]);
    let err = HeadlessBattle::default()
        .run(&mut heroes, &mut foes, AutoPilot, AutoPilot)
        .unwrap_err();
    assert!(matches!(err, CombatError::InvalidSetup(_)));
}

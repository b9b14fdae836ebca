//! Party membership, experience and level synchronization.

use adventure_core::entity::BASE_EXPERIENCE_THRESHOLD;
use adventure_core::party::MAX_PARTY_SIZE;
use adventure_core::testing::{enemy_party, player_party};
use adventure_core::{Entity, EntityKind, Faction, InvalidMember, Party, Role, Stat};

// =============================================================================
// Membership
// =============================================================================

#[test]
fn test_scenario_d_party_capacity() {
    let mut party = Party::player();
    for (name, kind) in [
        ("Brom", EntityKind::Warrior),
        ("Dag", EntityKind::Fighter),
        ("Sera", EntityKind::Healer),
        ("Nim", EntityKind::Rogue),
    ] {
        party.add_member(Entity::new(name, kind, 1)).unwrap();
    }
    assert!(party.is_full());

    let err = party
        .add_member(Entity::new("Extra", EntityKind::Fighter, 1))
        .unwrap_err();
    assert_eq!(err, InvalidMember::PartyFull { max: MAX_PARTY_SIZE });
    assert_eq!(party.len(), MAX_PARTY_SIZE);
}

#[test]
fn test_members_must_match_faction() {
    let mut heroes = Party::player();
    assert!(matches!(
        heroes.add_member(Entity::new("Goblin", EntityKind::Goblin, 1)),
        Err(InvalidMember::WrongFaction { .. })
    ));

    let mut foes = Party::enemy();
    assert!(foes
        .add_member(Entity::new("Troll", EntityKind::Troll, 4))
        .is_ok());
    assert!(foes
        .add_member(Entity::new("Sera", EntityKind::Healer, 1))
        .is_err());
    assert_eq!(foes.faction(), Faction::Enemy);
}

#[test]
fn test_aggregates_ignore_defeated_for_activity() {
    let mut foes = enemy_party(&[
        ("Goblin", EntityKind::Goblin, 1),
        ("Orc", EntityKind::Orc, 3),
    ]);
    assert_eq!(foes.average_level(), 2.0);
    assert_eq!(foes.total_health(), 50 + 95);

    foes.member_mut(0).unwrap().set_health(0);
    assert_eq!(foes.active_indices(), vec![1]);
    assert_eq!(foes.active_members().len(), 1);
    assert!(foes.is_alive());
    assert_eq!(foes.total_health(), 95);

    foes.member_mut(1).unwrap().take_damage(500);
    assert!(!foes.is_alive());
    assert_eq!(foes.len(), 2);
}

#[test]
fn test_empty_party_aggregates() {
    let party = Party::player();
    assert_eq!(party.average_level(), 0.0);
    assert_eq!(party.total_health(), 0);
    assert!(!party.is_alive());
}

// =============================================================================
// Progression
// =============================================================================

#[test]
fn test_experience_carries_over() {
    let mut hero = Entity::new("Brom", EntityKind::Warrior, 1);
    assert_eq!(hero.role(), Role::Player);

    let levels = hero.gain_experience(BASE_EXPERIENCE_THRESHOLD + 30);
    assert_eq!(levels, 1);
    assert_eq!(hero.level(), 2);
    assert_eq!(hero.experience(), 30);
    assert_eq!(hero.experience_to_next_level(), 150);
    assert_eq!(hero.stat(Stat::Strength), 25);
    assert_eq!(hero.health(), 120);
}

#[test]
fn test_large_award_gains_several_levels() {
    let mut hero = Entity::new("Ilsa", EntityKind::Mage, 1);
    // 100 + 150 + 225
    assert_eq!(hero.gain_experience(480), 3);
    assert_eq!(hero.level(), 4);
    assert_eq!(hero.experience(), 5);
    assert_eq!(hero.mana().unwrap().max, 45);
}

#[test]
fn test_enemies_never_gain_experience() {
    let mut orc = Entity::new("Orc", EntityKind::Orc, 1);
    assert_eq!(orc.role(), Role::Enemy);
    assert_eq!(orc.gain_experience(1_000), 0);
    assert_eq!(orc.level(), 1);
    assert_eq!(orc.experience(), 0);
}

#[test]
fn test_player_party_sync_only_moves_npcs() {
    let mut heroes = player_party(&[
        ("Brom", EntityKind::Warrior, 1),
        ("Sera", EntityKind::Healer, 1),
        ("Nim", EntityKind::Rogue, 1),
    ]);
    heroes.member_mut(2).unwrap().set_health(0);

    heroes.synchronize_level(3);

    assert_eq!(heroes.member(0).unwrap().level(), 1);
    let sera = heroes.member(1).unwrap();
    assert_eq!(sera.level(), 3);
    assert_eq!(sera.health(), sera.max_health());
    // Fallen companions level up but stay down.
    let nim = heroes.member(2).unwrap();
    assert_eq!(nim.level(), 3);
    assert!(nim.is_defeated());
}

#[test]
fn test_enemy_scaling() {
    assert_eq!(Entity::scaled_enemy("Goblin", EntityKind::Goblin, 2).level(), 1);
    assert_eq!(Entity::scaled_enemy("Goblin", EntityKind::Goblin, 3).level(), 2);
    assert_eq!(Entity::scaled_enemy("Goblin", EntityKind::Goblin, 6).level(), 6);

    let boss = Entity::scaled_boss("Dragon", EntityKind::Dragon, 2, 3);
    assert_eq!(boss.level(), 6);
    assert_eq!(boss.role(), Role::Boss);
}

#[test]
fn test_buffs_stack_and_expire_oldest_first() {
    let mut hero = Entity::new("Vex", EntityKind::Archer, 1);
    hero.apply_buff(Stat::Agility, 5);
    hero.apply_buff(Stat::Agility, 3);
    assert_eq!(hero.stat(Stat::Agility), 33);

    hero.update_buffs();
    assert_eq!(hero.active_buffs(Stat::Agility), vec![3]);
    assert_eq!(hero.stat(Stat::Agility), 28);

    hero.clear_buffs();
    assert!(!hero.has_buffs());
    assert_eq!(hero.stat(Stat::Agility), 25);
}

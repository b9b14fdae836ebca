//! Faction-tagged groups of entities.

use crate::entity::Entity;
use crate::world::{EntityKind, Faction, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most members a party can hold.
pub const MAX_PARTY_SIZE: usize = 4;

/// Why an entity could not join a party.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidMember {
    #[error("Party is full ({max} members)")]
    PartyFull { max: usize },

    #[error("A {kind} cannot join the {faction} party")]
    WrongFaction { kind: EntityKind, faction: Faction },
}

/// A bounded group of entities fighting on the same side.
///
/// Defeated members stay in the party at 0 health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    faction: Faction,
    members: Vec<Entity>,
}

impl Party {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            members: Vec::new(),
        }
    }

    pub fn player() -> Self {
        Self::new(Faction::Player)
    }

    pub fn enemy() -> Self {
        Self::new(Faction::Enemy)
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    /// Add an entity whose role belongs to this party's faction.
    pub fn add_member(&mut self, entity: Entity) -> Result<(), InvalidMember> {
        if self.members.len() >= MAX_PARTY_SIZE {
            return Err(InvalidMember::PartyFull {
                max: MAX_PARTY_SIZE,
            });
        }
        if entity.faction() != self.faction {
            return Err(InvalidMember::WrongFaction {
                kind: entity.kind(),
                faction: self.faction,
            });
        }
        self.members.push(entity);
        Ok(())
    }

    pub fn remove_member(&mut self, index: usize) -> Option<Entity> {
        (index < self.members.len()).then(|| self.members.remove(index))
    }

    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.members.iter_mut()
    }

    pub fn member(&self, index: usize) -> Option<&Entity> {
        self.members.get(index)
    }

    pub fn member_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.members.get_mut(index)
    }

    /// Two distinct members at once. `None` if the indices are equal or out of range.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Entity, &mut Entity)> {
        if a == b || a >= self.members.len() || b >= self.members.len() {
            return None;
        }
        if a < b {
            let (left, right) = self.members.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.members.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_PARTY_SIZE
    }

    /// Members with health above zero, in party order.
    pub fn active_members(&self) -> Vec<&Entity> {
        self.members.iter().filter(|m| m.is_alive()).collect()
    }

    /// Indices of the members with health above zero.
    pub fn active_indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_alive(&self) -> bool {
        self.members.iter().any(Entity::is_alive)
    }

    /// Mean member level; 0 for an empty party.
    pub fn average_level(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        let total: u32 = self.members.iter().map(Entity::level).sum();
        total as f64 / self.members.len() as f64
    }

    pub fn total_health(&self) -> i32 {
        self.members.iter().map(Entity::health).sum()
    }

    /// Push a level onto the party.
    ///
    /// Player parties only move their NPCs; players level through experience.
    /// Enemy parties rebuild every member at the new level; bosses are rebuilt
    /// through [`Entity::scaled_boss`] with this party's size.
    pub fn synchronize_level(&mut self, level: u32) {
        match self.faction {
            Faction::Player => {
                for member in self.members.iter_mut().filter(|m| m.role() == Role::Npc) {
                    member.synchronize_level(level);
                }
            }
            Faction::Enemy => {
                let size = self.members.len();
                for member in self.members.iter_mut() {
                    let name = member.name.clone();
                    let mut rebuilt = match member.role() {
                        Role::Boss => Entity::scaled_boss(name, member.kind(), level, size),
                        _ => Entity::new(name, member.kind(), level),
                    };
                    rebuilt.id = member.id;
                    *member = rebuilt;
                }
            }
        }
    }

    /// One line per member, numbered from 1.
    pub fn status_lines(&self) -> Vec<String> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut line = format!(
                    "{}. {} Lv{} - {}/{} HP",
                    i + 1,
                    m.kind(),
                    m.level(),
                    m.health(),
                    m.max_health()
                );
                if let Some(pool) = m.mana() {
                    line.push_str(&format!(", {}/{} MP", pool.current, pool.max));
                }
                line
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblins(n: usize) -> Party {
        let mut party = Party::enemy();
        for i in 0..n {
            party
                .add_member(Entity::new(format!("Goblin {i}"), EntityKind::Goblin, 1))
                .unwrap();
        }
        party
    }

    #[test]
    fn test_party_full() {
        let mut party = goblins(4);
        let err = party
            .add_member(Entity::new("Orc", EntityKind::Orc, 1))
            .unwrap_err();
        assert_eq!(err, InvalidMember::PartyFull { max: 4 });
        assert_eq!(party.len(), 4);
    }

    #[test]
    fn test_wrong_faction_rejected() {
        let mut heroes = Party::player();
        assert!(matches!(
            heroes.add_member(Entity::new("Orc", EntityKind::Orc, 1)),
            Err(InvalidMember::WrongFaction { .. })
        ));
        heroes
            .add_member(Entity::new("Sera", EntityKind::Healer, 1))
            .unwrap();

        let mut foes = Party::enemy();
        assert!(foes
            .add_member(Entity::new("Brom", EntityKind::Warrior, 1))
            .is_err());
        foes.add_member(Entity::new("Dragon", EntityKind::Dragon, 1))
            .unwrap();
    }

    #[test]
    fn test_active_members_preserve_order() {
        let mut party = goblins(3);
        party.member_mut(1).unwrap().set_health(0);
        let names: Vec<_> = party.active_members().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["Goblin 0", "Goblin 2"]);
        assert_eq!(party.active_indices(), vec![0, 2]);
        assert_eq!(party.len(), 3);
        assert!(party.is_alive());
    }

    #[test]
    fn test_average_level_empty_party() {
        assert_eq!(Party::player().average_level(), 0.0);
        let mut party = goblins(1);
        party
            .add_member(Entity::new("Orc", EntityKind::Orc, 4))
            .unwrap();
        assert_eq!(party.average_level(), 2.5);
    }

    #[test]
    fn test_synchronize_player_party_moves_npcs_only() {
        let mut party = Party::player();
        party
            .add_member(Entity::new("Brom", EntityKind::Warrior, 1))
            .unwrap();
        party
            .add_member(Entity::new("Sera", EntityKind::Healer, 1))
            .unwrap();

        party.synchronize_level(3);
        assert_eq!(party.member(0).unwrap().level(), 1);
        assert_eq!(party.member(1).unwrap().level(), 3);
        assert_eq!(party.member(1).unwrap().max_health(), 80);
    }

    #[test]
    fn test_synchronize_enemy_party_rebuilds() {
        let mut party = goblins(2);
        party.member_mut(0).unwrap().set_health(3);
        let id = party.member(0).unwrap().id;

        party.synchronize_level(2);
        let first = party.member(0).unwrap();
        assert_eq!(first.level(), 2);
        assert_eq!(first.health(), 60);
        assert_eq!(first.kind(), EntityKind::Goblin);
        assert_eq!(first.id, id);
    }

    #[test]
    fn test_synchronize_enemy_party_scales_bosses() {
        let mut party = goblins(1);
        party
            .add_member(Entity::new("Troll", EntityKind::Troll, 1))
            .unwrap();

        party.synchronize_level(3);
        assert_eq!(party.member(0).unwrap().level(), 3);
        // 3 + party size 2 + 1
        let troll = party.member(1).unwrap();
        assert_eq!(troll.level(), 6);
        assert_eq!(troll.kind(), EntityKind::Troll);
    }

    #[test]
    fn test_status_lines() {
        let mut party = Party::player();
        party
            .add_member(Entity::new("Brom", EntityKind::Warrior, 1))
            .unwrap();
        party
            .add_member(Entity::new("Ilsa", EntityKind::Mage, 2))
            .unwrap();
        assert_eq!(
            party.status_lines(),
            vec![
                "1. Warrior Lv1 - 100/100 HP".to_string(),
                "2. Mage Lv2 - 70/70 HP, 35/35 MP".to_string(),
            ]
        );
        assert_eq!(party.status_lines(), party.status_lines());
    }

    #[test]
    fn test_pair_mut() {
        let mut party = goblins(3);
        let (a, b) = party.pair_mut(2, 0).unwrap();
        assert_eq!(a.name, "Goblin 2");
        assert_eq!(b.name, "Goblin 0");
        assert!(party.pair_mut(1, 1).is_none());
        assert!(party.pair_mut(0, 5).is_none());
    }

    #[test]
    fn test_remove_member() {
        let mut party = goblins(2);
        assert_eq!(party.remove_member(0).unwrap().name, "Goblin 0");
        assert!(party.remove_member(5).is_none());
        assert_eq!(party.len(), 1);
    }
}

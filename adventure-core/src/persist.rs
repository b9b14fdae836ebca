//! Save/load for the player record.
//!
//! A save file is a small JSON document:
//!
//! ```json
//! {
//!   "player": { "class": "Mage", "level": 3, "experience": 40,
//!               "stats": { "Strength": 14, ... },
//!               "current_mana": 22, "max_mana": 40 },
//!   "location": "Dark Forest",
//!   "timestamp": "2024-05-01 18:22:10"
//! }
//! ```

use crate::entity::Entity;
use crate::world::{EntityKind, StatBlock};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Save slot {0} out of range (1-5)")]
    SlotOutOfRange(u8),

    #[error("Unknown class in save file: {0}")]
    UnknownClass(String),
}

/// Number of numbered manual save slots.
pub const MAX_SAVE_SLOTS: u8 = 5;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The persisted part of a player entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub class: String,
    pub level: u32,
    pub experience: u32,
    pub stats: StatBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mana: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mana: Option<i32>,
}

impl SavedPlayer {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            class: entity.kind().name().to_string(),
            level: entity.level(),
            experience: entity.experience(),
            stats: *entity.stats(),
            current_mana: entity.mana().map(|m| m.current),
            max_mana: entity.mana().map(|m| m.max),
        }
    }

    /// Rebuild an entity from the record.
    ///
    /// Stats are recomputed for the saved level; current health and mana
    /// come from the record.
    pub fn restore(&self, name: impl Into<String>) -> Result<Entity, PersistError> {
        let kind: EntityKind = self
            .class
            .parse()
            .map_err(|_| PersistError::UnknownClass(self.class.clone()))?;

        let mut entity = Entity::new(name, kind, self.level);
        entity.restore_progress(self.level, self.experience);
        entity.set_health(self.stats.health);
        if let (Some(current), Some(pool)) = (self.current_mana, entity.mana_mut()) {
            pool.current = current.clamp(0, pool.max);
        }
        Ok(entity)
    }
}

/// A complete save file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub player: SavedPlayer,
    pub location: String,
    pub timestamp: String,
}

impl SavedGame {
    pub fn new(player: &Entity, location: impl Into<String>) -> Self {
        Self {
            player: SavedPlayer::from_entity(player),
            location: location.into(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Which file a save goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSlot {
    /// The single autosave file.
    Auto,
    /// A numbered slot, 1 through [`MAX_SAVE_SLOTS`].
    Slot(u8),
    /// A new file named after the current time.
    Timestamped,
}

impl SaveSlot {
    fn file_name(&self) -> Result<String, PersistError> {
        match self {
            SaveSlot::Auto => Ok("autosave.json".to_string()),
            SaveSlot::Slot(n) if (1..=MAX_SAVE_SLOTS).contains(n) => Ok(format!("save_{n}.json")),
            SaveSlot::Slot(n) => Err(PersistError::SlotOutOfRange(*n)),
            SaveSlot::Timestamped => Ok(format!(
                "save_{}.json",
                Local::now().format("%Y%m%d_%H%M%S")
            )),
        }
    }
}

/// Information about a save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    /// Path to the save file.
    pub path: PathBuf,
    pub class: String,
    pub level: u32,
    pub location: String,
    pub timestamp: String,
}

/// A directory of save files.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// Open a save directory, creating it if needed.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the player's record. Returns the file written.
    pub async fn save(
        &self,
        player: &Entity,
        location: &str,
        slot: SaveSlot,
    ) -> Result<PathBuf, PersistError> {
        let path = self.dir.join(slot.file_name()?);
        SavedGame::new(player, location).save_json(&path).await?;
        info!(path = %path.display(), "Game saved");
        Ok(path)
    }

    /// Load a save file by name. `None` if it does not exist.
    pub async fn load(&self, file_name: &str) -> Result<Option<SavedGame>, PersistError> {
        let path = self.dir.join(file_name);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(SavedGame::load_json(&path).await?))
    }

    /// All readable saves, newest first.
    pub async fn list_saves(&self) -> Result<Vec<SaveInfo>, PersistError> {
        let mut saves = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match SavedGame::load_json(&path).await {
                Ok(saved) => saves.push(SaveInfo {
                    path,
                    class: saved.player.class,
                    level: saved.player.level,
                    location: saved.location,
                    timestamp: saved.timestamp,
                }),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable save"),
            }
        }

        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.path.cmp(&b.path)));
        Ok(saves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_player_layout() {
        let mage = Entity::new("Ilsa", EntityKind::Mage, 2);
        let saved = SavedGame::new(&mage, "Dark Forest");
        let json = serde_json::to_value(&saved).unwrap();

        assert_eq!(json["player"]["class"], "Mage");
        assert_eq!(json["player"]["level"], 2);
        assert_eq!(json["player"]["stats"]["Magic"], 35);
        assert_eq!(json["player"]["current_mana"], 35);
        assert_eq!(json["player"]["max_mana"], 35);
        assert_eq!(json["location"], "Dark Forest");
        assert_eq!(saved.timestamp.len(), "2024-01-01 00:00:00".len());
    }

    #[test]
    fn test_no_mana_keys_for_warriors() {
        let warrior = Entity::new("Brom", EntityKind::Warrior, 1);
        let json = serde_json::to_value(SavedPlayer::from_entity(&warrior)).unwrap();
        assert!(json.get("current_mana").is_none());
        assert!(json.get("max_mana").is_none());
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(SaveSlot::Auto.file_name().unwrap(), "autosave.json");
        assert_eq!(SaveSlot::Slot(3).file_name().unwrap(), "save_3.json");
        assert!(matches!(
            SaveSlot::Slot(6).file_name(),
            Err(PersistError::SlotOutOfRange(6))
        ));
        assert!(SaveSlot::Slot(0).file_name().is_err());
    }

    #[test]
    fn test_restore_unknown_class() {
        let mut saved = SavedPlayer::from_entity(&Entity::new("Brom", EntityKind::Warrior, 1));
        saved.class = "Paladin".to_string();
        assert!(matches!(
            saved.restore("Brom"),
            Err(PersistError::UnknownClass(_))
        ));
    }
}

//! Constructor session state that survives restarts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tableau_common::{BattlemapId, ChapterId, SchemaVersion, TableauError, TableauResult};
use tracing::{info, warn};

use crate::entity::Entity;
use crate::scene::ChapterData;

/// Open chapter, active battlemap and the last snapshots of each.
///
/// Loaded once on startup and written through after every constructor
/// mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    /// Format version
    pub version: SchemaVersion,
    /// Open chapter
    pub chapter_id: Option<ChapterId>,
    /// Active combat scene
    pub battlemap_id: BattlemapId,
    /// Last chapter snapshot
    pub chapter_data: ChapterData,
    /// Last entity snapshot for the active scene
    pub entity_data: Vec<Entity>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: SchemaVersion::APP_STATE,
            chapter_id: None,
            battlemap_id: BattlemapId::none(),
            chapter_data: ChapterData::default(),
            entity_data: Vec::new(),
        }
    }
}

impl AppState {
    /// Loads state from a file, falling back to defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("No saved state, starting fresh");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read state file: {e}");
                return Self::default();
            },
        };

        let parsed = serde_json::from_str::<Self>(&contents)
            .map_err(|e| TableauError::Serialization(e.to_string()))
            .and_then(|state| {
                SchemaVersion::APP_STATE.ensure_readable(&state.version)?;
                Ok(state)
            });
        match parsed {
            Ok(state) => {
                info!("Restored state from {}", path.display());
                state
            },
            Err(e) => {
                warn!("Ignoring state file {}: {e}", path.display());
                Self::default()
            },
        }
    }

    /// Writes state atomically (temp file, then rename).
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> TableauResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TableauError::Serialization(e.to_string()))?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Forgets the active scene and its entities.
    pub fn clear_scene(&mut self) {
        self.battlemap_id = BattlemapId::none();
        self.entity_data.clear();
    }
}

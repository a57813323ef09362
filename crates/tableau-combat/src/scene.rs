//! Chapter and combat scene data.

use serde::{Deserialize, Serialize};
use tableau_common::{BattlemapId, Offset};

use crate::entity::Allegiance;

/// Battlemap scale and hex size given to freshly created scenes.
pub const DEFAULT_SCENE_SIZE: u32 = 100;

/// Splash art shown on the campaign display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Splash {
    /// Border colour side
    pub allegiance: Allegiance,
    /// Image file name
    pub image: String,
}

/// One battlemap plus its grid configuration.
///
/// `grid_size` is the hex size in pixels and the only input that triggers a
/// geometry recomputation on the display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatScene {
    /// Battlemap image, also the scene id
    pub battlemap: BattlemapId,
    /// Battlemap scale in percent
    #[serde(rename = "mapsize")]
    pub map_size: u32,
    /// Battlemap offset in pixels
    #[serde(rename = "mapoffset")]
    pub map_offset: Offset,
    /// Hex size in pixels
    #[serde(rename = "gridsize")]
    pub grid_size: u32,
    /// Grid overlay offset in pixels
    #[serde(rename = "gridoffset")]
    pub grid_offset: Offset,
    /// Entity file names placed on this scene
    #[serde(default)]
    pub entities: Vec<String>,
}

impl CombatScene {
    /// A new scene with default scale and grid size.
    #[must_use]
    pub fn new(battlemap: BattlemapId) -> Self {
        Self {
            battlemap,
            map_size: DEFAULT_SCENE_SIZE,
            map_offset: Offset::ZERO,
            grid_size: DEFAULT_SCENE_SIZE,
            grid_offset: Offset::ZERO,
            entities: Vec::new(),
        }
    }

    /// Whether this is the empty fallback scene.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battlemap.is_none()
    }
}

/// Everything a chapter holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterData {
    /// Combat scenes
    #[serde(default)]
    pub combat: Vec<CombatScene>,
    /// Landscape images
    #[serde(default)]
    pub landscapes: Vec<String>,
    /// Splash art
    #[serde(default)]
    pub splashes: Vec<Splash>,
}

impl ChapterData {
    /// Finds a combat scene by battlemap id.
    #[must_use]
    pub fn find_combat(&self, battlemap: &BattlemapId) -> Option<&CombatScene> {
        self.combat.iter().find(|c| &c.battlemap == battlemap)
    }

    /// Mutable variant of [`Self::find_combat`].
    pub fn find_combat_mut(&mut self, battlemap: &BattlemapId) -> Option<&mut CombatScene> {
        self.combat.iter_mut().find(|c| &c.battlemap == battlemap)
    }

    /// Finds a scene or falls back to the empty scene.
    ///
    /// A miss is normal while snapshots are still arriving.
    #[must_use]
    pub fn combat_or_default(&self, battlemap: &BattlemapId) -> CombatScene {
        self.find_combat(battlemap).cloned().unwrap_or_default()
    }
}

/// A change to a scene's battlemap or grid alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEdit {
    /// Battlemap scale in percent
    MapSize(u32),
    /// Battlemap offset
    MapOffset(Offset),
    /// Hex size in pixels
    GridSize(u32),
    /// Grid overlay offset
    GridOffset(Offset),
}

impl SceneEdit {
    /// Resets the battlemap scale.
    #[must_use]
    pub const fn reset_map_size() -> Self {
        Self::MapSize(DEFAULT_SCENE_SIZE)
    }

    /// Resets the hex size.
    #[must_use]
    pub const fn reset_grid_size() -> Self {
        Self::GridSize(DEFAULT_SCENE_SIZE)
    }

    /// Applies the edit in place.
    pub fn apply(self, scene: &mut CombatScene) {
        match self {
            Self::MapSize(size) => scene.map_size = size,
            Self::MapOffset(offset) => scene.map_offset = offset,
            Self::GridSize(size) => scene.grid_size = size,
            Self::GridOffset(offset) => scene.grid_offset = offset,
        }
    }

    /// Whether the display's grid geometry depends on this edit.
    #[must_use]
    pub const fn changes_geometry(self) -> bool {
        matches!(self, Self::GridSize(_))
    }
}

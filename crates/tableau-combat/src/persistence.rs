//! Collaborator seams: chapter/entity persistence and grid overlay rendering.
//!
//! Implementations live outside this crate. [`MemoryPersistence`] is an
//! in-memory store for embedding and tests.

use std::path::PathBuf;

use ahash::AHashMap;
use tableau_common::{BattlemapId, ChapterId, IconId, StoreError, TableauError};

use crate::entity::Entity;
use crate::scene::{ChapterData, CombatScene};

/// Entity file extension inside a scene's entity list.
const ENTITY_EXTENSION: &str = ".json";

/// Entity file name for an icon: `<stem>.json`.
pub fn entity_file_name(icon: &IconId) -> Result<String, StoreError> {
    icon.stem()
        .filter(|stem| !stem.is_empty())
        .map(|stem| format!("{stem}{ENTITY_EXTENSION}"))
        .ok_or_else(|| StoreError::InvalidIcon(icon.to_string()))
}

/// Icon for an entity file name: `<stem>.json` becomes `<stem>.png`.
#[must_use]
pub fn icon_for_file(file_name: &str) -> Option<IconId> {
    file_name
        .strip_suffix(ENTITY_EXTENSION)
        .filter(|stem| !stem.is_empty())
        .map(|stem| IconId::new(format!("{stem}.png")))
}

/// Chapter and entity storage owned by the constructor surface.
///
/// Calls are synchronous; a failure means the next snapshot will not
/// reflect the attempted change.
pub trait Persistence {
    /// Loads a whole chapter.
    fn chapter_data(&self, chapter: &ChapterId) -> Result<ChapterData, StoreError>;

    /// Loads the entities placed on a combat scene, in scene order.
    fn entities(
        &self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
    ) -> Result<Vec<Entity>, StoreError>;

    /// Overwrites an existing entity.
    fn update_entity(&mut self, entity: &Entity) -> Result<(), StoreError>;

    /// Creates an entity and places it on a scene.
    fn add_entity(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
        entity: &Entity,
    ) -> Result<(), StoreError>;

    /// Removes an entity from a scene and deletes it.
    fn remove_entity(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
        icon: &IconId,
    ) -> Result<(), StoreError>;

    /// Overwrites a scene's battlemap and grid settings.
    fn update_scene(&mut self, chapter: &ChapterId, scene: &CombatScene)
        -> Result<(), StoreError>;
}

/// Parameters for rasterizing the hex grid overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRequest {
    /// Canvas width in pixels
    pub container_width: u32,
    /// Canvas height in pixels
    pub container_height: u32,
    /// Hex size in pixels
    pub hex_size: u32,
    /// Extra rings past the canvas edge
    pub overflow: u32,
    /// PNG destination
    pub output_path: PathBuf,
}

/// What an overlay render call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStatus {
    /// A new image was written.
    Rendered,
    /// The existing image already matched the request.
    Cached,
}

/// Rasterizes the grid overlay with the same spacing as the display geometry.
pub trait OverlayRenderer {
    /// Renders (or reuses) the overlay image for a request.
    fn render(&mut self, request: &OverlayRequest) -> Result<OverlayStatus, TableauError>;
}

/// In-memory [`Persistence`].
#[derive(Debug, Default, Clone)]
pub struct MemoryPersistence {
    chapters: AHashMap<ChapterId, ChapterData>,
    entities: AHashMap<IconId, Entity>,
    fail_writes: bool,
}

impl MemoryPersistence {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a chapter.
    pub fn insert_chapter(&mut self, chapter: ChapterId, data: ChapterData) {
        self.chapters.insert(chapter, data);
    }

    /// Makes every subsequent write fail with an I/O error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "store is read-only",
            )));
        }
        Ok(())
    }

    fn scene_mut(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
    ) -> Result<&mut CombatScene, StoreError> {
        self.chapters
            .get_mut(chapter)
            .ok_or_else(|| StoreError::ChapterNotFound(chapter.to_string()))?
            .find_combat_mut(battlemap)
            .ok_or_else(|| StoreError::BattlemapNotFound {
                battlemap: battlemap.to_string(),
                chapter: chapter.to_string(),
            })
    }
}

impl Persistence for MemoryPersistence {
    fn chapter_data(&self, chapter: &ChapterId) -> Result<ChapterData, StoreError> {
        self.chapters
            .get(chapter)
            .cloned()
            .ok_or_else(|| StoreError::ChapterNotFound(chapter.to_string()))
    }

    fn entities(
        &self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
    ) -> Result<Vec<Entity>, StoreError> {
        let data = self
            .chapters
            .get(chapter)
            .ok_or_else(|| StoreError::ChapterNotFound(chapter.to_string()))?;
        let Some(scene) = data.find_combat(battlemap) else {
            return Ok(Vec::new());
        };
        scene
            .entities
            .iter()
            .map(|file| {
                icon_for_file(file)
                    .and_then(|icon| self.entities.get(&icon).cloned())
                    .ok_or_else(|| StoreError::EntityNotFound(file.clone()))
            })
            .collect()
    }

    fn update_entity(&mut self, entity: &Entity) -> Result<(), StoreError> {
        self.check_writable()?;
        let slot = self
            .entities
            .get_mut(&entity.icon)
            .ok_or_else(|| StoreError::EntityNotFound(entity.icon.to_string()))?;
        *slot = entity.clone();
        Ok(())
    }

    fn add_entity(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
        entity: &Entity,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let file = entity_file_name(&entity.icon)?;
        if self.entities.contains_key(&entity.icon) {
            return Err(StoreError::DuplicateEntity(entity.icon.to_string()));
        }
        self.scene_mut(chapter, battlemap)?.entities.push(file);
        self.entities.insert(entity.icon.clone(), entity.clone());
        Ok(())
    }

    fn remove_entity(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
        icon: &IconId,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let file = entity_file_name(icon)?;
        let scene = self.scene_mut(chapter, battlemap)?;
        let before = scene.entities.len();
        scene.entities.retain(|f| f != &file);
        if scene.entities.len() == before {
            return Err(StoreError::EntityNotFound(icon.to_string()));
        }
        self.entities.remove(icon);
        Ok(())
    }

    fn update_scene(
        &mut self,
        chapter: &ChapterId,
        scene: &CombatScene,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        let stored = self.scene_mut(chapter, &scene.battlemap)?;
        let entities = std::mem::take(&mut stored.entities);
        *stored = CombatScene {
            entities,
            ..scene.clone()
        };
        Ok(())
    }
}

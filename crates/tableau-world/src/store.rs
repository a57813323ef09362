//! JSON file store for chapters and entities.
//!
//! Layout under the root directory:
//! - `chapters/<chapter>.json`: one [`ChapterData`] per chapter
//! - `entities/<stem>.json`: one [`Entity`] per placed token
//!
//! Every write goes to a temp file first and is renamed into place.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tableau_combat::{
    entity_file_name, icon_for_file, ChapterData, CombatScene, Entity, Persistence,
};
use tableau_common::{BattlemapId, ChapterId, IconId, StoreError};
use tracing::{debug, info, warn};

const CHAPTERS_DIR: &str = "chapters";
const ENTITIES_DIR: &str = "entities";

/// File-backed [`Persistence`].
#[derive(Debug, Clone)]
pub struct ChapterStore {
    root: PathBuf,
}

impl ChapterStore {
    /// Opens a store, creating its directories if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(CHAPTERS_DIR))?;
        fs::create_dir_all(root.join(ENTITIES_DIR))?;
        debug!("Opened chapter store at {}", root.display());
        Ok(Self { root })
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chapter_path(&self, chapter: &ChapterId) -> PathBuf {
        self.root
            .join(CHAPTERS_DIR)
            .join(format!("{}.json", chapter.file_stem()))
    }

    fn entity_path(&self, file_name: &str) -> PathBuf {
        self.root.join(ENTITIES_DIR).join(file_name)
    }

    fn read_chapter(&self, chapter: &ChapterId) -> Result<ChapterData, StoreError> {
        let path = self.chapter_path(chapter);
        if !path.exists() {
            return Err(StoreError::ChapterNotFound(chapter.to_string()));
        }
        read_json(&path)
    }

    fn write_chapter(&self, chapter: &ChapterId, data: &ChapterData) -> Result<(), StoreError> {
        write_json(&self.chapter_path(chapter), data)
    }

    /// Creates an empty chapter.
    pub fn create_chapter(&self, chapter: &ChapterId) -> Result<(), StoreError> {
        let path = self.chapter_path(chapter);
        if path.exists() {
            return Err(StoreError::ChapterExists(chapter.to_string()));
        }
        write_json(&path, &ChapterData::default())?;
        info!(%chapter, "chapter created");
        Ok(())
    }

    /// Deletes a chapter file. Entity files are left alone.
    pub fn remove_chapter(&self, chapter: &ChapterId) -> Result<(), StoreError> {
        let path = self.chapter_path(chapter);
        if !path.exists() {
            return Err(StoreError::ChapterNotFound(chapter.to_string()));
        }
        fs::remove_file(path)?;
        info!(%chapter, "chapter removed");
        Ok(())
    }

    /// Chapter ids found on disk, sorted by file name.
    ///
    /// Names are rebuilt from file stems, so `act_one.json` lists as
    /// `Act One`.
    pub fn list_chapters(&self) -> Result<Vec<ChapterId>, StoreError> {
        let mut stems: Vec<String> = fs::read_dir(self.root.join(CHAPTERS_DIR))?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        stems.sort();
        Ok(stems.iter().map(|stem| chapter_from_stem(stem)).collect())
    }

    /// Adds a combat scene for a battlemap. Existing scenes are returned
    /// unchanged.
    pub fn create_combat(
        &self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
    ) -> Result<CombatScene, StoreError> {
        let mut data = self.read_chapter(chapter)?;
        if let Some(existing) = data.find_combat(battlemap) {
            debug!(%battlemap, "combat already exists");
            return Ok(existing.clone());
        }
        let scene = CombatScene::new(battlemap.clone());
        data.combat.push(scene.clone());
        self.write_chapter(chapter, &data)?;
        info!(%chapter, %battlemap, "combat created");
        Ok(scene)
    }

    /// Removes a combat scene and the entity files placed on it.
    pub fn remove_combat(
        &self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
    ) -> Result<(), StoreError> {
        let mut data = self.read_chapter(chapter)?;
        let index = data
            .combat
            .iter()
            .position(|c| &c.battlemap == battlemap)
            .ok_or_else(|| StoreError::BattlemapNotFound {
                battlemap: battlemap.to_string(),
                chapter: chapter.to_string(),
            })?;
        let scene = data.combat.remove(index);
        self.write_chapter(chapter, &data)?;

        for file in &scene.entities {
            if let Err(e) = fs::remove_file(self.entity_path(file)) {
                warn!("Failed to delete entity file {file}: {e}");
            }
        }
        info!(%chapter, %battlemap, "combat removed");
        Ok(())
    }
}

impl Persistence for ChapterStore {
    fn chapter_data(&self, chapter: &ChapterId) -> Result<ChapterData, StoreError> {
        self.read_chapter(chapter)
    }

    fn entities(
        &self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
    ) -> Result<Vec<Entity>, StoreError> {
        let data = self.read_chapter(chapter)?;
        let Some(scene) = data.find_combat(battlemap) else {
            debug!(%battlemap, "no such combat, no entities");
            return Ok(Vec::new());
        };
        scene
            .entities
            .iter()
            .map(|file| {
                let path = self.entity_path(file);
                if icon_for_file(file).is_none() || !path.exists() {
                    return Err(StoreError::EntityNotFound(file.clone()));
                }
                read_json(&path)
            })
            .collect()
    }

    fn update_entity(&mut self, entity: &Entity) -> Result<(), StoreError> {
        let path = self.entity_path(&entity_file_name(&entity.icon)?);
        if !path.exists() {
            return Err(StoreError::EntityNotFound(entity.icon.to_string()));
        }
        write_json(&path, entity)
    }

    fn add_entity(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
        entity: &Entity,
    ) -> Result<(), StoreError> {
        let file = entity_file_name(&entity.icon)?;
        let path = self.entity_path(&file);
        if path.exists() {
            return Err(StoreError::DuplicateEntity(entity.icon.to_string()));
        }

        let mut data = self.read_chapter(chapter)?;
        let scene = data
            .find_combat_mut(battlemap)
            .ok_or_else(|| StoreError::BattlemapNotFound {
                battlemap: battlemap.to_string(),
                chapter: chapter.to_string(),
            })?;
        scene.entities.push(file);

        write_json(&path, entity)?;
        self.write_chapter(chapter, &data)
    }

    fn remove_entity(
        &mut self,
        chapter: &ChapterId,
        battlemap: &BattlemapId,
        icon: &IconId,
    ) -> Result<(), StoreError> {
        let file = entity_file_name(icon)?;
        let mut data = self.read_chapter(chapter)?;
        let scene = data
            .find_combat_mut(battlemap)
            .ok_or_else(|| StoreError::BattlemapNotFound {
                battlemap: battlemap.to_string(),
                chapter: chapter.to_string(),
            })?;
        let before = scene.entities.len();
        scene.entities.retain(|f| f != &file);
        if scene.entities.len() == before {
            return Err(StoreError::EntityNotFound(icon.to_string()));
        }
        self.write_chapter(chapter, &data)?;

        let path = self.entity_path(&file);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn update_scene(
        &mut self,
        chapter: &ChapterId,
        scene: &CombatScene,
    ) -> Result<(), StoreError> {
        let mut data = self.read_chapter(chapter)?;
        let stored = data
            .find_combat_mut(&scene.battlemap)
            .ok_or_else(|| StoreError::BattlemapNotFound {
                battlemap: scene.battlemap.to_string(),
                chapter: chapter.to_string(),
            })?;
        stored.map_size = scene.map_size;
        stored.map_offset = scene.map_offset;
        stored.grid_size = scene.grid_size;
        stored.grid_offset = scene.grid_offset;
        self.write_chapter(chapter, &data)
    }
}

/// Rebuilds a display name from a file stem: `act_one` becomes `Act One`.
fn chapter_from_stem(stem: &str) -> ChapterId {
    let words: Vec<String> = stem
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect();
    ChapterId::new(words.join(" "))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Atomic write: temp file, flush, rename.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let temp_path = path.with_extension("json.tmp");
    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StoreError::Io(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tableau_combat::{Allegiance, EntitySize, SceneEdit};
    use tableau_common::GridCoord;

    fn store_with_scene() -> (tempfile::TempDir, ChapterStore, ChapterId, BattlemapId) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ChapterStore::open(dir.path()).expect("open");
        let chapter = ChapterId::new("Chapter One");
        let battlemap = BattlemapId::new("crypt.png");
        store.create_chapter(&chapter).expect("create chapter");
        store.create_combat(&chapter, &battlemap).expect("create combat");
        (dir, store, chapter, battlemap)
    }

    #[test]
    fn test_chapter_file_name() {
        let (dir, store, chapter, _) = store_with_scene();
        assert!(dir.path().join("chapters").join("chapter_one.json").exists());
        assert!(matches!(
            store.create_chapter(&chapter),
            Err(StoreError::ChapterExists(_))
        ));
        assert_eq!(store.list_chapters().expect("list"), vec![chapter]);
    }

    #[test]
    fn test_new_combat_defaults() {
        let (_dir, store, chapter, battlemap) = store_with_scene();
        let data = store.chapter_data(&chapter).expect("chapter");
        let scene = data.find_combat(&battlemap).expect("scene");
        assert_eq!(scene.map_size, 100);
        assert_eq!(scene.grid_size, 100);
        assert!(scene.entities.is_empty());

        // Creating it again is a no-op.
        store.create_combat(&chapter, &battlemap).expect("again");
        assert_eq!(store.chapter_data(&chapter).expect("chapter").combat.len(), 1);
    }

    #[test]
    fn test_entity_files() {
        let (dir, mut store, chapter, battlemap) = store_with_scene();
        let orc = Entity::new(IconId::new("k9f2.png"), Allegiance::Hostile, EntitySize::Large);

        store.add_entity(&chapter, &battlemap, &orc).expect("add");
        let entity_file = dir.path().join("entities").join("k9f2.json");
        assert!(entity_file.exists());

        let moved = orc.clone().at(GridCoord::new(6, 1));
        store.update_entity(&moved).expect("update");
        assert_eq!(
            store.entities(&chapter, &battlemap).expect("entities"),
            vec![moved]
        );

        store
            .remove_entity(&chapter, &battlemap, &orc.icon)
            .expect("remove");
        assert!(!entity_file.exists());
        assert!(store.entities(&chapter, &battlemap).expect("entities").is_empty());
    }

    #[test]
    fn test_rejections() {
        let (_dir, mut store, chapter, battlemap) = store_with_scene();
        let stray = Entity::new(IconId::new("nope.png"), Allegiance::Neutral, EntitySize::Small);
        assert!(matches!(
            store.update_entity(&stray),
            Err(StoreError::EntityNotFound(_))
        ));
        let bad = Entity::new(IconId::new("bad.gif"), Allegiance::Neutral, EntitySize::Small);
        assert!(matches!(
            store.add_entity(&chapter, &battlemap, &bad),
            Err(StoreError::InvalidIcon(_))
        ));
        assert!(matches!(
            store.chapter_data(&ChapterId::new("Missing")),
            Err(StoreError::ChapterNotFound(_))
        ));
    }

    #[test]
    fn test_scene_update_and_missing_scene() {
        let (_dir, mut store, chapter, battlemap) = store_with_scene();
        let mut scene = CombatScene::new(battlemap.clone());
        SceneEdit::GridSize(64).apply(&mut scene);
        store.update_scene(&chapter, &scene).expect("update");
        let data = store.chapter_data(&chapter).expect("chapter");
        assert_eq!(data.find_combat(&battlemap).map(|s| s.grid_size), Some(64));

        let entities = store
            .entities(&chapter, &BattlemapId::new("elsewhere.png"))
            .expect("lookup miss is not an error");
        assert!(entities.is_empty());
    }

    #[test]
    fn test_remove_combat_deletes_entities() {
        let (dir, mut store, chapter, battlemap) = store_with_scene();
        let orc = Entity::new(IconId::new("orc.png"), Allegiance::Hostile, EntitySize::Small);
        store.add_entity(&chapter, &battlemap, &orc).expect("add");

        store.remove_combat(&chapter, &battlemap).expect("remove");
        assert!(!dir.path().join("entities").join("orc.json").exists());
        assert!(store.chapter_data(&chapter).expect("chapter").combat.is_empty());
        assert!(store.remove_combat(&chapter, &battlemap).is_err());
    }

    #[test]
    fn test_no_temp_files_left() {
        let (dir, _store, _, _) = store_with_scene();
        let leftovers = fs::read_dir(dir.path().join("chapters"))
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    proptest! {
        #[test]
        fn prop_listed_name_maps_back_to_same_file(words in prop::collection::vec("[a-z]{1,8}", 1..4)) {
            let name = words.join(" ");
            let listed = chapter_from_stem(&ChapterId::new(name.clone()).file_stem());
            prop_assert_eq!(listed.file_stem(), ChapterId::new(name).file_stem());
        }
    }
}

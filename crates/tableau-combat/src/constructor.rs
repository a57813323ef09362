//! The constructor surface: authoritative owner of chapter and entity data.
//!
//! Every mutation goes through [`Persistence`] first and is then re-read and
//! re-broadcast as a full snapshot, so the display only ever shows what was
//! actually stored.

use std::path::PathBuf;

use tableau_common::{BattlemapId, ChapterId, IconId, StoreError, TableauResult};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::entity::{Entity, EntityEdit};
use crate::persistence::{OverlayRenderer, OverlayRequest, OverlayStatus, Persistence};
use crate::roster::EntityStore;
use crate::scene::{ChapterData, CombatScene, SceneEdit};
use crate::sync::{ConstructorLink, SceneSignal, Snapshot, ToConstructor, ToDisplay};

/// Where and at what size overlays are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySettings {
    /// Directory receiving `<battlemap>` overlay images
    pub dir: PathBuf,
    /// Canvas width in pixels
    pub container_width: u32,
    /// Canvas height in pixels
    pub container_height: u32,
    /// Extra rings past the canvas edge
    pub overflow: u32,
}

struct OverlayBinding {
    renderer: Box<dyn OverlayRenderer>,
    settings: OverlaySettings,
}

/// Constructor-side session.
pub struct ConstructorSurface<P: Persistence> {
    store: P,
    link: ConstructorLink,
    state: AppState,
    state_path: Option<PathBuf>,
    roster: EntityStore,
    selected: Option<IconId>,
    overlay: Option<OverlayBinding>,
    seq: u64,
}

impl<P: Persistence> ConstructorSurface<P> {
    /// Creates a surface with fresh state.
    pub fn new(store: P, link: ConstructorLink) -> Self {
        Self {
            store,
            link,
            state: AppState::default(),
            state_path: None,
            roster: EntityStore::new(),
            selected: None,
            overlay: None,
            seq: 0,
        }
    }

    /// Restores a previous session and writes state through to `path` from
    /// now on.
    #[must_use]
    pub fn with_state(mut self, state: AppState, path: Option<PathBuf>) -> Self {
        self.roster = EntityStore::from_snapshot(state.entity_data.clone());
        self.state = state;
        self.state_path = path;
        self
    }

    /// Regenerates overlays on grid size edits.
    #[must_use]
    pub fn with_overlay(
        mut self,
        renderer: Box<dyn OverlayRenderer>,
        settings: OverlaySettings,
    ) -> Self {
        self.overlay = Some(OverlayBinding { renderer, settings });
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Chapter snapshot currently held.
    #[must_use]
    pub fn chapter_data(&self) -> &ChapterData {
        &self.state.chapter_data
    }

    /// Entities of the active scene.
    #[must_use]
    pub fn roster(&self) -> &EntityStore {
        &self.roster
    }

    /// The persistence collaborator.
    #[must_use]
    pub fn store(&self) -> &P {
        &self.store
    }

    /// Entity shown in the properties panel.
    #[must_use]
    pub fn selected(&self) -> Option<&IconId> {
        self.selected.as_ref()
    }

    /// Active scene, or the empty scene when none is set or found.
    #[must_use]
    pub fn active_scene(&self) -> CombatScene {
        self.state
            .chapter_data
            .combat_or_default(&self.state.battlemap_id)
    }

    fn chapter(&self) -> Result<ChapterId, StoreError> {
        self.state.chapter_id.clone().ok_or(StoreError::NoChapterOpen)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn send(&self, message: ToDisplay) {
        let topic = message.topic();
        if let Err(e) = self.link.send(message) {
            warn!(topic, "display did not receive message: {e}");
        }
    }

    fn persist_state(&self) {
        if let Some(path) = &self.state_path {
            if let Err(e) = self.state.save_to(path) {
                warn!("Failed to write state: {e}");
            }
        }
    }

    fn broadcast_chapter(&mut self) {
        let seq = self.next_seq();
        debug!(seq, "broadcasting chapter data");
        self.send(ToDisplay::ChapterData(Snapshot::new(
            seq,
            self.state.chapter_data.clone(),
        )));
    }

    fn broadcast_battlemap(&mut self) {
        let seq = self.next_seq();
        debug!(seq, battlemap = %self.state.battlemap_id, "broadcasting battlemap id");
        self.send(ToDisplay::BattlemapId(Snapshot::new(
            seq,
            self.state.battlemap_id.clone(),
        )));
    }

    fn broadcast_entities(&mut self) {
        let seq = self.next_seq();
        debug!(seq, count = self.roster.len(), "broadcasting entity data");
        self.send(ToDisplay::EntityData(Snapshot::new(seq, self.roster.to_vec())));
    }

    /// Re-sends every snapshot, e.g. for a display that mounted late.
    pub fn broadcast_all(&mut self) {
        self.broadcast_chapter();
        self.broadcast_battlemap();
        self.broadcast_entities();
    }

    /// Opens a chapter and clears the active scene.
    pub fn open_chapter(&mut self, chapter: ChapterId) -> TableauResult<()> {
        let data = self.store.chapter_data(&chapter)?;
        info!(%chapter, scenes = data.combat.len(), "chapter opened");
        self.state.chapter_id = Some(chapter);
        self.state.chapter_data = data;
        self.state.clear_scene();
        self.roster.replace(Vec::new());
        self.selected = None;
        self.persist_state();
        self.broadcast_all();
        Ok(())
    }

    /// Re-reads the chapter and broadcasts it.
    pub fn reload_chapter_data(&mut self) -> TableauResult<()> {
        let chapter = self.chapter()?;
        self.state.chapter_data = self.store.chapter_data(&chapter)?;
        self.persist_state();
        self.broadcast_chapter();
        Ok(())
    }

    /// Makes a combat scene active (or none, with [`BattlemapId::none`]).
    pub fn set_battlemap(&mut self, battlemap: BattlemapId) -> TableauResult<()> {
        if !battlemap.is_none() && self.state.chapter_data.find_combat(&battlemap).is_none() {
            info!(%battlemap, "battlemap not in chapter, showing empty scene");
        }
        self.state.battlemap_id = battlemap;
        self.selected = None;
        self.broadcast_battlemap();
        self.reload_entities()
    }

    /// Re-reads the active scene's entities and broadcasts them.
    pub fn reload_entities(&mut self) -> TableauResult<()> {
        let entities = if self.state.battlemap_id.is_none() {
            Vec::new()
        } else {
            let chapter = self.chapter()?;
            self.store.entities(&chapter, &self.state.battlemap_id)?
        };
        self.state.entity_data.clone_from(&entities);
        self.roster.replace(entities);
        if self
            .selected
            .as_ref()
            .is_some_and(|icon| !self.roster.contains(icon))
        {
            self.selected = None;
        }
        self.persist_state();
        self.broadcast_entities();
        Ok(())
    }

    /// Applies a properties edit through the store, then re-broadcasts.
    pub fn apply_edit(&mut self, icon: &IconId, edit: &EntityEdit) -> TableauResult<Entity> {
        let edited = self
            .roster
            .preview(icon, edit)
            .map_err(|_| StoreError::EntityNotFound(icon.to_string()))?;
        self.store.update_entity(&edited)?;
        debug!(%icon, ?edit, "entity updated");
        self.reload_entities()?;
        Ok(edited)
    }

    /// Creates an entity on the active scene.
    pub fn add_entity(&mut self, entity: Entity) -> TableauResult<()> {
        let chapter = self.chapter()?;
        if self.roster.contains(&entity.icon) {
            return Err(StoreError::DuplicateEntity(entity.icon.to_string()).into());
        }
        self.store
            .add_entity(&chapter, &self.state.battlemap_id, &entity)?;
        info!(icon = %entity.icon, "entity added");
        self.reload_chapter_data()?;
        self.reload_entities()
    }

    /// Deletes an entity from the active scene.
    pub fn remove_entity(&mut self, icon: &IconId) -> TableauResult<()> {
        let chapter = self.chapter()?;
        self.store
            .remove_entity(&chapter, &self.state.battlemap_id, icon)?;
        info!(%icon, "entity removed");
        self.reload_chapter_data()?;
        self.reload_entities()
    }

    /// Edits the active scene's battlemap or grid settings.
    ///
    /// A grid size edit regenerates the overlay before the chapter is
    /// re-broadcast.
    pub fn edit_scene(&mut self, edit: SceneEdit) -> TableauResult<()> {
        let chapter = self.chapter()?;
        let battlemap = self.state.battlemap_id.clone();
        let mut scene = self
            .state
            .chapter_data
            .find_combat(&battlemap)
            .cloned()
            .ok_or_else(|| StoreError::BattlemapNotFound {
                battlemap: battlemap.to_string(),
                chapter: chapter.to_string(),
            })?;
        edit.apply(&mut scene);
        self.store.update_scene(&chapter, &scene)?;
        debug!(?edit, %battlemap, "scene updated");
        self.reload_chapter_data()?;

        // The stored scene is already shown; a failed render only loses the image.
        if edit.changes_geometry() {
            if let Err(e) = self.render_overlay(&scene) {
                warn!(%battlemap, "overlay not rendered after scene edit: {e}");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Renders the overlay for the active scene, if a renderer is attached.
    pub fn regenerate_overlay(&mut self) -> TableauResult<Option<OverlayStatus>> {
        let scene = self.active_scene();
        if scene.is_empty() {
            return Ok(None);
        }
        self.render_overlay(&scene)
    }

    fn render_overlay(&mut self, scene: &CombatScene) -> TableauResult<Option<OverlayStatus>> {
        let Some(binding) = self.overlay.as_mut() else {
            return Ok(None);
        };
        if scene.grid_size == 0 {
            warn!(battlemap = %scene.battlemap, "grid size 0, overlay not rendered");
            return Ok(None);
        }
        let request = OverlayRequest {
            container_width: binding.settings.container_width,
            container_height: binding.settings.container_height,
            hex_size: scene.grid_size,
            overflow: binding.settings.overflow,
            output_path: binding.settings.dir.join(scene.battlemap.as_str()),
        };
        binding.renderer.render(&request).map(Some)
    }

    /// Sets the properties panel selection.
    pub fn select_entity(&mut self, icon: Option<IconId>) {
        self.selected = icon;
    }

    /// Forwards a scene-composition signal to the display.
    pub fn signal(&mut self, signal: SceneSignal) {
        self.send(signal.into());
    }

    /// Handles every pending display request. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let messages = self.link.drain();
        let count = messages.len();
        for message in messages {
            self.handle(message);
        }
        count
    }

    fn handle(&mut self, message: ToConstructor) {
        match message {
            ToConstructor::EntityLocationUpdate(entity) => {
                let icon = entity.icon.clone();
                let result = self.apply_edit(&icon, &EntityEdit::Location(entity.location));
                if let Err(e) = result {
                    warn!(%icon, "location update from display failed: {e}");
                    self.send(ToDisplay::UpdateFailed {
                        icon,
                        reason: e.to_string(),
                    });
                }
            },
            ToConstructor::EntitySelectedInDisplay(icon) => {
                debug!(?icon, "display selection changed");
                self.selected = icon;
            },
            ToConstructor::RequestDisplayData => {
                debug!("display requested current data");
                self.broadcast_all();
            },
        }
    }
}

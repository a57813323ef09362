//! The display surface: a read-only mirror of the constructor's data plus the
//! pointer interactions players and the game master perform on it.
//!
//! Snapshots are applied in arrival order; a snapshot that is not newer than
//! the last accepted one of its topic is dropped. User gestures never touch
//! the mirror, they become requests to the constructor.

use std::time::{Duration, Instant};

use tableau_common::{BattlemapId, IconId, PercentPoint, SchemaVersion};
use tracing::{debug, info, warn};

use crate::annotation::{AnnotationController, Arrow};
use crate::campaign::CampaignView;
use crate::entity::{Allegiance, Entity};
use crate::flash::{FlashPhase, FlashTracker, FLASH_DURATION, FLASH_PHASE};
use crate::geometry::{GridGeometry, DEFAULT_OVERFLOW};
use crate::health::{bar_width_percent, HealthBand};
use crate::idle::{GeometryScheduler, GridCanvas};
use crate::roster::EntityStore;
use crate::scene::{ChapterData, CombatScene, Splash};
use crate::selection::{SelectionController, SelectionOutcome};
use crate::sync::{DisplayLink, SceneSignal, Snapshot, ToConstructor, ToDisplay};

/// Reference container width the grid is laid out for.
pub const DEFAULT_CONTAINER_WIDTH: f64 = 1667.0;

/// Reference container height the grid is laid out for.
pub const DEFAULT_CONTAINER_HEIGHT: f64 = 953.0;

/// Display surface settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayConfig {
    /// Container and overflow for grid geometry
    pub canvas: GridCanvas,
    /// Flash window after a hit point change
    pub flash_duration: Duration,
    /// Length of one flash phase
    pub flash_phase: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            canvas: GridCanvas {
                width: DEFAULT_CONTAINER_WIDTH,
                height: DEFAULT_CONTAINER_HEIGHT,
                overflow: DEFAULT_OVERFLOW,
            },
            flash_duration: FLASH_DURATION,
            flash_phase: FLASH_PHASE,
        }
    }
}

/// Which renderer is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    /// "Nothing to display".
    Nothing,
    /// Landscape with splash collage.
    Campaign {
        /// Landscape image
        landscape: String,
        /// Splashes in selection order
        splashes: Vec<Splash>,
    },
    /// Battlemap with hex grid and entities.
    Combat {
        /// Active scene
        scene: CombatScene,
    },
}

/// Everything needed to draw one entity token.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    /// Token image
    pub icon: IconId,
    /// Border colour side
    pub allegiance: Allegiance,
    /// Drawn greyed out
    pub dead: bool,
    /// Token anchor, odd-row shift included
    pub position: PercentPoint,
    /// Token height in percent of the container
    pub height_percent: f64,
    /// Armed for placement
    pub armed: bool,
    /// Under the pointer
    pub hovered: bool,
    /// Damage flash phase, if flashing
    pub flash: Option<FlashPhase>,
    /// Health bar colour
    pub health: HealthBand,
    /// Health bar width in percent of the token
    pub health_bar_percent: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct LastSeq {
    chapter: u64,
    battlemap: u64,
    entities: u64,
}

/// Display-side session.
#[derive(Debug)]
pub struct DisplaySurface {
    link: DisplayLink,
    chapter: ChapterData,
    battlemap: BattlemapId,
    entities: EntityStore,
    last_seq: LastSeq,
    campaign: CampaignView,
    combat_selected: bool,
    show_grid: bool,
    show_entities: bool,
    scheduler: GeometryScheduler,
    selection: SelectionController,
    annotation: AnnotationController,
    flash: FlashTracker,
    last_failure: Option<(IconId, String)>,
}

impl DisplaySurface {
    /// Creates a display with empty mirrors.
    #[must_use]
    pub fn new(link: DisplayLink, config: DisplayConfig) -> Self {
        Self {
            link,
            chapter: ChapterData::default(),
            battlemap: BattlemapId::none(),
            entities: EntityStore::new(),
            last_seq: LastSeq::default(),
            campaign: CampaignView::new(),
            combat_selected: true,
            show_grid: true,
            show_entities: true,
            scheduler: GeometryScheduler::new(config.canvas),
            selection: SelectionController::new(),
            annotation: AnnotationController::new(),
            flash: FlashTracker::with_timing(config.flash_duration, config.flash_phase),
            last_failure: None,
        }
    }

    /// Asks the constructor for the current snapshots.
    pub fn mount(&self) {
        self.request(ToConstructor::RequestDisplayData);
    }

    fn request(&self, message: ToConstructor) {
        let topic = message.topic();
        if let Err(e) = self.link.send(message) {
            warn!(topic, "constructor did not receive request: {e}");
        }
    }

    /// Applies every pending constructor message. Returns how many arrived.
    pub fn pump(&mut self, now: Instant) -> usize {
        let messages = self.link.drain();
        let count = messages.len();
        for message in messages {
            self.handle(message, now);
        }
        count
    }

    fn handle(&mut self, message: ToDisplay, now: Instant) {
        match message {
            ToDisplay::ChapterData(snapshot) => {
                if fresh(&mut self.last_seq.chapter, &snapshot, "chapterData") {
                    self.chapter = snapshot.payload;
                    self.scene_changed();
                }
            },
            ToDisplay::BattlemapId(snapshot) => {
                if fresh(&mut self.last_seq.battlemap, &snapshot, "battlemapId") {
                    if self.battlemap != snapshot.payload {
                        self.annotation.reset();
                        self.selection.cancel();
                    }
                    self.battlemap = snapshot.payload;
                    self.scene_changed();
                }
            },
            ToDisplay::EntityData(snapshot) => {
                if fresh(&mut self.last_seq.entities, &snapshot, "entityData") {
                    let previous = self.entities.replace(snapshot.payload);
                    self.flash
                        .record_changes(&previous, self.entities.as_slice(), now);
                    let entities = &self.entities;
                    self.selection
                        .forget_missing(|icon| entities.contains(icon));
                }
            },
            ToDisplay::UpdateFailed { icon, reason } => {
                warn!(%icon, "constructor rejected update: {reason}");
                self.last_failure = Some((icon, reason));
            },
            other => {
                if let Some(signal) = other.into_signal() {
                    self.apply_signal(&signal);
                }
            },
        }
    }

    fn apply_signal(&mut self, signal: &SceneSignal) {
        if self.campaign.apply(signal) {
            return;
        }
        match signal {
            SceneSignal::CombatSelected => self.combat_selected = true,
            SceneSignal::CombatUnselected => self.combat_selected = false,
            SceneSignal::ToggleGrid => self.show_grid = !self.show_grid,
            SceneSignal::ToggleEntities => self.show_entities = !self.show_entities,
            _ => {},
        }
    }

    fn scene_changed(&mut self) {
        if self.battlemap.is_none() {
            self.scheduler.cancel();
            return;
        }
        match self.chapter.find_combat(&self.battlemap) {
            Some(scene) => {
                self.scheduler.request(scene.grid_size);
            },
            None => {
                // Normal while the chapter snapshot is still on its way.
                info!(battlemap = %self.battlemap, "scene not in chapter yet");
                self.scheduler.cancel();
            },
        }
    }

    /// Runs deferred work. Call when the render loop is idle.
    ///
    /// Returns whether the grid geometry changed.
    pub fn run_idle(&mut self, now: Instant) -> bool {
        self.flash.prune(now);
        match self.scheduler.run_idle() {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Grid geometry not computed: {e}");
                false
            },
        }
    }

    /// Whether deferred work is waiting.
    #[must_use]
    pub fn has_idle_work(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// The active scene, or the empty scene.
    #[must_use]
    pub fn active_scene(&self) -> CombatScene {
        self.chapter.combat_or_default(&self.battlemap)
    }

    /// What the display currently renders.
    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        if self.combat_selected && !self.battlemap.is_none() {
            if let Some(scene) = self.chapter.find_combat(&self.battlemap) {
                return DisplayMode::Combat {
                    scene: scene.clone(),
                };
            }
        }
        match self.campaign.landscape() {
            Some(landscape) => DisplayMode::Campaign {
                landscape: landscape.to_string(),
                splashes: self.campaign.splashes().to_vec(),
            },
            None => DisplayMode::Nothing,
        }
    }

    /// Current grid geometry.
    #[must_use]
    pub fn geometry(&self) -> &GridGeometry {
        self.scheduler.geometry()
    }

    /// Bumped whenever the geometry is recomputed; cached overlays keyed on
    /// an older value are stale.
    #[must_use]
    pub fn overlay_revision(&self) -> u64 {
        self.scheduler.overlay_revision()
    }

    /// Whether the hex overlay is drawn.
    #[must_use]
    pub fn shows_grid(&self) -> bool {
        self.show_grid
    }

    /// Mirrored entities in scene order.
    #[must_use]
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Last write the constructor rejected.
    #[must_use]
    pub fn last_failure(&self) -> Option<(&IconId, &str)> {
        self.last_failure
            .as_ref()
            .map(|(icon, reason)| (icon, reason.as_str()))
    }

    /// Armed entity, if any.
    #[must_use]
    pub fn armed(&self) -> Option<&IconId> {
        self.selection.armed()
    }

    fn notify_selection(&self, outcome: &SelectionOutcome) {
        match outcome {
            SelectionOutcome::Unchanged => {},
            SelectionOutcome::Armed(icon) => {
                self.request(ToConstructor::EntitySelectedInDisplay(Some(icon.clone())));
            },
            SelectionOutcome::Placed { icon, location } => {
                match self.entities.get(icon) {
                    Some(entity) => {
                        let moved = Entity {
                            location: *location,
                            ..entity.clone()
                        };
                        self.request(ToConstructor::EntityLocationUpdate(moved));
                    },
                    None => debug!(%icon, "placed entity left the scene"),
                }
                self.request(ToConstructor::EntitySelectedInDisplay(None));
            },
            SelectionOutcome::Deselected(_) | SelectionOutcome::Cancelled(_) => {
                self.request(ToConstructor::EntitySelectedInDisplay(None));
            },
        }
    }

    /// Left button pressed on an entity token.
    pub fn entity_pressed(&mut self, icon: &IconId) -> SelectionOutcome {
        if !self.entities.contains(icon) {
            return SelectionOutcome::Unchanged;
        }
        let outcome = self.selection.pick(icon.clone());
        self.notify_selection(&outcome);
        outcome
    }

    /// Left click on the grid.
    pub fn left_click(&mut self, pointer: PercentPoint) -> SelectionOutcome {
        let outcome = self.selection.click(pointer, self.scheduler.geometry());
        self.notify_selection(&outcome);
        outcome
    }

    /// Right button pressed: cancels placement and drives the annotation.
    pub fn right_press(&mut self, pointer: PercentPoint) {
        let outcome = self.selection.cancel();
        self.notify_selection(&outcome);
        self.annotation.press(pointer, self.scheduler.geometry());
    }

    /// Pointer moved.
    pub fn pointer_moved(&mut self, pointer: PercentPoint) {
        self.annotation.drag(pointer, self.scheduler.geometry());
    }

    /// Right button released.
    pub fn right_release(&mut self, pointer: PercentPoint) {
        self.annotation.release(pointer, self.scheduler.geometry());
    }

    /// Pointer entered or left a token.
    pub fn hover(&mut self, icon: Option<IconId>) {
        self.selection.hover(icon);
    }

    /// Annotation state machine.
    #[must_use]
    pub fn annotation(&self) -> &AnnotationController {
        &self.annotation
    }

    /// Arrow (or rubber band while drawing) as percentage endpoints.
    #[must_use]
    pub fn arrow_points(&self) -> Option<(PercentPoint, PercentPoint)> {
        let Arrow { start, end } = self
            .annotation
            .arrow()
            .or_else(|| self.annotation.rubber_band())?;
        let geometry = self.scheduler.geometry();
        Some((geometry.cell_center(start)?, geometry.cell_center(end)?))
    }

    /// Render model for every visible entity.
    #[must_use]
    pub fn entity_views(&self, now: Instant) -> Vec<EntityView> {
        if !self.show_entities {
            return Vec::new();
        }
        let geometry = self.scheduler.geometry();
        let height_percent = geometry.token_height_percent();

        self.entities
            .iter()
            .filter(|entity| entity.visible)
            .filter_map(|entity| {
                let Some(position) = geometry.cell_center(entity.location) else {
                    debug!(icon = %entity.icon, location = %entity.location, "entity outside grid");
                    return None;
                };
                Some(EntityView {
                    icon: entity.icon.clone(),
                    allegiance: entity.allegiance,
                    dead: entity.dead,
                    position,
                    height_percent,
                    armed: self.selection.is_armed(&entity.icon),
                    hovered: self.selection.hovered() == Some(&entity.icon),
                    flash: self.flash.phase(&entity.icon, now),
                    health: HealthBand::of(entity.hitpoints),
                    health_bar_percent: bar_width_percent(entity.hitpoints),
                })
            })
            .collect()
    }
}

/// Accepts a snapshot if its version is readable and it is newer than the
/// last one of its topic.
fn fresh<T>(last: &mut u64, snapshot: &Snapshot<T>, topic: &str) -> bool {
    if !SchemaVersion::SYNC_PROTOCOL.can_read(&snapshot.version) {
        warn!(topic, version = %snapshot.version, "unreadable snapshot dropped");
        return false;
    }
    if snapshot.seq <= *last {
        debug!(topic, seq = snapshot.seq, last = *last, "stale snapshot dropped");
        return false;
    }
    *last = snapshot.seq;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntitySize;
    use crate::sync::{link, ConstructorLink};
    use tableau_common::GridCoord;

    fn scene() -> CombatScene {
        CombatScene::new(BattlemapId::new("crypt.png"))
    }

    fn chapter() -> ChapterData {
        ChapterData {
            combat: vec![scene()],
            ..ChapterData::default()
        }
    }

    fn orc() -> Entity {
        Entity::new(IconId::new("orc.png"), Allegiance::Hostile, EntitySize::Small)
            .at(GridCoord::new(2, 1))
            .with_hitpoints(10, 10)
    }

    fn mounted() -> (DisplaySurface, ConstructorLink, Instant) {
        let (constructor, display) = link(64);
        let mut surface = DisplaySurface::new(display, DisplayConfig::default());
        let now = Instant::now();
        constructor
            .send(ToDisplay::ChapterData(Snapshot::new(1, chapter())))
            .expect("send");
        constructor
            .send(ToDisplay::BattlemapId(Snapshot::new(2, BattlemapId::new("crypt.png"))))
            .expect("send");
        constructor
            .send(ToDisplay::EntityData(Snapshot::new(3, vec![orc()])))
            .expect("send");
        surface.pump(now);
        surface.run_idle(now);
        (surface, constructor, now)
    }

    #[test]
    fn test_mount_requests_data() {
        let (constructor, display) = link(4);
        let surface = DisplaySurface::new(display, DisplayConfig::default());
        surface.mount();
        assert_eq!(constructor.drain(), vec![ToConstructor::RequestDisplayData]);
    }

    #[test]
    fn test_snapshots_drive_mode_and_geometry() {
        let (surface, _constructor, _) = mounted();
        assert_eq!(surface.mode(), DisplayMode::Combat { scene: scene() });
        assert_eq!(surface.geometry().column_count(), 14);
        assert_eq!(surface.overlay_revision(), 1);
    }

    #[test]
    fn test_stale_snapshot_is_dropped() {
        let (mut surface, constructor, now) = mounted();
        constructor
            .send(ToDisplay::EntityData(Snapshot::new(2, Vec::new())))
            .expect("send");
        surface.pump(now);
        assert_eq!(surface.entities().len(), 1);

        let mut future = Snapshot::new(10, Vec::new());
        future.version = SchemaVersion::new(2, 0);
        constructor
            .send(ToDisplay::EntityData(future))
            .expect("send");
        surface.pump(now);
        assert_eq!(surface.entities().len(), 1);
    }

    #[test]
    fn test_missing_scene_shows_nothing_until_chapter_arrives() {
        let (constructor, display) = link(8);
        let mut surface = DisplaySurface::new(display, DisplayConfig::default());
        let now = Instant::now();

        constructor
            .send(ToDisplay::BattlemapId(Snapshot::new(1, BattlemapId::new("crypt.png"))))
            .expect("send");
        surface.pump(now);
        assert_eq!(surface.mode(), DisplayMode::Nothing);
        assert!(surface.active_scene().is_empty());
        assert!(!surface.has_idle_work());

        constructor
            .send(ToDisplay::ChapterData(Snapshot::new(2, chapter())))
            .expect("send");
        surface.pump(now);
        assert!(surface.has_idle_work());
        assert!(matches!(surface.mode(), DisplayMode::Combat { .. }));
    }

    #[test]
    fn test_placement_round_trips_through_constructor() {
        let (mut surface, constructor, _) = mounted();
        let icon = IconId::new("orc.png");
        let target = surface
            .geometry()
            .cell_center(GridCoord::new(5, 3))
            .expect("in range");

        surface.entity_pressed(&icon);
        surface.left_click(target);

        let requests = constructor.drain();
        assert_eq!(
            requests[0],
            ToConstructor::EntitySelectedInDisplay(Some(icon.clone()))
        );
        match &requests[1] {
            ToConstructor::EntityLocationUpdate(entity) => {
                assert_eq!(entity.location, GridCoord::new(5, 3));
            },
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(requests[2], ToConstructor::EntitySelectedInDisplay(None));

        // The mirror is untouched until the constructor answers.
        assert_eq!(
            surface.entities().get(&icon).map(|e| e.location),
            Some(GridCoord::new(2, 1))
        );
    }

    #[test]
    fn test_right_press_cancels_and_annotates() {
        let (mut surface, constructor, _) = mounted();
        let geometry = surface.geometry().clone();
        let at = |c, r| geometry.cell_center(GridCoord::new(c, r)).expect("in range");

        surface.entity_pressed(&IconId::new("orc.png"));
        surface.right_press(at(2, 3));
        surface.pointer_moved(at(5, 1));
        assert!(surface.arrow_points().is_some());
        surface.right_release(at(5, 1));

        assert!(surface.armed().is_none());
        assert_eq!(
            surface.annotation().arrow(),
            Some(Arrow {
                start: GridCoord::new(2, 3),
                end: GridCoord::new(5, 1)
            })
        );
        assert_eq!(
            constructor.drain().last(),
            Some(&ToConstructor::EntitySelectedInDisplay(None))
        );
    }

    #[test]
    fn test_damage_flash_in_views() {
        let (mut surface, constructor, now) = mounted();
        let mut hurt = orc();
        hurt.hitpoints.current = 5;
        constructor
            .send(ToDisplay::EntityData(Snapshot::new(4, vec![hurt])))
            .expect("send");
        surface.pump(now);

        let views = surface.entity_views(now);
        assert_eq!(views[0].flash, Some(FlashPhase::Translucent));
        assert_eq!(views[0].health, HealthBand::Wounded);

        let later = now + Duration::from_millis(3000);
        assert_eq!(surface.entity_views(later)[0].flash, None);
    }

    #[test]
    fn test_views_skip_hidden_and_offgrid() {
        let (mut surface, constructor, now) = mounted();
        let mut hidden = orc();
        hidden.icon = IconId::new("hidden.png");
        hidden.visible = false;
        let mut far = orc().at(GridCoord::new(500, 0));
        far.icon = IconId::new("far.png");
        constructor
            .send(ToDisplay::EntityData(Snapshot::new(4, vec![orc(), hidden, far])))
            .expect("send");
        surface.pump(now);

        let views = surface.entity_views(now);
        assert_eq!(views.len(), 1);
        let view = &views[0];
        let geometry = surface.geometry();
        // Row 1 is odd, so the token carries the row offset.
        assert!(
            (view.position.x - (geometry.centers_x()[2] + geometry.row_offset_percent())).abs()
                < 1e-9
        );
        assert!((view.height_percent - geometry.token_height_percent()).abs() < 1e-9);
    }

    #[test]
    fn test_scene_signals() {
        let (mut surface, constructor, now) = mounted();
        constructor.send(ToDisplay::ToggleEntities).expect("send");
        constructor.send(ToDisplay::ToggleGrid).expect("send");
        constructor
            .send(ToDisplay::LandscapeSelected("vale.png".into()))
            .expect("send");
        constructor.send(ToDisplay::CombatUnselected).expect("send");
        surface.pump(now);

        assert!(surface.entity_views(now).is_empty());
        assert!(!surface.shows_grid());
        assert_eq!(
            surface.mode(),
            DisplayMode::Campaign {
                landscape: "vale.png".to_string(),
                splashes: Vec::new()
            }
        );
    }

    #[test]
    fn test_update_failure_is_recorded() {
        let (mut surface, constructor, now) = mounted();
        constructor
            .send(ToDisplay::UpdateFailed {
                icon: IconId::new("orc.png"),
                reason: "disk full".to_string(),
            })
            .expect("send");
        surface.pump(now);
        assert_eq!(
            surface.last_failure(),
            Some((&IconId::new("orc.png"), "disk full"))
        );
    }
}

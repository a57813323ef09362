//! Headless session driver.
//!
//! Wires a constructor surface over the chapter store to a display surface
//! and runs both on one thread until no messages or deferred work remain.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tableau_combat::{
    link, AppState, ConstructorSurface, DisplayMode, DisplaySurface, OverlayStatus, SceneEdit,
};
use tableau_common::{BattlemapId, ChapterId, StoreError, TableauError};
use tableau_overlay::HexOverlayRenderer;
use tableau_world::ChapterStore;
use tracing::{debug, info, warn};

use crate::config::TableauConfig;

/// Upper bound on pump rounds in one settle call.
const MAX_SETTLE_ROUNDS: usize = 64;

/// Command line arguments: `tableau [chapter] [battlemap]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "tableau", version, about = "Tabletop session tool with a live combat display")]
pub struct Args {
    /// Chapter to open, created if missing (default: the last session's)
    pub chapter: Option<ChapterId>,
    /// Battlemap to show, added to the chapter if missing
    pub battlemap: Option<BattlemapId>,
}

/// A constructor and a display sharing one channel.
pub struct Session {
    config: TableauConfig,
    constructor: ConstructorSurface<ChapterStore>,
    display: DisplaySurface,
}

impl Session {
    /// Opens the store and restores the previous session state.
    pub fn open(config: TableauConfig) -> Result<Self> {
        let store = ChapterStore::open(&config.data_dir).with_context(|| {
            format!("Failed to open chapter store at {}", config.data_dir.display())
        })?;

        let state_path = config.state_path();
        let state = AppState::load_from(&state_path);
        let (constructor_link, display_link) = link(config.channel_capacity);

        let constructor = ConstructorSurface::new(store, constructor_link)
            .with_state(state, Some(state_path))
            .with_overlay(
                Box::new(HexOverlayRenderer::new()),
                config.overlay_settings(),
            );
        let display = DisplaySurface::new(display_link, config.display_config());

        Ok(Self {
            config,
            constructor,
            display,
        })
    }

    /// Opens the requested chapter and battlemap, falling back to the
    /// restored ones, then mounts the display.
    pub fn start(&mut self, args: &Args) -> Result<()> {
        match &args.chapter {
            Some(chapter) => self.open_or_create_chapter(chapter.clone())?,
            None => self.refresh_restored(),
        }

        if let Some(battlemap) = &args.battlemap {
            self.ensure_combat(battlemap)?;
            self.constructor
                .set_battlemap(battlemap.clone())
                .context("Failed to activate battlemap")?;
        }

        self.display.mount();

        match self.constructor.regenerate_overlay() {
            Ok(Some(OverlayStatus::Rendered)) => info!("Grid overlay regenerated"),
            Ok(Some(OverlayStatus::Cached)) => info!("Grid overlay up to date"),
            Ok(None) => debug!("No overlay for this scene"),
            Err(e) => warn!("Grid overlay not rendered: {e}"),
        }
        Ok(())
    }

    fn open_or_create_chapter(&mut self, chapter: ChapterId) -> Result<()> {
        match self.constructor.open_chapter(chapter.clone()) {
            Err(TableauError::Store(StoreError::ChapterNotFound(_))) => {
                info!(%chapter, "Chapter not found, creating it");
                self.constructor.store().create_chapter(&chapter)?;
                self.constructor.open_chapter(chapter)?;
            },
            other => other.context("Failed to open chapter")?,
        }
        Ok(())
    }

    /// Re-reads the restored chapter and scene so edits made outside the
    /// session show up.
    fn refresh_restored(&mut self) {
        if self.constructor.state().chapter_id.is_none() {
            info!("No chapter open");
            return;
        }
        if let Err(e) = self
            .constructor
            .reload_chapter_data()
            .and_then(|()| self.constructor.reload_entities())
        {
            warn!("Restored session could not be refreshed: {e}");
        }
    }

    fn ensure_combat(&mut self, battlemap: &BattlemapId) -> Result<()> {
        if self.constructor.chapter_data().find_combat(battlemap).is_some() {
            return Ok(());
        }
        let chapter = self
            .constructor
            .state()
            .chapter_id
            .clone()
            .context("A chapter must be open to add a combat")?;
        let scene = self.constructor.store().create_combat(&chapter, battlemap)?;
        self.constructor.reload_chapter_data()?;

        if scene.grid_size != self.config.default_grid_size {
            self.constructor.set_battlemap(battlemap.clone())?;
            self.constructor
                .edit_scene(SceneEdit::GridSize(self.config.default_grid_size))?;
        }
        Ok(())
    }

    /// Pumps constructor, display and idle work until nothing is left.
    ///
    /// Returns the number of messages handled.
    pub fn settle(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            let round = self.constructor.pump() + self.display.pump(now);
            self.display.run_idle(now);
            handled += round;
            if round == 0 && !self.display.has_idle_work() {
                return handled;
            }
        }
        warn!("Session did not settle after {MAX_SETTLE_ROUNDS} rounds");
        handled
    }

    /// Constructor side.
    #[cfg(test)]
    pub fn constructor(&self) -> &ConstructorSurface<ChapterStore> {
        &self.constructor
    }

    /// Display side.
    pub fn display(&self) -> &DisplaySurface {
        &self.display
    }

    /// Writes the session state back to disk.
    pub fn save(&self) -> Result<()> {
        let path = self.config.state_path();
        self.constructor
            .state()
            .save_to(&path)
            .with_context(|| format!("Failed to save session state to {}", path.display()))?;
        info!("Saved session state to {}", path.display());
        Ok(())
    }
}

/// Logs what the display ended up showing.
fn log_display(surface: &DisplaySurface, now: Instant) {
    match surface.mode() {
        DisplayMode::Nothing => info!("Nothing to display"),
        DisplayMode::Campaign {
            landscape,
            splashes,
        } => info!("Showing landscape {} with {} splashes", landscape, splashes.len()),
        DisplayMode::Combat { scene } => {
            let geometry = surface.geometry();
            info!(
                "Showing combat on {} (hex size {}, {}x{} cells, {} tokens)",
                scene.battlemap,
                scene.grid_size,
                geometry.column_count(),
                geometry.row_count(),
                surface.entity_views(now).len()
            );
        },
    }
}

/// Runs one headless session.
pub fn run(mut config: TableauConfig, args: &Args) -> Result<()> {
    config.validate();

    info!("Configuration loaded:");
    info!("  Data: {}", config.data_dir.display());
    info!("  Overlays: {}", config.overlay_dir.display());
    info!(
        "  Container: {}x{} (overflow {})",
        config.container_width, config.container_height, config.overflow
    );

    let mut session = Session::open(config)?;
    session.start(args)?;

    let now = Instant::now();
    let handled = session.settle(now);
    debug!(handled, "Session settled");
    log_display(session.display(), now);

    session.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_combat::{Allegiance, Entity, EntitySize, Persistence};
    use tableau_common::IconId;

    fn test_config(root: &std::path::Path) -> TableauConfig {
        TableauConfig {
            data_dir: root.join("data"),
            overlay_dir: root.join("overlays"),
            container_width: 400,
            container_height: 300,
            ..TableauConfig::default()
        }
    }

    fn args(list: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tableau").chain(list.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["Act One", "crypt.png"]);
        assert_eq!(parsed.chapter, Some(ChapterId::new("Act One")));
        assert_eq!(parsed.battlemap, Some(BattlemapId::new("crypt.png")));
        assert_eq!(args(&[]), Args::default());
    }

    #[test]
    fn test_flags_are_not_chapter_names() {
        let help = Args::try_parse_from(["tableau", "--help"]).expect_err("help exits");
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
        let version = Args::try_parse_from(["tableau", "--version"]).expect_err("version exits");
        assert_eq!(version.kind(), clap::error::ErrorKind::DisplayVersion);
        let unknown = Args::try_parse_from(["tableau", "--chapter"]).expect_err("no such flag");
        assert_eq!(unknown.kind(), clap::error::ErrorKind::UnknownArgument);

        // Nothing was parsed, so a session sees no chapter to open.
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let mut session = Session::open(config.clone()).expect("open");
        session.start(&args(&[])).expect("start");
        let chapters = ChapterStore::open(&config.data_dir)
            .expect("store")
            .list_chapters()
            .expect("list chapters");
        assert!(chapters.is_empty());
        assert!(session.constructor().state().chapter_id.is_none());
    }

    #[test]
    fn test_session_shows_combat_and_renders_overlay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());
        let args = args(&["Act One", "crypt.png"]);

        let mut session = Session::open(config.clone()).expect("open");
        session.start(&args).expect("start");
        session.settle(Instant::now());

        match session.display().mode() {
            DisplayMode::Combat { scene } => {
                assert_eq!(scene.battlemap, BattlemapId::new("crypt.png"));
            },
            other => panic!("expected combat, got {other:?}"),
        }
        assert!(config.overlay_dir.join("crypt.png").exists());
        assert!(session.display().overlay_revision() > 0);

        session.save().expect("save");
        let state = AppState::load_from(config.state_path());
        assert_eq!(state.chapter_id, Some(ChapterId::new("Act One")));
        assert_eq!(state.battlemap_id, BattlemapId::new("crypt.png"));
    }

    #[test]
    fn test_restored_session_sees_stored_entities() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config(dir.path());

        let mut first = Session::open(config.clone()).expect("open");
        first
            .start(&args(&["Act One", "crypt.png"]))
            .expect("start");
        first.save().expect("save");
        drop(first);

        // Place an entity behind the session's back.
        let mut store = ChapterStore::open(&config.data_dir).expect("store");
        store
            .add_entity(
                &ChapterId::new("Act One"),
                &BattlemapId::new("crypt.png"),
                &Entity::new(IconId::new("orc.png"), Allegiance::Hostile, EntitySize::Small),
            )
            .expect("add entity");

        let mut second = Session::open(config).expect("reopen");
        second.start(&Args::default()).expect("start");
        second.settle(Instant::now());
        assert!(second.display().entities().contains(&IconId::new("orc.png")));
        assert_eq!(
            second.constructor().state().battlemap_id,
            BattlemapId::new("crypt.png")
        );
    }

    #[test]
    fn test_custom_default_grid_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = TableauConfig {
            default_grid_size: 60,
            ..test_config(dir.path())
        };

        let mut session = Session::open(config).expect("open");
        session
            .start(&args(&["Act Two", "cave.png"]))
            .expect("start");
        session.settle(Instant::now());
        assert_eq!(session.display().active_scene().grid_size, 60);
        assert!((session.display().geometry().hex_size() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_session_shows_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = Session::open(test_config(dir.path())).expect("open");
        session.start(&Args::default()).expect("start");
        session.settle(Instant::now());
        assert_eq!(session.display().mode(), DisplayMode::Nothing);
    }
}

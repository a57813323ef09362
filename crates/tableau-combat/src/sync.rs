//! Cross-surface synchronization protocol.
//!
//! The constructor surface owns chapter and entity data and pushes full
//! snapshots to the display surface. The display only sends change requests
//! back; it never edits its mirror directly.
//!
//! Messages serialize as `{ "topic": <name>, "payload": ... }`.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tableau_common::{BattlemapId, IconId, SchemaVersion, SyncError};

use crate::entity::Entity;
use crate::scene::{ChapterData, Splash};

/// Default channel capacity per direction.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// An authoritative copy of some constructor-owned data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Monotonic per-sender sequence number
    pub seq: u64,
    /// Protocol version of the sender
    pub version: SchemaVersion,
    /// The data
    pub payload: T,
}

impl<T> Snapshot<T> {
    /// Wraps a payload with the current protocol version.
    #[must_use]
    pub const fn new(seq: u64, payload: T) -> Self {
        Self {
            seq,
            version: SchemaVersion::SYNC_PROTOCOL,
            payload,
        }
    }
}

/// Scene-composition signals that pick what the display renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneSignal {
    /// Show a landscape image
    LandscapeSelected(String),
    /// Hide the landscape
    LandscapeUnselected,
    /// Add a splash to the collage
    SplashSelected(Splash),
    /// Remove a splash (matched by image)
    SplashUnselected(Splash),
    /// Remove every splash
    ClearAllSplashes,
    /// Show the combat grid
    CombatSelected,
    /// Hide the combat grid
    CombatUnselected,
    /// Toggle the hex overlay
    ToggleGrid,
    /// Toggle entity tokens
    ToggleEntities,
}

/// Constructor to display messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "camelCase")]
pub enum ToDisplay {
    /// Chapter snapshot
    ChapterData(Snapshot<ChapterData>),
    /// Active battlemap snapshot
    BattlemapId(Snapshot<BattlemapId>),
    /// Entity list snapshot
    EntityData(Snapshot<Vec<Entity>>),
    /// Landscape shown
    LandscapeSelected(String),
    /// Landscape hidden
    LandscapeUnselected,
    /// Splash added
    SplashSelected(Splash),
    /// Splash removed
    SplashUnselected(Splash),
    /// All splashes removed
    ClearAllSplashes,
    /// Combat grid shown
    CombatSelected,
    /// Combat grid hidden
    CombatUnselected,
    /// Hex overlay toggled
    ToggleGrid,
    /// Entity tokens toggled
    ToggleEntities,
    /// A display-initiated write did not persist
    UpdateFailed {
        /// Entity the write was for
        icon: IconId,
        /// Error text
        reason: String,
    },
}

impl ToDisplay {
    /// Topic name on the wire.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::ChapterData(_) => "chapterData",
            Self::BattlemapId(_) => "battlemapId",
            Self::EntityData(_) => "entityData",
            Self::LandscapeSelected(_) => "landscapeSelected",
            Self::LandscapeUnselected => "landscapeUnselected",
            Self::SplashSelected(_) => "splashSelected",
            Self::SplashUnselected(_) => "splashUnselected",
            Self::ClearAllSplashes => "clearAllSplashes",
            Self::CombatSelected => "combatSelected",
            Self::CombatUnselected => "combatUnselected",
            Self::ToggleGrid => "toggleGrid",
            Self::ToggleEntities => "toggleEntities",
            Self::UpdateFailed { .. } => "updateFailed",
        }
    }

    /// The scene-composition signal this message carries, if any.
    #[must_use]
    pub fn into_signal(self) -> Option<SceneSignal> {
        Some(match self {
            Self::LandscapeSelected(image) => SceneSignal::LandscapeSelected(image),
            Self::LandscapeUnselected => SceneSignal::LandscapeUnselected,
            Self::SplashSelected(splash) => SceneSignal::SplashSelected(splash),
            Self::SplashUnselected(splash) => SceneSignal::SplashUnselected(splash),
            Self::ClearAllSplashes => SceneSignal::ClearAllSplashes,
            Self::CombatSelected => SceneSignal::CombatSelected,
            Self::CombatUnselected => SceneSignal::CombatUnselected,
            Self::ToggleGrid => SceneSignal::ToggleGrid,
            Self::ToggleEntities => SceneSignal::ToggleEntities,
            Self::ChapterData(_)
            | Self::BattlemapId(_)
            | Self::EntityData(_)
            | Self::UpdateFailed { .. } => return None,
        })
    }
}

impl From<SceneSignal> for ToDisplay {
    fn from(signal: SceneSignal) -> Self {
        match signal {
            SceneSignal::LandscapeSelected(image) => Self::LandscapeSelected(image),
            SceneSignal::LandscapeUnselected => Self::LandscapeUnselected,
            SceneSignal::SplashSelected(splash) => Self::SplashSelected(splash),
            SceneSignal::SplashUnselected(splash) => Self::SplashUnselected(splash),
            SceneSignal::ClearAllSplashes => Self::ClearAllSplashes,
            SceneSignal::CombatSelected => Self::CombatSelected,
            SceneSignal::CombatUnselected => Self::CombatUnselected,
            SceneSignal::ToggleGrid => Self::ToggleGrid,
            SceneSignal::ToggleEntities => Self::ToggleEntities,
        }
    }
}

/// Display to constructor messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "camelCase")]
pub enum ToConstructor {
    /// Move request: the entity as it should be stored
    EntityLocationUpdate(Entity),
    /// Selection on the display changed (`None` means deselected)
    EntitySelectedInDisplay(Option<IconId>),
    /// A display mounted late and needs the current snapshots
    #[serde(rename = "requestCombatConstructorDisplayData")]
    RequestDisplayData,
}

impl ToConstructor {
    /// Topic name on the wire.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::EntityLocationUpdate(_) => "entityLocationUpdate",
            Self::EntitySelectedInDisplay(_) => "entitySelectedInDisplay",
            Self::RequestDisplayData => "requestCombatConstructorDisplayData",
        }
    }
}

/// One direction of a bounded, FIFO message channel.
#[derive(Debug)]
pub struct Endpoint<Out, In> {
    sender: Sender<Out>,
    receiver: Receiver<In>,
}

impl<Out, In> Endpoint<Out, In> {
    /// Sends without blocking.
    pub fn send(&self, message: Out) -> Result<(), SyncError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => SyncError::Full,
            TrySendError::Disconnected(_) => SyncError::Disconnected,
        })
    }

    /// Drains all pending incoming messages in arrival order.
    pub fn drain(&self) -> Vec<In> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Number of incoming messages waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

/// Constructor side of the link.
pub type ConstructorLink = Endpoint<ToDisplay, ToConstructor>;

/// Display side of the link.
pub type DisplayLink = Endpoint<ToConstructor, ToDisplay>;

/// Creates a connected constructor/display pair.
#[must_use]
pub fn link(capacity: usize) -> (ConstructorLink, DisplayLink) {
    let (to_display, from_constructor) = bounded(capacity);
    let (to_constructor, from_display) = bounded(capacity);
    (
        Endpoint {
            sender: to_display,
            receiver: from_display,
        },
        Endpoint {
            sender: to_constructor,
            receiver: from_constructor,
        },
    )
}

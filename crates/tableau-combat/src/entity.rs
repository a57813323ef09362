//! Placed combat entities and the edits a game master can apply to them.

use serde::{Deserialize, Serialize};
use tableau_common::{GridCoord, IconId};

/// Which side an entity (or splash) fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Allegiance {
    /// Friendly or uninvolved.
    #[default]
    Neutral,
    /// Opposed to the party. Older chapter files call this "evil".
    #[serde(alias = "evil")]
    Hostile,
}

impl Allegiance {
    /// The other allegiance.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::Neutral => Self::Hostile,
            Self::Hostile => Self::Neutral,
        }
    }
}

/// Token footprint on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitySize {
    /// One hex.
    #[default]
    Small,
    /// Oversized token.
    Large,
}

/// Hit points. `current` may exceed `max`; nothing clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hitpoints {
    /// Current hit points
    pub current: i32,
    /// Maximum hit points
    pub max: i32,
}

impl Hitpoints {
    /// Creates a hit point pair.
    #[must_use]
    pub const fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    /// Unclamped `current / max`; `0` when `max` is not positive.
    #[must_use]
    pub fn ratio(self) -> f64 {
        if self.max <= 0 {
            return 0.0;
        }
        f64::from(self.current) / f64::from(self.max)
    }
}

/// An entity placed on a combat scene.
///
/// Identity is the icon id. Owned by the constructor surface; the display
/// surface only mirrors snapshots of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Token image, also the identity key
    pub icon: IconId,
    /// Side the entity fights for
    pub allegiance: Allegiance,
    /// Token footprint
    pub size: EntitySize,
    /// Cell the entity occupies
    #[serde(default)]
    pub location: GridCoord,
    /// Hit points
    #[serde(default)]
    pub hitpoints: Hitpoints,
    /// Shown on the display surface
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Marked as dead
    #[serde(default)]
    pub dead: bool,
    /// Free-text conditions and notes
    #[serde(default)]
    pub modifiers: String,
}

const fn default_visible() -> bool {
    true
}

impl Entity {
    /// Creates a fresh entity at the origin with no hit points.
    #[must_use]
    pub fn new(icon: IconId, allegiance: Allegiance, size: EntitySize) -> Self {
        Self {
            icon,
            allegiance,
            size,
            location: GridCoord::ORIGIN,
            hitpoints: Hitpoints::default(),
            visible: true,
            dead: false,
            modifiers: String::new(),
        }
    }

    /// Builder-style location.
    #[must_use]
    pub fn at(mut self, location: GridCoord) -> Self {
        self.location = location;
        self
    }

    /// Builder-style hit points.
    #[must_use]
    pub fn with_hitpoints(mut self, current: i32, max: i32) -> Self {
        self.hitpoints = Hitpoints::new(current, max);
        self
    }
}

/// A single property change made from the constructor's properties panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityEdit {
    /// Move to a cell
    Location(GridCoord),
    /// Replace hit points
    Hitpoints(Hitpoints),
    /// Replace the modifiers text
    Modifiers(String),
    /// Flip visibility on the display surface
    ToggleVisible,
    /// Flip the dead flag
    ToggleDead,
    /// Flip between neutral and hostile
    SwapAllegiance,
}

impl EntityEdit {
    /// Applies the edit in place.
    pub fn apply(&self, entity: &mut Entity) {
        match self {
            Self::Location(location) => entity.location = *location,
            Self::Hitpoints(hitpoints) => entity.hitpoints = *hitpoints,
            Self::Modifiers(text) => entity.modifiers.clone_from(text),
            Self::ToggleVisible => entity.visible = !entity.visible,
            Self::ToggleDead => entity.dead = !entity.dead,
            Self::SwapAllegiance => entity.allegiance = entity.allegiance.swapped(),
        }
    }
}

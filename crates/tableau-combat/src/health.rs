//! Health bar presentation.
//!
//! Bands are computed from the unclamped hit point ratio so over-healed
//! entities get their own colour.

use serde::{Deserialize, Serialize};

use crate::entity::Hitpoints;

/// Health bar width relative to the token, at full health.
const BAR_SCALE: f64 = 1.2;

/// Colour band of an entity's health bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthBand {
    /// Above maximum hit points.
    Overhealed,
    /// More than half.
    Healthy,
    /// More than a quarter.
    Wounded,
    /// A quarter or less.
    Critical,
}

impl HealthBand {
    /// Band for a hit point pair.
    #[must_use]
    pub fn of(hitpoints: Hitpoints) -> Self {
        let ratio = hitpoints.ratio();
        if ratio > 1.0 {
            Self::Overhealed
        } else if ratio > 0.5 {
            Self::Healthy
        } else if ratio > 0.25 {
            Self::Wounded
        } else {
            Self::Critical
        }
    }

    /// Bar colour as RGB.
    #[must_use]
    pub const fn rgb(self) -> [u8; 3] {
        match self {
            Self::Overhealed => [0, 255, 255],
            Self::Healthy => [0, 255, 0],
            Self::Wounded => [255, 255, 0],
            Self::Critical => [255, 0, 0],
        }
    }
}

/// Health bar width in percent of the token width.
#[must_use]
pub fn bar_width_percent(hitpoints: Hitpoints) -> f64 {
    hitpoints.ratio() * 100.0 * BAR_SCALE
}

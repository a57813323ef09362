//! Damage flash feedback.
//!
//! Whenever an entity's hit points differ between two consecutive entity
//! snapshots it flashes for a fixed window, alternating between two
//! presentation phases.

use std::time::{Duration, Instant};

use ahash::AHashMap;
use tableau_common::IconId;
use tracing::trace;

use crate::entity::Entity;

/// How long an entity flashes after a hit point change.
pub const FLASH_DURATION: Duration = Duration::from_millis(3000);

/// Length of one flash phase.
pub const FLASH_PHASE: Duration = Duration::from_millis(750);

/// Presentation while flashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashPhase {
    /// Even phase.
    Translucent,
    /// Odd phase.
    Opaque,
}

/// Per-entity record of the most recent hit point change.
#[derive(Debug, Clone)]
pub struct FlashTracker {
    changed_at: AHashMap<IconId, Instant>,
    duration: Duration,
    phase: Duration,
}

impl Default for FlashTracker {
    fn default() -> Self {
        Self::with_timing(FLASH_DURATION, FLASH_PHASE)
    }
}

impl FlashTracker {
    /// Creates a tracker with the standard timing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker with custom timing. A zero phase is treated as one
    /// millisecond.
    #[must_use]
    pub fn with_timing(duration: Duration, phase: Duration) -> Self {
        Self {
            changed_at: AHashMap::new(),
            duration,
            phase: phase.max(Duration::from_millis(1)),
        }
    }

    /// Compares two snapshots and records every entity present in both whose
    /// hit points changed. Returns how many were recorded.
    pub fn record_changes(&mut self, previous: &[Entity], next: &[Entity], now: Instant) -> usize {
        let before: AHashMap<&IconId, _> =
            previous.iter().map(|e| (&e.icon, e.hitpoints)).collect();

        let mut recorded = 0;
        for entity in next {
            if before
                .get(&entity.icon)
                .is_some_and(|hp| *hp != entity.hitpoints)
            {
                trace!(icon = %entity.icon, "hit points changed");
                self.record(entity.icon.clone(), now);
                recorded += 1;
            }
        }
        recorded
    }

    /// Starts or restarts the flash window for one entity.
    pub fn record(&mut self, icon: IconId, now: Instant) {
        self.changed_at.insert(icon, now);
    }

    /// Current flash phase, or `None` once the window has elapsed.
    #[must_use]
    pub fn phase(&self, icon: &IconId, now: Instant) -> Option<FlashPhase> {
        let elapsed = now.saturating_duration_since(*self.changed_at.get(icon)?);
        if elapsed >= self.duration {
            return None;
        }
        let index = elapsed.as_millis() / self.phase.as_millis();
        Some(if index % 2 == 0 {
            FlashPhase::Translucent
        } else {
            FlashPhase::Opaque
        })
    }

    /// Whether the entity is inside its flash window.
    #[must_use]
    pub fn is_flashing(&self, icon: &IconId, now: Instant) -> bool {
        self.phase(icon, now).is_some()
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.changed_at.len();
        let duration = self.duration;
        self.changed_at
            .retain(|_, at| now.saturating_duration_since(*at) < duration);
        before - self.changed_at.len()
    }

    /// Number of tracked entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changed_at.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_at.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Allegiance, EntitySize};

    fn orc(current: i32, max: i32) -> Entity {
        Entity::new(IconId::new("orc.png"), Allegiance::Hostile, EntitySize::Small)
            .with_hitpoints(current, max)
    }

    #[test]
    fn test_damage_flashes_for_window() {
        let mut tracker = FlashTracker::new();
        let icon = IconId::new("orc.png");
        let t0 = Instant::now();

        let recorded = tracker.record_changes(&[orc(10, 10)], &[orc(5, 10)], t0);
        assert_eq!(recorded, 1);
        assert!(tracker.is_flashing(&icon, t0));
        assert!(tracker.is_flashing(&icon, t0 + Duration::from_millis(2999)));
        assert!(!tracker.is_flashing(&icon, t0 + Duration::from_millis(3000)));
    }

    #[test]
    fn test_phases_alternate() {
        let mut tracker = FlashTracker::new();
        let icon = IconId::new("orc.png");
        let t0 = Instant::now();
        tracker.record(icon.clone(), t0);

        let at = |ms| tracker.phase(&icon, t0 + Duration::from_millis(ms));
        assert_eq!(at(0), Some(FlashPhase::Translucent));
        assert_eq!(at(749), Some(FlashPhase::Translucent));
        assert_eq!(at(750), Some(FlashPhase::Opaque));
        assert_eq!(at(1500), Some(FlashPhase::Translucent));
        assert_eq!(at(2250), Some(FlashPhase::Opaque));
        assert_eq!(at(3000), None);
    }

    #[test]
    fn test_unchanged_and_new_entities_do_not_flash() {
        let mut tracker = FlashTracker::new();
        let t0 = Instant::now();
        let newcomer = Entity::new(IconId::new("elf.png"), Allegiance::Neutral, EntitySize::Small);

        let recorded = tracker.record_changes(&[orc(10, 10)], &[orc(10, 10), newcomer], t0);
        assert_eq!(recorded, 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_max_change_flashes() {
        let mut tracker = FlashTracker::new();
        let t0 = Instant::now();
        tracker.record_changes(&[orc(10, 10)], &[orc(10, 12)], t0);
        assert!(tracker.is_flashing(&IconId::new("orc.png"), t0));
    }

    #[test]
    fn test_prune_and_refresh() {
        let mut tracker = FlashTracker::new();
        let icon = IconId::new("orc.png");
        let t0 = Instant::now();
        tracker.record(icon.clone(), t0);

        // A second hit restarts the window.
        let t1 = t0 + Duration::from_millis(2000);
        tracker.record(icon.clone(), t1);
        assert!(tracker.is_flashing(&icon, t0 + Duration::from_millis(4000)));

        assert_eq!(tracker.prune(t1 + Duration::from_millis(1000)), 0);
        assert_eq!(tracker.prune(t1 + Duration::from_millis(3000)), 1);
        assert!(tracker.is_empty());
    }
}

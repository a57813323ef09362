//! Idle-time grid geometry recomputation.
//!
//! A grid size change only schedules work; the computation runs when the
//! display loop reports it is idle. A newer request supersedes a pending one,
//! so rapid size edits compute at most once.

use tableau_common::GeometryError;
use tracing::{debug, warn};

use crate::geometry::{compute_grid, GridGeometry};

/// Container dimensions and overflow the geometry is computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCanvas {
    /// Container width in pixels
    pub width: f64,
    /// Container height in pixels
    pub height: f64,
    /// Extra rows/columns past the edge
    pub overflow: u32,
}

/// Outcome of a [`GeometryScheduler::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Work queued for the next idle slot.
    Scheduled,
    /// A pending request for another size was replaced.
    Superseded {
        /// Size whose computation was dropped
        cancelled: u32,
    },
    /// Geometry is already current for this size.
    UpToDate,
    /// Non-positive size; nothing queued.
    Rejected,
}

/// Owns the current [`GridGeometry`] and the deferred work that replaces it.
#[derive(Debug, Clone)]
pub struct GeometryScheduler {
    canvas: GridCanvas,
    geometry: GridGeometry,
    computed_for: Option<u32>,
    pending: Option<u32>,
    overlay_revision: u64,
}

impl GeometryScheduler {
    /// Creates a scheduler holding the placeholder geometry.
    #[must_use]
    pub fn new(canvas: GridCanvas) -> Self {
        Self {
            canvas,
            geometry: GridGeometry::placeholder(),
            computed_for: None,
            pending: None,
            overlay_revision: 0,
        }
    }

    /// Queues a recomputation for `grid_size`.
    pub fn request(&mut self, grid_size: u32) -> ScheduleOutcome {
        if grid_size == 0 {
            warn!("ignoring grid size 0");
            self.pending = None;
            return ScheduleOutcome::Rejected;
        }
        if self.pending == Some(grid_size) {
            return ScheduleOutcome::Scheduled;
        }
        if self.pending.is_none() && self.computed_for == Some(grid_size) {
            return ScheduleOutcome::UpToDate;
        }
        match self.pending.replace(grid_size) {
            Some(cancelled) => {
                debug!(cancelled, grid_size, "geometry request superseded");
                ScheduleOutcome::Superseded { cancelled }
            },
            None => {
                debug!(grid_size, "geometry recomputation scheduled");
                ScheduleOutcome::Scheduled
            },
        }
    }

    /// Drops any pending request. Returns the size that was cancelled.
    pub fn cancel(&mut self) -> Option<u32> {
        let cancelled = self.pending.take();
        if let Some(size) = cancelled {
            debug!(grid_size = size, "geometry recomputation cancelled");
        }
        cancelled
    }

    /// Whether work is waiting for an idle slot.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Runs pending work, if any. Returns whether the geometry changed.
    ///
    /// Every successful run bumps the overlay revision so cached grid
    /// rasters keyed on it are invalidated.
    pub fn run_idle(&mut self) -> Result<bool, GeometryError> {
        let Some(grid_size) = self.pending.take() else {
            return Ok(false);
        };
        self.geometry = compute_grid(
            self.canvas.width,
            self.canvas.height,
            f64::from(grid_size),
            self.canvas.overflow,
        )?;
        self.computed_for = Some(grid_size);
        self.overlay_revision += 1;
        debug!(
            grid_size,
            columns = self.geometry.column_count(),
            rows = self.geometry.row_count(),
            revision = self.overlay_revision,
            "geometry recomputed"
        );
        Ok(true)
    }

    /// Current geometry (placeholder until the first run).
    #[must_use]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Grid size the current geometry was computed for.
    #[must_use]
    pub fn computed_for(&self) -> Option<u32> {
        self.computed_for
    }

    /// Counter bumped on every recomputation.
    #[must_use]
    pub fn overlay_revision(&self) -> u64 {
        self.overlay_revision
    }

    /// Container the geometry is computed for.
    #[must_use]
    pub fn canvas(&self) -> GridCanvas {
        self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> GeometryScheduler {
        GeometryScheduler::new(GridCanvas {
            width: 1667.0,
            height: 953.0,
            overflow: 3,
        })
    }

    #[test]
    fn test_request_is_deferred() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.request(100), ScheduleOutcome::Scheduled);
        assert_eq!(scheduler.geometry(), &GridGeometry::placeholder());
        assert_eq!(scheduler.overlay_revision(), 0);

        assert_eq!(scheduler.run_idle(), Ok(true));
        assert_eq!(scheduler.geometry().column_count(), 14);
        assert_eq!(scheduler.overlay_revision(), 1);
        assert_eq!(scheduler.run_idle(), Ok(false));
    }

    #[test]
    fn test_newer_request_supersedes() {
        let mut scheduler = scheduler();
        scheduler.request(100);
        assert_eq!(
            scheduler.request(50),
            ScheduleOutcome::Superseded { cancelled: 100 }
        );
        assert_eq!(scheduler.run_idle(), Ok(true));
        assert_eq!(scheduler.computed_for(), Some(50));
        assert_eq!(scheduler.overlay_revision(), 1);
    }

    #[test]
    fn test_same_size_is_up_to_date() {
        let mut scheduler = scheduler();
        scheduler.request(100);
        assert_eq!(scheduler.request(100), ScheduleOutcome::Scheduled);
        let _ = scheduler.run_idle();
        assert_eq!(scheduler.request(100), ScheduleOutcome::UpToDate);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn test_zero_size_rejected_and_clears_pending() {
        let mut scheduler = scheduler();
        scheduler.request(80);
        assert_eq!(scheduler.request(0), ScheduleOutcome::Rejected);
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.run_idle(), Ok(false));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.cancel(), None);
        scheduler.request(60);
        assert_eq!(scheduler.cancel(), Some(60));
        assert_eq!(scheduler.run_idle(), Ok(false));
        assert_eq!(scheduler.geometry(), &GridGeometry::placeholder());
    }

    #[test]
    fn test_empty_canvas_surfaces_error() {
        let mut scheduler = GeometryScheduler::new(GridCanvas {
            width: 0.0,
            height: 953.0,
            overflow: 3,
        });
        scheduler.request(100);
        assert!(scheduler.run_idle().is_err());
    }
}

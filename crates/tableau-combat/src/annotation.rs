//! Right-button arrow annotation.
//!
//! Press-drag-release draws an arrow between two hex cells. The next right
//! press clears it; only a press after that starts a new arrow.

use tableau_common::{GridCoord, PercentPoint};
use tracing::debug;

use crate::geometry::GridGeometry;
use crate::pointer::nearest_cell;

/// Arrow snapped to hex cells at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    /// Cell under the press
    pub start: GridCoord,
    /// Cell under the release (or the pointer while drawing)
    pub end: GridCoord,
}

/// Annotation gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationState {
    /// No annotation.
    #[default]
    Idle,
    /// Right button is held.
    Drawing {
        /// Cell under the press
        start: GridCoord,
    },
    /// Arrow is on screen until the next right press.
    Shown {
        /// Arrow tail
        start: GridCoord,
        /// Arrow head
        end: GridCoord,
    },
}

/// Drives [`AnnotationState`] from right-button pointer events.
#[derive(Debug, Clone, Default)]
pub struct AnnotationController {
    state: AnnotationState,
    cursor: Option<GridCoord>,
    // Set when a press cleared an arrow; its release must not draw.
    swallow_release: bool,
}

impl AnnotationController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AnnotationState {
        self.state
    }

    /// Right button pressed.
    pub fn press(&mut self, pointer: PercentPoint, geometry: &GridGeometry) {
        match self.state {
            AnnotationState::Idle => {
                let start = nearest_cell(pointer, geometry);
                debug!(%start, "annotation started");
                self.state = AnnotationState::Drawing { start };
                self.cursor = Some(start);
                self.swallow_release = false;
            },
            AnnotationState::Drawing { .. } => {},
            AnnotationState::Shown { .. } => {
                debug!("annotation cleared");
                self.state = AnnotationState::Idle;
                self.cursor = None;
                self.swallow_release = true;
            },
        }
    }

    /// Pointer moved. Only tracked while drawing.
    pub fn drag(&mut self, pointer: PercentPoint, geometry: &GridGeometry) {
        if matches!(self.state, AnnotationState::Drawing { .. }) {
            self.cursor = Some(nearest_cell(pointer, geometry));
        }
    }

    /// Right button released.
    pub fn release(&mut self, pointer: PercentPoint, geometry: &GridGeometry) {
        if self.swallow_release {
            self.swallow_release = false;
            return;
        }
        if let AnnotationState::Drawing { start } = self.state {
            let end = nearest_cell(pointer, geometry);
            debug!(%start, %end, "annotation shown");
            self.state = AnnotationState::Shown { start, end };
            self.cursor = None;
        }
    }

    /// Drops any annotation, e.g. when the scene changes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The finished arrow, if one is shown.
    #[must_use]
    pub fn arrow(&self) -> Option<Arrow> {
        match self.state {
            AnnotationState::Shown { start, end } => Some(Arrow { start, end }),
            _ => None,
        }
    }

    /// Line from the press cell to the cell under the pointer while drawing.
    #[must_use]
    pub fn rubber_band(&self) -> Option<Arrow> {
        match (self.state, self.cursor) {
            (AnnotationState::Drawing { start }, Some(end)) => Some(Arrow { start, end }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute_grid;

    fn grid() -> GridGeometry {
        compute_grid(1667.0, 953.0, 100.0, 3).expect("valid grid")
    }

    fn at(geometry: &GridGeometry, col: i32, row: i32) -> PercentPoint {
        geometry
            .cell_center(GridCoord::new(col, row))
            .expect("in range")
    }

    #[test]
    fn test_draw_then_clear() {
        let geometry = grid();
        let mut annotation = AnnotationController::new();

        annotation.press(at(&geometry, 2, 3), &geometry);
        annotation.drag(at(&geometry, 4, 2), &geometry);
        annotation.drag(at(&geometry, 5, 1), &geometry);
        annotation.release(at(&geometry, 5, 1), &geometry);
        assert_eq!(
            annotation.state(),
            AnnotationState::Shown {
                start: GridCoord::new(2, 3),
                end: GridCoord::new(5, 1)
            }
        );

        // Plain right click clears without starting a new arrow.
        annotation.press(at(&geometry, 7, 7), &geometry);
        annotation.release(at(&geometry, 7, 7), &geometry);
        assert_eq!(annotation.state(), AnnotationState::Idle);
        assert!(annotation.arrow().is_none());

        annotation.press(at(&geometry, 1, 1), &geometry);
        assert_eq!(
            annotation.state(),
            AnnotationState::Drawing {
                start: GridCoord::new(1, 1)
            }
        );
    }

    #[test]
    fn test_rubber_band_follows_pointer() {
        let geometry = grid();
        let mut annotation = AnnotationController::new();
        assert!(annotation.rubber_band().is_none());

        annotation.press(at(&geometry, 0, 0), &geometry);
        annotation.drag(at(&geometry, 3, 2), &geometry);
        assert_eq!(
            annotation.rubber_band(),
            Some(Arrow {
                start: GridCoord::ORIGIN,
                end: GridCoord::new(3, 2)
            })
        );
        // Drawing is a derived display state, not a transition.
        assert!(annotation.arrow().is_none());
    }

    #[test]
    fn test_press_while_drawing_is_ignored() {
        let geometry = grid();
        let mut annotation = AnnotationController::new();
        annotation.press(at(&geometry, 2, 2), &geometry);
        annotation.press(at(&geometry, 6, 6), &geometry);
        assert_eq!(
            annotation.state(),
            AnnotationState::Drawing {
                start: GridCoord::new(2, 2)
            }
        );
    }

    #[test]
    fn test_release_without_press_is_noop() {
        let geometry = grid();
        let mut annotation = AnnotationController::new();
        annotation.release(at(&geometry, 2, 2), &geometry);
        annotation.drag(at(&geometry, 2, 2), &geometry);
        assert_eq!(annotation.state(), AnnotationState::Idle);
    }
}

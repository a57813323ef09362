//! Entity placement selection.
//!
//! At most one entity is armed at a time. A left click on the grid while an
//! entity is armed resolves to a placement on the nearest cell.

use tableau_common::{GridCoord, IconId, PercentPoint};
use tracing::debug;

use crate::geometry::GridGeometry;
use crate::pointer::nearest_cell;

/// Current selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// Nothing armed.
    #[default]
    Idle,
    /// Waiting for a placement click.
    Armed(IconId),
}

/// What a selection input resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Input had no effect.
    Unchanged,
    /// An entity is now armed (replacing any previous one).
    Armed(IconId),
    /// The armed entity should move to `location`.
    Placed {
        /// Entity to move
        icon: IconId,
        /// Target cell
        location: GridCoord,
    },
    /// The armed entity was clicked again and released.
    Deselected(IconId),
    /// A cancel gesture released the armed entity.
    Cancelled(IconId),
}

impl SelectionOutcome {
    /// Whether selection listeners need to hear about this outcome.
    #[must_use]
    pub const fn changes_selection(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Selection state machine plus hover tracking.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
    hovered: Option<IconId>,
}

impl SelectionController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Armed entity, if any.
    #[must_use]
    pub fn armed(&self) -> Option<&IconId> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Armed(icon) => Some(icon),
        }
    }

    /// Whether `icon` is the armed entity.
    #[must_use]
    pub fn is_armed(&self, icon: &IconId) -> bool {
        self.armed() == Some(icon)
    }

    /// Picks an entity from the roster or the grid.
    ///
    /// Picking the armed entity again deselects it; picking another one
    /// replaces it.
    pub fn pick(&mut self, icon: IconId) -> SelectionOutcome {
        if self.is_armed(&icon) {
            debug!(%icon, "entity deselected");
            self.state = SelectionState::Idle;
            return SelectionOutcome::Deselected(icon);
        }
        debug!(%icon, "entity armed");
        self.state = SelectionState::Armed(icon.clone());
        SelectionOutcome::Armed(icon)
    }

    /// Left click on the grid (not on an entity).
    pub fn click(&mut self, pointer: PercentPoint, geometry: &GridGeometry) -> SelectionOutcome {
        match std::mem::take(&mut self.state) {
            SelectionState::Idle => SelectionOutcome::Unchanged,
            SelectionState::Armed(icon) => {
                let location = nearest_cell(pointer, geometry);
                debug!(%icon, %location, "entity placed");
                SelectionOutcome::Placed { icon, location }
            },
        }
    }

    /// Right click or any other cancel gesture.
    pub fn cancel(&mut self) -> SelectionOutcome {
        match std::mem::take(&mut self.state) {
            SelectionState::Idle => SelectionOutcome::Unchanged,
            SelectionState::Armed(icon) => SelectionOutcome::Cancelled(icon),
        }
    }

    /// Drops the selection if the entity left the scene.
    pub fn forget_missing(&mut self, still_present: impl Fn(&IconId) -> bool) {
        if let SelectionState::Armed(icon) = &self.state {
            if !still_present(icon) {
                debug!(%icon, "armed entity left the scene");
                self.state = SelectionState::Idle;
            }
        }
        if self.hovered.as_ref().is_some_and(|icon| !still_present(icon)) {
            self.hovered = None;
        }
    }

    /// Pointer entered (`Some`) or left (`None`) an entity.
    pub fn hover(&mut self, icon: Option<IconId>) {
        self.hovered = icon;
    }

    /// Hovered entity, if any.
    #[must_use]
    pub fn hovered(&self) -> Option<&IconId> {
        self.hovered.as_ref()
    }
}

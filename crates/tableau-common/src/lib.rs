//! # Tableau Common
//!
//! Value types shared by the constructor, the display and their collaborators.
//!
//! - Grid cells, container percentages and pixel offsets
//! - Icon, battlemap and chapter names
//! - `major.minor` versions for files and sync messages
//! - The error taxonomy every Tableau crate reports through

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Everything, for glob imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_coord_parity() {
        assert!(!GridCoord::new(4, 0).is_odd_row());
        assert!(GridCoord::new(4, 1).is_odd_row());
        assert!(GridCoord::new(0, -1).is_odd_row());
    }

    #[test]
    fn test_icon_stem() {
        let icon = IconId::new("a1b2c3.png");
        assert_eq!(icon.stem(), Some("a1b2c3"));
        assert_eq!(IconId::new("a1b2c3.jpg").stem(), None);
    }

    #[test]
    fn test_store_errors_convert() {
        let err: TableauError = StoreError::ChapterNotFound("Act One".into()).into();
        assert_eq!(err.to_string(), "Store error: Chapter 'Act One' not found");
    }
}

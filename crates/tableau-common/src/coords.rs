//! Coordinate types for grid cells, container percentages, and pixel offsets.

use serde::{Deserialize, Serialize};

/// Cell address in the logical hex grid.
///
/// Serialized as `{ "x": col, "y": row }` to stay readable by existing
/// chapter and entity files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    /// Column index
    #[serde(rename = "x")]
    pub col: i32,
    /// Row index
    #[serde(rename = "y")]
    pub row: i32,
}

impl GridCoord {
    /// The top-left cell.
    pub const ORIGIN: Self = Self { col: 0, row: 0 };

    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Odd rows are shifted right by half a hex ("brick" layout).
    #[must_use]
    pub const fn is_odd_row(self) -> bool {
        self.row % 2 != 0
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A position expressed as percentages of the display container.
///
/// `x = 0` is the left edge and `x = 100` the right edge; the same holds for
/// `y` with the container height. Values outside `0..=100` are valid and
/// describe positions past the visible canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    /// Horizontal percentage of container width
    pub x: f64,
    /// Vertical percentage of container height
    pub y: f64,
}

impl PercentPoint {
    /// Creates a new percentage point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Converts a pixel position relative to the container's top-left corner.
    ///
    /// Returns `None` for a degenerate (zero-sized) container.
    #[must_use]
    pub fn from_pixels(px: f64, py: f64, width: f64, height: f64) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(Self {
            x: px / width * 100.0,
            y: py / height * 100.0,
        })
    }

    /// Converts back to pixels for a container of the given size.
    #[must_use]
    pub fn to_pixels(self, width: f64, height: f64) -> (f64, f64) {
        (self.x / 100.0 * width, self.y / 100.0 * height)
    }
}

/// Integer pixel offset used for battlemap and grid alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal offset
    pub x: i32,
    /// Vertical offset
    pub y: i32,
}

impl Offset {
    /// No offset.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a new offset.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_grid_coord_json_shape() {
        let json = serde_json::to_string(&GridCoord::new(3, 7)).expect("serialize");
        assert_eq!(json, r#"{"x":3,"y":7}"#);

        let parsed: GridCoord = serde_json::from_str(r#"{"x":1,"y":2}"#).expect("parse");
        assert_eq!(parsed, GridCoord::new(1, 2));
    }

    #[test]
    fn test_percent_from_degenerate_container() {
        assert!(PercentPoint::from_pixels(10.0, 10.0, 0.0, 953.0).is_none());
    }

    proptest! {
        #[test]
        fn prop_pixel_percent_round_trip(
            px in -500.0f64..3000.0,
            py in -500.0f64..3000.0,
            w in 1.0f64..4000.0,
            h in 1.0f64..4000.0,
        ) {
            let p = PercentPoint::from_pixels(px, py, w, h).expect("non-degenerate");
            let (bx, by) = p.to_pixels(w, h);
            prop_assert!((bx - px).abs() < 1e-6);
            prop_assert!((by - py).abs() < 1e-6);
        }
    }
}

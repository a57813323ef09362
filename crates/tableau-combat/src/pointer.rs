//! Pointer-to-grid lookup.
//!
//! Maps a pointer position in container percentages to the closest hex cell.
//! The row is resolved first because it decides whether the odd-row shift
//! applies to the column search.

use tableau_common::{GridCoord, PercentPoint};

use crate::geometry::GridGeometry;

/// Returns the cell whose center is closest to the pointer.
///
/// Never fails: positions outside the canvas resolve to the nearest edge
/// cell. Ties go to the lowest index.
#[must_use]
pub fn nearest_cell(pointer: PercentPoint, geometry: &GridGeometry) -> GridCoord {
    let row = nearest_index(geometry.centers_y(), pointer.y);
    let adjusted_x = if row % 2 != 0 {
        pointer.x - geometry.row_offset_percent()
    } else {
        pointer.x
    };
    let col = nearest_index(geometry.centers_x(), adjusted_x);

    GridCoord::new(col as i32, row as i32)
}

/// Linear argmin of `|value - target|`, keeping the first minimum.
fn nearest_index(values: &[f64], target: f64) -> usize {
    let mut nearest = 0;
    let mut min = f64::INFINITY;
    for (i, value) in values.iter().enumerate() {
        let distance = (value - target).abs();
        if distance < min {
            min = distance;
            nearest = i;
        }
    }
    nearest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute_grid;
    use proptest::prelude::*;

    const WIDTH: f64 = 1667.0;
    const HEIGHT: f64 = 953.0;

    #[test]
    fn test_second_column_center_resolves() {
        let grid = compute_grid(WIDTH, HEIGHT, 100.0, 3).expect("valid grid");

        // Pixel position of the second center, converted the way the display does.
        let px = 3.0_f64.sqrt() * 100.0;
        let pointer = PercentPoint::from_pixels(px, 0.0, WIDTH, HEIGHT).expect("container");
        assert_eq!(nearest_cell(pointer, &grid), GridCoord::new(1, 0));
    }

    #[test]
    fn test_odd_row_uses_offset() {
        let grid = compute_grid(WIDTH, HEIGHT, 100.0, 3).expect("valid grid");
        let y = grid.centers_y()[1];

        // Slightly left of column 1's unshifted center. On an even row that is
        // column 1; on an odd row it falls inside the shifted column 0.
        let x = grid.centers_x()[1] - grid.row_offset_percent() * 0.7;
        assert_eq!(
            nearest_cell(PercentPoint::new(x, grid.centers_y()[0]), &grid),
            GridCoord::new(1, 0)
        );
        assert_eq!(nearest_cell(PercentPoint::new(x, y), &grid), GridCoord::new(0, 1));
    }

    #[test]
    fn test_out_of_bounds_clamps_to_edge() {
        let grid = compute_grid(WIDTH, HEIGHT, 100.0, 3).expect("valid grid");
        assert_eq!(
            nearest_cell(PercentPoint::new(-40.0, -40.0), &grid),
            GridCoord::ORIGIN
        );
        let far = nearest_cell(PercentPoint::new(900.0, 900.0), &grid);
        assert_eq!(far.col as usize, grid.column_count() - 1);
        assert_eq!(far.row as usize, grid.row_count() - 1);
    }

    #[test]
    fn test_tie_prefers_lowest_index() {
        assert_eq!(nearest_index(&[0.0, 2.0, 4.0], 1.0), 0);
        assert_eq!(nearest_index(&[0.0, 2.0, 4.0], 3.0), 1);
    }

    #[test]
    fn test_placeholder_always_origin() {
        let grid = GridGeometry::placeholder();
        assert_eq!(
            nearest_cell(PercentPoint::new(55.0, 12.0), &grid),
            GridCoord::ORIGIN
        );
    }

    proptest! {
        #[test]
        fn prop_center_round_trip(
            size in 20.0f64..250.0,
            overflow in 0u32..5,
            col_pick in 0usize..1000,
            row_pick in 0usize..1000,
        ) {
            let grid = compute_grid(WIDTH, HEIGHT, size, overflow).expect("valid grid");
            let coord = GridCoord::new(
                (col_pick % grid.column_count()) as i32,
                (row_pick % grid.row_count()) as i32,
            );
            let center = grid.cell_center(coord).expect("in range");
            prop_assert_eq!(nearest_cell(center, &grid), coord);
        }

        #[test]
        fn prop_nearest_is_idempotent(
            x in -50.0f64..150.0,
            y in -50.0f64..150.0,
            size in 20.0f64..250.0,
        ) {
            let grid = compute_grid(WIDTH, HEIGHT, size, 3).expect("valid grid");
            let cell = nearest_cell(PercentPoint::new(x, y), &grid);
            let center = grid.cell_center(cell).expect("nearest cell is addressable");
            prop_assert_eq!(nearest_cell(center, &grid), cell);
        }
    }
}

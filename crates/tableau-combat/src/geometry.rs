//! Hex grid geometry.
//!
//! The display renders the grid in container-percentage space so the layout
//! is resolution independent. Hexes are pointy-topped and laid out in rows;
//! every odd row is shifted right by half a hex ("brick" offset).
//!
//! The overlay rasterizer works in pixel space through [`pixel_centers`],
//! which uses the same [`HexSpacing`] so both stay numerically consistent.

use serde::{Deserialize, Serialize};
use tableau_common::{GeometryError, GridCoord, PercentPoint};

/// Extra rows/columns computed past the container edge so edge cells are
/// never clipped and out-of-bounds clicks still resolve to a cell.
pub const DEFAULT_OVERFLOW: u32 = 3;

/// Spacing between neighbouring hex centers for a given hex size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexSpacing {
    hex_size: f64,
    horizontal: f64,
    vertical: f64,
}

impl HexSpacing {
    /// Derives the spacing for a hex of the given size (center to vertex).
    pub fn new(hex_size: f64) -> Result<Self, GeometryError> {
        if !hex_size.is_finite() || hex_size <= 0.0 {
            return Err(GeometryError::NonPositiveHexSize(hex_size));
        }
        let hex_width = 3.0_f64.sqrt() * hex_size;
        let hex_height = 2.0 * hex_size;
        Ok(Self {
            hex_size,
            horizontal: hex_width,
            vertical: hex_height * 3.0 / 4.0,
        })
    }

    /// Hex size (center to vertex) in pixels.
    #[must_use]
    pub const fn hex_size(&self) -> f64 {
        self.hex_size
    }

    /// Distance between column centers (equals the hex width).
    #[must_use]
    pub const fn horizontal(&self) -> f64 {
        self.horizontal
    }

    /// Distance between row centers (three quarters of the hex height).
    #[must_use]
    pub const fn vertical(&self) -> f64 {
        self.vertical
    }

    /// Columns needed to cover `width` pixels, without overflow.
    #[must_use]
    pub fn columns_for(&self, width: f64) -> u32 {
        (width / self.horizontal).ceil() as u32
    }

    /// Rows needed to cover `height` pixels, without overflow.
    #[must_use]
    pub fn rows_for(&self, height: f64) -> u32 {
        (height / self.vertical).ceil() as u32
    }
}

/// Hex center positions in container-percentage space.
///
/// A value type: it is recomputed (never mutated) whenever the grid size
/// changes and can be shared read-only by the renderer and pointer lookup.
///
/// Invariant: `centers_x` and `centers_y` are non-empty and non-decreasing,
/// both starting at `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    hex_size: f64,
    centers_x: Vec<f64>,
    centers_y: Vec<f64>,
    row_offset_percent: f64,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl GridGeometry {
    /// Single-cell geometry used before the first computation finishes.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            hex_size: 0.0,
            centers_x: vec![0.0],
            centers_y: vec![0.0],
            row_offset_percent: 0.0,
        }
    }

    /// Hex size the geometry was computed for (`0` for the placeholder).
    #[must_use]
    pub fn hex_size(&self) -> f64 {
        self.hex_size
    }

    /// Column center percentages, left to right.
    #[must_use]
    pub fn centers_x(&self) -> &[f64] {
        &self.centers_x
    }

    /// Row center percentages, top to bottom.
    #[must_use]
    pub fn centers_y(&self) -> &[f64] {
        &self.centers_y
    }

    /// Horizontal shift applied to every odd row, in percent of width.
    #[must_use]
    pub fn row_offset_percent(&self) -> f64 {
        self.row_offset_percent
    }

    /// Number of addressable columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.centers_x.len()
    }

    /// Number of addressable rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.centers_y.len()
    }

    /// Whether the cell is addressable in this geometry.
    #[must_use]
    pub fn contains(&self, coord: GridCoord) -> bool {
        usize::try_from(coord.col).is_ok_and(|c| c < self.column_count())
            && usize::try_from(coord.row).is_ok_and(|r| r < self.row_count())
    }

    /// Rendered center of a cell, including the odd-row shift.
    #[must_use]
    pub fn cell_center(&self, coord: GridCoord) -> Option<PercentPoint> {
        let col = usize::try_from(coord.col).ok()?;
        let row = usize::try_from(coord.row).ok()?;
        let x = *self.centers_x.get(col)?;
        let y = *self.centers_y.get(row)?;
        let shift = if coord.is_odd_row() {
            self.row_offset_percent
        } else {
            0.0
        };
        Some(PercentPoint::new(x + shift, y))
    }

    /// Distance between neighbouring column centers, in percent of width.
    #[must_use]
    pub fn column_spacing_percent(&self) -> f64 {
        match self.centers_x.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Token height for an entity placed on this grid, in percent.
    #[must_use]
    pub fn token_height_percent(&self) -> f64 {
        self.column_spacing_percent() * 2.0
    }
}

/// Computes hex centers for a container, in percentage coordinates.
///
/// Produces `ceil(extent / spacing) + overflow + 1` centers per axis, starting
/// at `0`. Pure; callers schedule it off the interactive path.
pub fn compute_grid(
    container_width: f64,
    container_height: f64,
    hex_size: f64,
    overflow: u32,
) -> Result<GridGeometry, GeometryError> {
    if !(container_width > 0.0 && container_height > 0.0) {
        return Err(GeometryError::EmptyContainer {
            width: container_width,
            height: container_height,
        });
    }
    let spacing = HexSpacing::new(hex_size)?;

    let columns = spacing.columns_for(container_width) + overflow;
    let rows = spacing.rows_for(container_height) + overflow;

    let centers_x = (0..=columns)
        .map(|col| f64::from(col) * spacing.horizontal() / container_width * 100.0)
        .collect();
    let centers_y = (0..=rows)
        .map(|row| f64::from(row) * spacing.vertical() / container_height * 100.0)
        .collect();

    Ok(GridGeometry {
        hex_size,
        centers_x,
        centers_y,
        row_offset_percent: spacing.horizontal() / 2.0 / container_width * 100.0,
    })
}

/// Hex centers in pixel space, including `overflow` rings on every side.
///
/// Rows and columns run from `-overflow` to `ceil(extent / spacing) +
/// overflow`; odd rows (negative ones included) are shifted right by half the
/// horizontal spacing. Cells with non-negative indices coincide with the
/// percentage centers of [`compute_grid`].
pub fn pixel_centers(
    container_width: u32,
    container_height: u32,
    spacing: HexSpacing,
    overflow: u32,
) -> Vec<(f64, f64)> {
    let overflow = overflow as i64;
    let columns = i64::from(spacing.columns_for(f64::from(container_width))) + overflow;
    let rows = i64::from(spacing.rows_for(f64::from(container_height))) + overflow;

    let mut centers = Vec::with_capacity(((columns + overflow) * (rows + overflow)).max(0) as usize);
    for row in -overflow..rows {
        let cy = row as f64 * spacing.vertical();
        for col in -overflow..columns {
            let mut cx = col as f64 * spacing.horizontal();
            if row % 2 != 0 {
                cx += spacing.horizontal() / 2.0;
            }
            centers.push((cx, cy));
        }
    }
    centers
}

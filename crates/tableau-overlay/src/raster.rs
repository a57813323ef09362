//! Pixel-space hex outline rasterization.
//!
//! Hexes are pointy-topped, matching the display geometry. Outlines are drawn
//! as a chain of small filled discs stepped along each edge, which gives an
//! even stroke width at every angle.

use image::{Rgba, RgbaImage};
use tableau_combat::{pixel_centers, HexSpacing};
use tableau_common::GeometryError;

/// Outline colour.
pub const LINE_COLOR: Rgba<u8> = Rgba([122, 122, 122, 255]);

/// Outline stroke width in pixels.
pub const LINE_THICKNESS: u32 = 2;

/// Corner positions of a pointy-top hex, clockwise from the lower right.
///
/// Corner `i` sits at `30° + 60°·i` from the positive x axis, `size` pixels
/// from the center.
#[must_use]
pub fn hex_vertices(center: (f64, f64), size: f64) -> [(f64, f64); 6] {
    let mut vertices = [(0.0, 0.0); 6];
    for (i, vertex) in vertices.iter_mut().enumerate() {
        let angle = (60.0 * i as f64 + 30.0).to_radians();
        *vertex = (center.0 + size * angle.cos(), center.1 + size * angle.sin());
    }
    vertices
}

/// Fills a disc, clipped to the image.
fn fill_disc(image: &mut RgbaImage, center: (i64, i64), radius: i64, color: Rgba<u8>) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (center.0 + dx, center.1 + dy);
            if (0..width).contains(&x) && (0..height).contains(&y) {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Draws a thick line between two pixel positions.
pub fn draw_thick_line(
    image: &mut RgbaImage,
    start: (i64, i64),
    end: (i64, i64),
    thickness: u32,
    color: Rgba<u8>,
) {
    let radius = i64::from(thickness / 2);
    let (dx, dy) = ((end.0 - start.0) as f64, (end.1 - start.1) as f64);
    let steps = dx.hypot(dy) as i64;
    if steps == 0 {
        fill_disc(image, start, radius, color);
        return;
    }

    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = start.0 + (t * dx).round() as i64;
        let y = start.1 + (t * dy).round() as i64;
        fill_disc(image, (x, y), radius, color);
    }
}

/// Rasterizes the full grid onto a transparent canvas.
///
/// Covers the canvas plus `overflow` rings on every side, so partial hexes
/// along each edge are drawn.
pub fn rasterize_grid(
    width: u32,
    height: u32,
    hex_size: f64,
    overflow: u32,
) -> Result<RgbaImage, GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::EmptyContainer {
            width: f64::from(width),
            height: f64::from(height),
        });
    }
    let spacing = HexSpacing::new(hex_size)?;
    let mut image = RgbaImage::new(width, height);

    for center in pixel_centers(width, height, spacing, overflow) {
        let corners =
            hex_vertices(center, hex_size).map(|(x, y)| (x.round() as i64, y.round() as i64));
        for (&start, &end) in corners.iter().zip(corners.iter().cycle().skip(1)) {
            draw_thick_line(&mut image, start, end, LINE_THICKNESS, LINE_COLOR);
        }
    }
    Ok(image)
}

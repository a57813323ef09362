//! # Tableau Overlay
//!
//! Hex grid overlay images for Tableau battlemaps.
//!
//! This crate provides:
//! - Pointy-top hex outline rasterization in pixel space
//! - A cached PNG [`OverlayRenderer`] with a `.meta` parameter sidecar
//!
//! [`OverlayRenderer`]: tableau_combat::OverlayRenderer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod raster;
pub mod renderer;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::raster::*;
    pub use crate::renderer::*;
}

pub use prelude::*;

//! # Tableau World
//!
//! On-disk chapter and entity storage for Tableau.
//!
//! This crate handles:
//! - Chapter files (combat scenes, landscapes, splashes)
//! - Per-entity files referenced from combat scenes
//! - Atomic JSON writes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod store;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::store::*;
}

pub use prelude::*;

//! # Tableau Combat
//!
//! Hex grid engine and combat display state machines for Tableau.
//!
//! This crate provides:
//! - Grid geometry in container percentages and pointer-to-cell lookup
//! - The entity roster and the edits a game master applies to it
//! - Selection, annotation and damage flash state machines
//! - Idle-time geometry scheduling
//! - The constructor/display sync protocol and both surfaces
//! - Owned application state and the persistence/overlay collaborator traits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod annotation;
pub mod app_state;
pub mod campaign;
pub mod constructor;
pub mod display;
pub mod entity;
pub mod flash;
pub mod geometry;
pub mod health;
pub mod idle;
pub mod persistence;
pub mod pointer;
pub mod roster;
pub mod scene;
pub mod selection;
pub mod sync;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::annotation::*;
    pub use crate::app_state::*;
    pub use crate::campaign::*;
    pub use crate::constructor::*;
    pub use crate::display::*;
    pub use crate::entity::*;
    pub use crate::flash::*;
    pub use crate::geometry::*;
    pub use crate::health::*;
    pub use crate::idle::*;
    pub use crate::persistence::*;
    pub use crate::pointer::*;
    pub use crate::roster::*;
    pub use crate::scene::*;
    pub use crate::selection::*;
    pub use crate::sync::*;
}

pub use prelude::*;

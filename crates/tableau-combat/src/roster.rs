//! In-memory entity list for the active combat scene.

use tableau_common::IconId;
use thiserror::Error;

use crate::entity::{Entity, EntityEdit};

/// Errors from roster lookups and edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// No entity with this icon in the scene
    #[error("entity not in scene: {0}")]
    NotFound(IconId),

    /// Icon ids must be unique within a scene
    #[error("entity already in scene: {0}")]
    Duplicate(IconId),
}

/// Ordered set of entities keyed by icon id.
///
/// Order follows the scene's entity list so rendering stays stable between
/// snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    entities: Vec<Entity>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a snapshot.
    #[must_use]
    pub fn from_snapshot(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Replaces the whole list, returning the previous one.
    pub fn replace(&mut self, entities: Vec<Entity>) -> Vec<Entity> {
        std::mem::replace(&mut self.entities, entities)
    }

    /// Looks up an entity by icon.
    #[must_use]
    pub fn get(&self, icon: &IconId) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.icon == icon)
    }

    /// Whether an entity with this icon exists.
    #[must_use]
    pub fn contains(&self, icon: &IconId) -> bool {
        self.get(icon).is_some()
    }

    /// Adds an entity at the end of the list.
    pub fn insert(&mut self, entity: Entity) -> Result<(), RosterError> {
        if self.contains(&entity.icon) {
            return Err(RosterError::Duplicate(entity.icon));
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Removes an entity, returning it.
    pub fn remove(&mut self, icon: &IconId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| &e.icon == icon)?;
        Some(self.entities.remove(index))
    }

    /// Applies an edit in place and returns the updated entity.
    pub fn apply(&mut self, icon: &IconId, edit: &EntityEdit) -> Result<&Entity, RosterError> {
        let entity = self
            .entities
            .iter_mut()
            .find(|e| &e.icon == icon)
            .ok_or_else(|| RosterError::NotFound(icon.clone()))?;
        edit.apply(entity);
        Ok(entity)
    }

    /// Returns an edited copy without touching the store.
    ///
    /// Used where the change must round-trip through persistence before it
    /// becomes visible.
    pub fn preview(&self, icon: &IconId, edit: &EntityEdit) -> Result<Entity, RosterError> {
        let mut entity = self
            .get(icon)
            .cloned()
            .ok_or_else(|| RosterError::NotFound(icon.clone()))?;
        edit.apply(&mut entity);
        Ok(entity)
    }

    /// Iterates in scene order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Entity count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Borrowed slice in scene order.
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    /// Owned copy for broadcasting.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Entity> {
        self.entities.clone()
    }
}

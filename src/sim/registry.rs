//! Entity registry
//!
//! Insertion-ordered entities plus a key index. Order is stable, which keeps
//! collision-pair enumeration and draw order deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::collision;
use super::entity::{Entity, GameEvent};
use crate::error::GameError;

/// Ordered entity collection with unique keys
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    /// key -> position in `entities`
    index: HashMap<String, usize>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity. Keys must be unique.
    pub fn add(&mut self, entity: Entity) -> Result<(), GameError> {
        if self.index.contains_key(entity.key()) {
            return Err(GameError::DuplicateEntity(entity.key().to_string()));
        }
        self.index.insert(entity.key().to_string(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Remove by key, preserving the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<Entity> {
        let pos = self.index.remove(key)?;
        let entity = self.entities.remove(pos);
        self.reindex();
        Some(entity)
    }

    /// Drop every destroyed entity, returning how many went
    pub fn remove_destroyed(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| !e.is_destroyed());
        let removed = before - self.entities.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.index.get(key).map(|&pos| &self.entities[pos])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.index.get(key).map(|&pos| &mut self.entities[pos])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.index.clear();
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Run `f` on the entity at `pos` with read access to all the others
    pub fn update_at<F, R>(&mut self, pos: usize, f: F) -> R
    where
        F: FnOnce(&mut Entity, Siblings<'_>) -> R,
    {
        let (before, rest) = self.entities.split_at_mut(pos);
        let (current, after) = rest
            .split_first_mut()
            .unwrap_or_else(|| panic!("update_at({}) out of bounds", pos));
        let siblings = Siblings {
            before,
            after,
            index: &self.index,
            skip: pos,
        };
        f(current, siblings)
    }

    /// Resolve collisions between the entity at `pos` and every later one
    pub fn resolve_pairs_from(&mut self, pos: usize, events: &mut Vec<GameEvent>) -> usize {
        collision::resolve_pairs_from(&mut self.entities, pos, events)
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (pos, entity) in self.entities.iter().enumerate() {
            self.index.insert(entity.key().to_string(), pos);
        }
    }
}

/// Read-only view of every entity except the one being updated
#[derive(Clone, Copy)]
pub struct Siblings<'a> {
    before: &'a [Entity],
    after: &'a [Entity],
    index: &'a HashMap<String, usize>,
    skip: usize,
}

impl<'a> Siblings<'a> {
    /// Look up a sibling by key. The entity being updated is not its own sibling.
    pub fn get(&self, key: &str) -> Option<&'a Entity> {
        let &pos = self.index.get(key)?;
        match pos.cmp(&self.skip) {
            Ordering::Less => self.before.get(pos),
            Ordering::Equal => None,
            Ordering::Greater => self.after.get(pos - self.skip - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Entity> {
        self.before.iter().chain(self.after.iter())
    }
}

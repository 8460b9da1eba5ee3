//! The entity-access surface shared by in-memory and durable sessions.
//!
//! Host code written against [`EntityStorage`] works unchanged whether it is
//! handed a [`MemorySession`] or a [`SessionController`](crate::SessionController).

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::EntityCache;
use crate::error::Result;

/// Minimal capability set a session must offer for entity caching.
#[async_trait]
pub trait EntityStorage<E: Send + Sync + 'static>: Send {
    /// The entity cached under `id`, if any.
    fn get_entity(&self, id: i64) -> Option<Arc<E>>;

    /// Caches `entity` under `id`. Durable implementations persist before
    /// returning.
    async fn set_entity(&mut self, id: i64, entity: Arc<E>) -> Result<()>;

    /// Removes `id`; `true` if it was cached.
    async fn delete_entity(&mut self, id: i64) -> Result<bool>;

    /// Every cached entity, in no particular order.
    fn entities(&self) -> Vec<Arc<E>>;
}

/// A session that keeps its entity cache in memory only.
#[derive(Debug)]
pub struct MemorySession<E> {
    entities: EntityCache<E>,
}

impl<E> Default for MemorySession<E> {
    fn default() -> Self {
        Self {
            entities: EntityCache::new(),
        }
    }
}

impl<E> MemorySession<E> {
    /// Creates a session with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the underlying cache.
    pub fn cache(&self) -> &EntityCache<E> {
        &self.entities
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> EntityStorage<E> for MemorySession<E> {
    fn get_entity(&self, id: i64) -> Option<Arc<E>> {
        self.entities.get(id)
    }

    async fn set_entity(&mut self, id: i64, entity: Arc<E>) -> Result<()> {
        self.entities.set(id, entity);
        Ok(())
    }

    async fn delete_entity(&mut self, id: i64) -> Result<bool> {
        Ok(self.entities.delete(id))
    }

    fn entities(&self) -> Vec<Arc<E>> {
        self.entities.values()
    }
}

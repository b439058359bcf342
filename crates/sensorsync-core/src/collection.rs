//! Observable collection of entities
//!
//! The collection broadcasts a [`CollectionEvent`] whenever an entity is
//! added, removed or modified. Receivers obtained from
//! [`EntityCollection::subscribe`] can be drained synchronously with
//! `try_recv`, so no async runtime is needed to observe a collection.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::entity::{Entity, EntityId};

/// Notification capacity used by [`EntityCollection::new`]
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CollectionError {
    #[error("An entity with id {0} already exists in the collection")]
    DuplicateId(EntityId),
}

/// Change notification emitted by an [`EntityCollection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    /// Entity inserted into the collection
    Added(EntityId),
    /// Entity removed from the collection
    Removed(EntityId),
    /// One of the entity's properties was replaced
    Changed(EntityId),
}

impl CollectionEvent {
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::Added(id) | Self::Removed(id) | Self::Changed(id) => id,
        }
    }
}

struct CollectionInner {
    entities: RwLock<HashMap<EntityId, Arc<Entity>>>,
    event_tx: broadcast::Sender<CollectionEvent>,
}

/// Shared, observable set of entities keyed by id
///
/// Cloning yields another handle to the same collection.
#[derive(Clone)]
pub struct EntityCollection {
    inner: Arc<CollectionInner>,
}

impl Default for EntityCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCollection")
            .field("len", &self.len())
            .finish()
    }
}

impl EntityCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty collection whose subscribers buffer up to `capacity` events
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(CollectionInner {
                entities: RwLock::new(HashMap::new()),
                event_tx,
            }),
        }
    }

    /// Subscribe to add/remove/change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit(&self, event: CollectionEvent) {
        // Sending fails only when nobody is subscribed
        let _ = self.inner.event_tx.send(event);
    }

    fn insert(&self, entity: Arc<Entity>) {
        entity.attach(self.inner.event_tx.clone());
        let id = entity.id().clone();
        self.inner
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), entity);
        debug!(entity = %id, "Entity added");
        self.emit(CollectionEvent::Added(id));
    }

    /// Add an existing entity; fails if its id is already taken
    pub fn add(&self, entity: impl Into<Arc<Entity>>) -> Result<Arc<Entity>, CollectionError> {
        let entity = entity.into();
        if self.contains(entity.id()) {
            return Err(CollectionError::DuplicateId(entity.id().clone()));
        }
        self.insert(entity.clone());
        Ok(entity)
    }

    /// Get the entity with `id`, creating an empty one if it does not exist
    pub fn get_or_create_entity(&self, id: impl Into<EntityId>) -> Arc<Entity> {
        let id = id.into();
        if let Some(existing) = self.get_by_id(&id) {
            return existing;
        }
        let entity = Arc::new(Entity::new(id));
        self.insert(entity.clone());
        entity
    }

    pub fn get_by_id(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.inner
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.inner
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Remove the entity with `id`; returns whether it was present
    pub fn remove(&self, id: &EntityId) -> bool {
        let removed = self
            .inner
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);

        match removed {
            Some(entity) => {
                entity.detach();
                debug!(entity = %id, "Entity removed");
                self.emit(CollectionEvent::Removed(id.clone()));
                true
            }
            None => false,
        }
    }

    /// Remove every entity, emitting one removal per entity
    pub fn remove_all(&self) {
        let drained: Vec<Arc<Entity>> = self
            .inner
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, entity)| entity)
            .collect();

        for entity in drained {
            entity.detach();
            self.emit(CollectionEvent::Removed(entity.id().clone()));
        }
    }

    /// Snapshot of all entities, ordered by id
    pub fn values(&self) -> Vec<Arc<Entity>> {
        let mut values: Vec<Arc<Entity>> = self
            .inner
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        values.sort_by(|a, b| a.id().cmp(b.id()));
        values
    }

    pub fn len(&self) -> usize {
        self.inner
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

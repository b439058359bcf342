//! Renderable primitives and the collection that owns them

use sensorsync_core::EntityRef;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An object a renderer draws
pub trait Primitive: Any + Send + Sync + fmt::Debug {
    /// Whether the renderer should draw this primitive
    fn show(&self) -> bool;

    /// Entity this primitive was created for, if any
    fn owner(&self) -> Option<EntityRef>;

    /// Upcast used by [`PrimitiveCollection::get_as`]
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Shared handle to a primitive in a collection
pub type PrimitiveHandle = Arc<dyn Primitive>;

fn same_primitive(a: &PrimitiveHandle, b: &PrimitiveHandle) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Ordered set of primitives drawn by a scene
///
/// Several writers may share one collection; each removes only the
/// primitives it added.
#[derive(Debug, Default)]
pub struct PrimitiveCollection {
    primitives: RwLock<Vec<PrimitiveHandle>>,
}

impl PrimitiveCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<PrimitiveHandle>> {
        self.primitives.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<PrimitiveHandle>> {
        self.primitives.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a primitive; adding one that is already present is a no-op
    pub fn add(&self, primitive: PrimitiveHandle) {
        let mut primitives = self.write();
        if !primitives.iter().any(|p| same_primitive(p, &primitive)) {
            primitives.push(primitive);
        }
    }

    /// Remove a primitive by identity; returns whether it was present
    pub fn remove(&self, primitive: &PrimitiveHandle) -> bool {
        let mut primitives = self.write();
        let before = primitives.len();
        primitives.retain(|p| !same_primitive(p, primitive));
        primitives.len() != before
    }

    pub fn contains(&self, primitive: &PrimitiveHandle) -> bool {
        self.read().iter().any(|p| same_primitive(p, primitive))
    }

    pub fn remove_all(&self) {
        self.write().clear();
    }

    pub fn get(&self, index: usize) -> Option<PrimitiveHandle> {
        self.read().get(index).cloned()
    }

    /// Get the primitive at `index` as its concrete type
    pub fn get_as<T: Primitive>(&self, index: usize) -> Option<Arc<T>> {
        self.get(index)?.into_any().downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of the current primitives in draw order
    pub fn to_vec(&self) -> Vec<PrimitiveHandle> {
        self.read().clone()
    }
}

//! Common interface of entity visualizers

use glam::DVec3;
use sensorsync_core::{Entity, JulianDate};
use serde::Serialize;

use crate::error::VisualizerError;

/// Sphere enclosing an entity's visualization
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

/// Result of asking a visualizer for an entity's bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingSphereState {
    /// The sphere is known
    Done(BoundingSphere),
    /// The entity is visualized but its primitive is not ready yet
    Pending,
    /// The entity is not visualized by this visualizer
    Failed,
}

/// Keeps one kind of primitive in step with an entity collection
pub trait Visualizer {
    /// Reconcile primitives with entity state sampled at `time`
    ///
    /// Returns whether every visualized entity is ready for display.
    fn update(&mut self, time: Option<JulianDate>) -> Result<bool, VisualizerError>;

    /// Sphere enclosing the primitive this visualizer keeps for `entity`
    ///
    /// Hidden primitives still report their sphere.
    fn bounding_sphere(&self, entity: &Entity) -> BoundingSphereState;

    /// Whether `destroy` has been called
    fn is_destroyed(&self) -> bool;

    /// Remove every primitive this visualizer created and stop observing entities
    fn destroy(&mut self);
}

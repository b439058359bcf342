//! Custom sensor volume primitive

use glam::{DMat4, DVec3};
use sensorsync_core::{Color, EntityRef, Material, Spherical};
use serde::Serialize;
use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::PrimitiveDefaults;
use crate::primitive::Primitive;

/// Renderable state of a custom sensor volume
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomSensorState {
    pub show: bool,
    /// Boundary directions in the sensor frame, +Z is the boresight
    pub directions: Vec<Spherical>,
    pub radius: f64,
    pub intersection_color: Color,
    pub intersection_width: f64,
    pub show_intersection: bool,
    /// Sensor frame to world transform
    pub model_matrix: DMat4,
    pub lateral_surface_material: Material,
}

impl CustomSensorState {
    pub fn new(defaults: &PrimitiveDefaults) -> Self {
        Self {
            show: true,
            directions: Vec::new(),
            radius: defaults.radius,
            intersection_color: defaults.intersection_color,
            intersection_width: defaults.intersection_width,
            show_intersection: defaults.show_intersection,
            model_matrix: DMat4::IDENTITY,
            lateral_surface_material: Material {
                uniforms: defaults.lateral_surface_material.clone(),
            },
        }
    }
}

/// A volumetric sensor whose lateral surface passes through its boundary directions
///
/// All fields live behind one lock so a reader never observes a partially
/// updated sensor.
#[derive(Debug)]
pub struct CustomSensorPrimitive {
    id: RwLock<Option<EntityRef>>,
    state: RwLock<CustomSensorState>,
}

impl Default for CustomSensorPrimitive {
    fn default() -> Self {
        Self::new(&PrimitiveDefaults::default())
    }
}

impl CustomSensorPrimitive {
    pub fn new(defaults: &PrimitiveDefaults) -> Self {
        Self {
            id: RwLock::new(None),
            state: RwLock::new(CustomSensorState::new(defaults)),
        }
    }

    /// Entity this sensor was created for
    pub fn id(&self) -> Option<EntityRef> {
        self.id.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_id(&self, id: Option<EntityRef>) {
        *self.id.write().unwrap_or_else(PoisonError::into_inner) = id;
    }

    /// Snapshot of every field
    pub fn state(&self) -> CustomSensorState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to the state under a single write lock
    pub fn modify<R>(&self, f: impl FnOnce(&mut CustomSensorState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn radius(&self) -> f64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).radius
    }

    pub fn model_matrix(&self) -> DMat4 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .model_matrix
    }

    pub fn directions(&self) -> Vec<Spherical> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .directions
            .clone()
    }

    pub fn lateral_surface_material(&self) -> Material {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lateral_surface_material
            .clone()
    }

    /// Boundary vectors in the sensor frame, scaled by a finite radius
    pub fn boundary_vectors(&self) -> Vec<DVec3> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let scale = if state.radius.is_finite() {
            state.radius
        } else {
            1.0
        };
        state
            .directions
            .iter()
            .map(|d| d.unit_vector() * scale)
            .collect()
    }

    /// Boundary vector end points transformed into world space
    pub fn world_boundary_points(&self) -> Vec<DVec3> {
        let matrix = self.model_matrix();
        self.boundary_vectors()
            .into_iter()
            .map(|v| matrix.transform_point3(v))
            .collect()
    }
}

impl Primitive for CustomSensorPrimitive {
    fn show(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).show
    }

    fn owner(&self) -> Option<EntityRef> {
        self.id()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

//! Entities and the custom pattern sensor description they can carry

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::collection::CollectionEvent;
use crate::material::MaterialProperty;
use crate::math::{Color, Spherical};
use crate::property::{sample_or, Property};
use crate::time::{JulianDate, TimeInterval};

/// Unique identifier for an entity within a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random id for entities created without one
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Volumetric sensor defined by a pattern of boundary directions
///
/// Every field is optional; unset fields fall back to the primitive's defaults.
#[derive(Debug, Clone, Default)]
pub struct CustomPatternSensorGraphics {
    pub show: Option<Arc<dyn Property<bool>>>,
    pub directions: Option<Arc<dyn Property<Vec<Spherical>>>>,
    pub radius: Option<Arc<dyn Property<f64>>>,
    pub intersection_color: Option<Arc<dyn Property<Color>>>,
    pub intersection_width: Option<Arc<dyn Property<f64>>>,
    pub show_intersection: Option<Arc<dyn Property<bool>>>,
    pub lateral_surface_material: Option<Arc<dyn MaterialProperty>>,
}

impl CustomPatternSensorGraphics {
    /// Sensor with only its directions set
    pub fn with_directions(directions: Arc<dyn Property<Vec<Spherical>>>) -> Self {
        Self {
            directions: Some(directions),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct EntityData {
    name: Option<String>,
    show: Option<Arc<dyn Property<bool>>>,
    availability: Option<TimeInterval>,
    position: Option<Arc<dyn Property<DVec3>>>,
    orientation: Option<Arc<dyn Property<DQuat>>>,
    custom_pattern_sensor: Option<Arc<CustomPatternSensorGraphics>>,
}

/// A named, time-varying description of a scene object
///
/// Entities are shared as `Arc<Entity>`; every setter takes `&self` and, once
/// the entity belongs to a collection, broadcasts a change notification.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    data: RwLock<EntityData>,
    notifier: RwLock<Option<broadcast::Sender<CollectionEvent>>>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            data: RwLock::new(EntityData::default()),
            notifier: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    fn data(&self) -> RwLockReadGuard<'_, EntityData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn data_mut(&self) -> RwLockWriteGuard<'_, EntityData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn attach(&self, sender: broadcast::Sender<CollectionEvent>) {
        *self.notifier.write().unwrap_or_else(PoisonError::into_inner) = Some(sender);
    }

    pub(crate) fn detach(&self) {
        *self.notifier.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn changed(&self) {
        let notifier = self.notifier.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = notifier.as_ref() {
            // No receivers is fine: nobody is watching this collection yet
            let _ = sender.send(CollectionEvent::Changed(self.id.clone()));
        }
    }

    pub fn name(&self) -> Option<String> {
        self.data().name.clone()
    }

    pub fn set_name(&self, name: Option<String>) {
        self.data_mut().name = name;
        self.changed();
    }

    pub fn show(&self) -> Option<Arc<dyn Property<bool>>> {
        self.data().show.clone()
    }

    pub fn set_show(&self, show: Option<Arc<dyn Property<bool>>>) {
        self.data_mut().show = show;
        self.changed();
    }

    pub fn availability(&self) -> Option<TimeInterval> {
        self.data().availability
    }

    pub fn set_availability(&self, availability: Option<TimeInterval>) {
        self.data_mut().availability = availability;
        self.changed();
    }

    pub fn position(&self) -> Option<Arc<dyn Property<DVec3>>> {
        self.data().position.clone()
    }

    pub fn set_position(&self, position: Option<Arc<dyn Property<DVec3>>>) {
        self.data_mut().position = position;
        self.changed();
    }

    pub fn orientation(&self) -> Option<Arc<dyn Property<DQuat>>> {
        self.data().orientation.clone()
    }

    pub fn set_orientation(&self, orientation: Option<Arc<dyn Property<DQuat>>>) {
        self.data_mut().orientation = orientation;
        self.changed();
    }

    pub fn custom_pattern_sensor(&self) -> Option<Arc<CustomPatternSensorGraphics>> {
        self.data().custom_pattern_sensor.clone()
    }

    pub fn set_custom_pattern_sensor(&self, sensor: Option<CustomPatternSensorGraphics>) {
        self.data_mut().custom_pattern_sensor = sensor.map(Arc::new);
        self.changed();
    }

    /// Whether the entity exists at `time`; entities without availability always do
    pub fn is_available(&self, time: &JulianDate) -> bool {
        self.data()
            .availability
            .map_or(true, |interval| interval.contains(time))
    }

    /// Value of the entity's own show flag at `time` (true when unset)
    pub fn is_showing(&self, time: &JulianDate) -> bool {
        sample_or(self.data().show.as_deref(), time, true)
    }

    pub fn position_at(&self, time: &JulianDate) -> Option<DVec3> {
        self.data().position.as_ref().and_then(|p| p.value(time))
    }

    pub fn orientation_at(&self, time: &JulianDate) -> Option<DQuat> {
        self.data().orientation.as_ref().and_then(|p| p.value(time))
    }
}

/// Non-owning reference from a primitive back to the entity it mirrors
#[derive(Debug, Clone)]
pub struct EntityRef {
    id: EntityId,
    entity: Weak<Entity>,
}

impl EntityRef {
    pub fn new(entity: &Arc<Entity>) -> Self {
        Self {
            id: entity.id().clone(),
            entity: Arc::downgrade(entity),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// The entity, if it is still alive
    pub fn upgrade(&self) -> Option<Arc<Entity>> {
        self.entity.upgrade()
    }

    /// Whether this refers to exactly `entity` (identity, not id equality)
    pub fn is(&self, entity: &Arc<Entity>) -> bool {
        std::ptr::eq(self.entity.as_ptr(), Arc::as_ptr(entity))
    }
}

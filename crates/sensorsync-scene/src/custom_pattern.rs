//! Visualizer for custom pattern sensors
//!
//! Every entity carrying a [`CustomPatternSensorGraphics`] is tracked. On each
//! `update` the visualizer samples the entity at the requested time and keeps
//! exactly one [`CustomSensorPrimitive`] in the scene for it while its
//! position, orientation and sensor directions are all defined. An entity that
//! stops qualifying loses its primitive; a hidden entity keeps it with
//! `show = false`.
//!
//! Collection notifications are queued and applied at the start of the next
//! `update`, so a removed entity's primitive disappears on that pass.

use glam::{DMat3, DMat4, DQuat, DVec3};
use sensorsync_core::{
    sample_or, CollectionEvent, CustomPatternSensorGraphics, Entity, EntityCollection, EntityId,
    EntityRef, JulianDate, Material, Spherical,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config::{PrimitiveDefaults, VisualizerConfig};
use crate::error::VisualizerError;
use crate::primitive::PrimitiveHandle;
use crate::scene::Scene;
use crate::sensor::CustomSensorPrimitive;
use crate::visualizer::{BoundingSphere, BoundingSphereState, Visualizer};

/// Synchronizes custom pattern sensor entities with sensor primitives
#[derive(Debug)]
pub struct CustomPatternSensorVisualizer {
    scene: Arc<Scene>,
    entities: EntityCollection,
    events: Option<broadcast::Receiver<CollectionEvent>>,
    /// Entities with a sensor attached, whether or not they qualify right now
    tracked: BTreeMap<EntityId, Arc<Entity>>,
    primitives: BTreeMap<EntityId, Arc<CustomSensorPrimitive>>,
    defaults: PrimitiveDefaults,
    destroyed: bool,
}

/// Model matrix placing the sensor frame at `position` rotated by `orientation`
pub fn compose_model_matrix(orientation: DQuat, position: DVec3) -> DMat4 {
    let mut matrix = DMat4::from_mat3(DMat3::from_quat(orientation));
    matrix.w_axis = position.extend(1.0);
    matrix
}

impl CustomPatternSensorVisualizer {
    /// Create a visualizer attaching primitives to `scene`
    pub fn new(
        scene: Option<Arc<Scene>>,
        entities: &EntityCollection,
    ) -> Result<Self, VisualizerError> {
        Self::with_config(scene, entities, VisualizerConfig::default())
    }

    pub fn with_config(
        scene: Option<Arc<Scene>>,
        entities: &EntityCollection,
        config: VisualizerConfig,
    ) -> Result<Self, VisualizerError> {
        let scene = scene.ok_or(VisualizerError::InvalidArgument("scene is required"))?;

        let mut visualizer = Self {
            scene,
            entities: entities.clone(),
            events: Some(entities.subscribe()),
            tracked: BTreeMap::new(),
            primitives: BTreeMap::new(),
            defaults: config.defaults,
            destroyed: false,
        };

        for entity in entities.values() {
            visualizer.evaluate(entity);
        }

        info!(tracked = visualizer.tracked.len(), "Custom pattern sensor visualizer created");
        Ok(visualizer)
    }

    /// Number of primitives this visualizer currently owns
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// The primitive mirroring the entity with `id`, if one exists
    pub fn primitive_for(&self, id: &EntityId) -> Option<Arc<CustomSensorPrimitive>> {
        self.primitives.get(id).cloned()
    }

    /// Apply queued collection notifications
    fn process_events(&mut self) {
        let Some(mut events) = self.events.take() else {
            return;
        };

        let mut resync = false;
        loop {
            match events.try_recv() {
                Ok(CollectionEvent::Removed(id)) => self.untrack(&id),
                Ok(CollectionEvent::Added(id)) | Ok(CollectionEvent::Changed(id)) => {
                    match self.entities.get_by_id(&id) {
                        Some(entity) => self.evaluate(entity),
                        None => self.untrack(&id),
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Entity notifications overflowed, resynchronizing");
                    resync = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        self.events = Some(events);

        if resync {
            self.resync();
        }
    }

    /// Rebuild the tracked set from a snapshot of the collection
    fn resync(&mut self) {
        let current = self.entities.values();
        let present: HashSet<&EntityId> = current.iter().map(|e| e.id()).collect();
        let stale: Vec<EntityId> = self
            .tracked
            .keys()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        for id in stale {
            self.untrack(&id);
        }
        for entity in current {
            self.evaluate(entity);
        }
    }

    /// Track `entity` if it carries a sensor, otherwise forget it
    fn evaluate(&mut self, entity: Arc<Entity>) {
        if entity.custom_pattern_sensor().is_none() {
            self.untrack(entity.id());
            return;
        }

        let id = entity.id().clone();
        let replaced = self
            .tracked
            .get(&id)
            .is_some_and(|existing| !Arc::ptr_eq(existing, &entity));
        if replaced {
            // Same id, different entity: the old primitive belongs to the old entity
            self.remove_primitive(&id);
        }
        self.tracked.insert(id, entity);
    }

    fn untrack(&mut self, id: &EntityId) {
        self.tracked.remove(id);
        self.remove_primitive(id);
    }

    fn remove_primitive(&mut self, id: &EntityId) {
        if let Some(primitive) = self.primitives.remove(id) {
            let handle: PrimitiveHandle = primitive;
            self.scene.primitives().remove(&handle);
            debug!(entity = %id, "Removed custom sensor primitive");
        }
    }

    /// Insert a fully populated primitive into the scene and the index
    fn attach_primitive(&mut self, entity: &Arc<Entity>, primitive: Arc<CustomSensorPrimitive>) {
        self.scene.primitives().add(primitive.clone());
        self.primitives.insert(entity.id().clone(), primitive);
        debug!(entity = %entity.id(), "Created custom sensor primitive");
    }

    /// Reconcile one tracked entity at `time`
    fn sync_entity(&mut self, entity: &Arc<Entity>, time: &JulianDate) {
        let Some(sensor) = entity.custom_pattern_sensor() else {
            self.untrack(entity.id());
            return;
        };

        let position = entity.position_at(time);
        let orientation = entity.orientation_at(time);
        let directions = sensor
            .directions
            .as_ref()
            .and_then(|d| d.value(time))
            .filter(|d| !d.is_empty());

        let (Some(position), Some(orientation), Some(directions)) =
            (position, orientation, directions)
        else {
            self.remove_primitive(entity.id());
            return;
        };

        // A new primitive stays out of the scene until every field is written
        let (primitive, is_new) = match self.primitives.get(entity.id()) {
            Some(existing) => (existing.clone(), false),
            None => {
                let primitive = Arc::new(CustomSensorPrimitive::new(&self.defaults));
                primitive.set_id(Some(EntityRef::new(entity)));
                (primitive, true)
            }
        };

        let show = entity.is_showing(time)
            && entity.is_available(time)
            && sample_or(sensor.show.as_deref(), time, true);

        let defaults = &self.defaults;
        primitive.modify(|state| {
            state.show = show;
            state.directions = directions;
            state.model_matrix = compose_model_matrix(orientation, position);
            apply_sensor_properties(state, &sensor, defaults, time);
        });

        if is_new {
            self.attach_primitive(entity, primitive);
        }
    }
}

fn apply_sensor_properties(
    state: &mut crate::sensor::CustomSensorState,
    sensor: &CustomPatternSensorGraphics,
    defaults: &PrimitiveDefaults,
    time: &JulianDate,
) {
    state.radius = sample_or(sensor.radius.as_deref(), time, defaults.radius);
    state.intersection_color = sample_or(
        sensor.intersection_color.as_deref(),
        time,
        defaults.intersection_color,
    );
    state.intersection_width = sample_or(
        sensor.intersection_width.as_deref(),
        time,
        defaults.intersection_width,
    );
    state.show_intersection = sample_or(
        sensor.show_intersection.as_deref(),
        time,
        defaults.show_intersection,
    );

    match sensor.lateral_surface_material.as_deref() {
        Some(material) => {
            if state.lateral_surface_material.sync(material, time) {
                debug!(
                    material = ?state.lateral_surface_material.material_type(),
                    "Replaced lateral surface material"
                );
            }
        }
        None => {
            state.lateral_surface_material = Material {
                uniforms: defaults.lateral_surface_material.clone(),
            };
        }
    }
}

impl Visualizer for CustomPatternSensorVisualizer {
    fn update(&mut self, time: Option<JulianDate>) -> Result<bool, VisualizerError> {
        if self.destroyed {
            return Err(VisualizerError::Destroyed);
        }
        let time = time.ok_or(VisualizerError::InvalidArgument("time is required"))?;

        self.process_events();

        let tracked: Vec<Arc<Entity>> = self.tracked.values().cloned().collect();
        for entity in &tracked {
            self.sync_entity(entity, &time);
        }
        Ok(true)
    }

    fn bounding_sphere(&self, entity: &Entity) -> BoundingSphereState {
        if self.destroyed {
            return BoundingSphereState::Failed;
        }
        match self.primitives.get(entity.id()) {
            Some(primitive) => {
                let state = primitive.state();
                BoundingSphereState::Done(BoundingSphere {
                    center: state.model_matrix.w_axis.truncate(),
                    radius: state.radius,
                })
            }
            None if self.tracked.contains_key(entity.id()) => BoundingSphereState::Pending,
            None => BoundingSphereState::Failed,
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        let ids: Vec<EntityId> = self.primitives.keys().cloned().collect();
        for id in &ids {
            self.remove_primitive(id);
        }
        self.tracked.clear();
        self.events = None;
        self.destroyed = true;
        info!(removed = ids.len(), "Custom pattern sensor visualizer destroyed");
    }
}

impl Drop for CustomPatternSensorVisualizer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Directions of a regular pyramid with `sides` faces and the given half angle
pub fn regular_pattern(sides: usize, half_angle: f64) -> Vec<Spherical> {
    let step = std::f64::consts::TAU / sides.max(1) as f64;
    (0..sides)
        .map(|i| Spherical::new(i as f64 * step, half_angle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Primitive;
    use chrono::{Duration, Utc};
    use sensorsync_core::{
        Color, ColorMaterialProperty, ConstantProperty, GridMaterialProperty, MaterialType,
        MaterialUniforms, Property, TimeInterval,
    };
    use std::f64::consts::FRAC_PI_4;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn directions() -> Arc<ConstantProperty<Vec<Spherical>>> {
        ConstantProperty::shared(vec![
            Spherical::with_magnitude(0.0, 0.0, 0.0),
            Spherical::with_magnitude(1.0, 0.0, 0.0),
            Spherical::with_magnitude(2.0, 0.0, 0.0),
            Spherical::with_magnitude(3.0, 0.0, 0.0),
        ])
    }

    fn position() -> DVec3 {
        DVec3::new(1234.0, 5678.0, 9101112.0)
    }

    fn setup() -> (Arc<Scene>, EntityCollection, CustomPatternSensorVisualizer) {
        let scene = Arc::new(Scene::new());
        let entities = EntityCollection::new();
        let visualizer = CustomPatternSensorVisualizer::new(Some(scene.clone()), &entities).unwrap();
        (scene, entities, visualizer)
    }

    /// Entity with a sensor, a position and an identity orientation
    fn qualifying_entity(entities: &EntityCollection, id: &str) -> Arc<Entity> {
        let entity = entities.get_or_create_entity(id);
        entity.set_position(Some(ConstantProperty::shared(position())));
        entity.set_orientation(Some(ConstantProperty::shared(DQuat::IDENTITY)));
        entity.set_custom_pattern_sensor(Some(CustomPatternSensorGraphics::with_directions(
            directions(),
        )));
        entity
    }

    #[test]
    fn test_constructor_requires_scene() {
        let entities = EntityCollection::new();
        let err = CustomPatternSensorVisualizer::new(None, &entities).unwrap_err();
        assert!(matches!(err, VisualizerError::InvalidArgument(_)));
    }

    #[test]
    fn test_update_requires_time() {
        let (_scene, _entities, mut visualizer) = setup();
        assert!(matches!(
            visualizer.update(None),
            Err(VisualizerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_is_destroyed_until_destroy() {
        let (_scene, _entities, mut visualizer) = setup();
        assert!(!visualizer.is_destroyed());
        visualizer.destroy();
        assert!(visualizer.is_destroyed());
        assert_eq!(visualizer.update(Some(Utc::now())), Err(VisualizerError::Destroyed));
    }

    #[test]
    fn test_no_sensor_creates_no_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let entity = entities.get_or_create_entity("test");
        entity.set_position(Some(ConstantProperty::shared(position())));
        entity.set_orientation(Some(ConstantProperty::shared(DQuat::IDENTITY)));

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 0);
    }

    #[test]
    fn test_no_position_creates_no_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let entity = entities.get_or_create_entity("test");
        entity.set_orientation(Some(ConstantProperty::shared(DQuat::IDENTITY)));
        entity.set_custom_pattern_sensor(Some(CustomPatternSensorGraphics::with_directions(
            directions(),
        )));

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 0);
    }

    #[test]
    fn test_no_orientation_creates_no_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let entity = entities.get_or_create_entity("test");
        entity.set_position(Some(ConstantProperty::shared(position())));
        entity.set_custom_pattern_sensor(Some(CustomPatternSensorGraphics::with_directions(
            directions(),
        )));

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 0);
    }

    #[test]
    fn test_empty_directions_create_no_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        entity.set_custom_pattern_sensor(Some(CustomPatternSensorGraphics::with_directions(
            ConstantProperty::shared(Vec::new()),
        )));

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 0);
    }

    #[test]
    fn test_sensor_creates_and_updates_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let time = Utc::now();

        let entity = entities.get_or_create_entity("test");
        entity.set_show(Some(ConstantProperty::shared(true)));
        entity.set_position(Some(ConstantProperty::shared(position())));
        let orientation = DQuat::from_xyzw(0.0, 0.0, FRAC_PI_4.sin(), FRAC_PI_4.cos());
        entity.set_orientation(Some(ConstantProperty::shared(orientation)));

        let intersection_color = Color::new(0.1, 0.2, 0.3, 0.4);
        let sensor_show = ConstantProperty::shared(true);
        let material = ColorMaterialProperty::from_color(Color::WHITE);
        let graphics = CustomPatternSensorGraphics {
            directions: Some(directions()),
            intersection_color: Some(ConstantProperty::shared(intersection_color)),
            intersection_width: Some(ConstantProperty::shared(0.5)),
            show_intersection: Some(ConstantProperty::shared(true)),
            radius: Some(ConstantProperty::shared(123.5)),
            show: Some(sensor_show.clone()),
            lateral_surface_material: Some(Arc::new(material.clone())),
        };
        entity.set_custom_pattern_sensor(Some(graphics));
        visualizer.update(Some(time)).unwrap();

        assert_eq!(scene.primitives().len(), 1);
        let p = scene.primitives().get_as::<CustomSensorPrimitive>(0).unwrap();
        let state = p.state();
        assert_eq!(state.intersection_color, intersection_color);
        assert_eq!(state.intersection_width, 0.5);
        assert!(state.show_intersection);
        assert_eq!(state.radius, 123.5);
        assert_eq!(state.directions, directions().value(&time).unwrap());
        assert!(state
            .model_matrix
            .abs_diff_eq(DMat4::from_rotation_translation(orientation, position()), 1e-9));
        assert!(state.show);
        assert_eq!(
            Some(state.lateral_surface_material.uniforms),
            sensorsync_core::MaterialProperty::value(&material, &time)
        );

        entity.set_show(Some(ConstantProperty::shared(false)));
        visualizer.update(Some(time)).unwrap();
        assert!(!p.show());

        entity.set_show(Some(ConstantProperty::shared(true)));
        visualizer.update(Some(time)).unwrap();
        assert!(p.show());

        sensor_show.set_value(false);
        visualizer.update(Some(time)).unwrap();
        assert!(!p.show());
        assert_eq!(scene.primitives().len(), 1);
    }

    #[test]
    fn test_remove_all_removes_primitives() {
        let (scene, entities, mut visualizer) = setup();
        qualifying_entity(&entities, "test");

        let time = Utc::now();
        assert_eq!(scene.primitives().len(), 0);
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 1);
        assert!(scene.primitives().get(0).unwrap().show());

        entities.remove_all();
        // Removal is applied on the next pass
        assert_eq!(scene.primitives().len(), 1);
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 0);
        assert_eq!(visualizer.primitive_count(), 0);
    }

    #[test]
    fn test_primitive_id_is_entity() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");

        visualizer.update(Some(Utc::now())).unwrap();
        let owner = scene.primitives().get(0).unwrap().owner().unwrap();
        assert!(owner.is(&entity));
        assert!(Arc::ptr_eq(&owner.upgrade().unwrap(), &entity));
    }

    #[test]
    fn test_repeated_update_is_idempotent() {
        let (scene, entities, mut visualizer) = setup();
        qualifying_entity(&entities, "test");
        let time = Utc::now();

        visualizer.update(Some(time)).unwrap();
        let first = scene.primitives().get_as::<CustomSensorPrimitive>(0).unwrap().state();
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 1);
        let second = scene.primitives().get_as::<CustomSensorPrimitive>(0).unwrap().state();
        assert_eq!(first, second);
    }

    #[test]
    fn test_losing_position_removes_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        let time = Utc::now();

        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 1);

        entity.set_position(None);
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 0);

        entity.set_position(Some(ConstantProperty::shared(position())));
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 1);
    }

    #[test]
    fn test_undefined_position_value_self_heals() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        let pending = Arc::new(ConstantProperty::<DVec3>::undefined());
        entity.set_position(Some(pending.clone()));
        let time = Utc::now();

        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 0);

        pending.set_value(position());
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 1);
    }

    #[test]
    fn test_removing_sensor_removes_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        let time = Utc::now();

        visualizer.update(Some(time)).unwrap();
        entity.set_custom_pattern_sensor(None);
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 0);
        assert!(matches!(
            visualizer.bounding_sphere(&entity),
            BoundingSphereState::Failed
        ));
    }

    #[test]
    fn test_unavailable_entity_is_hidden() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        let time = Utc::now();
        entity.set_availability(Some(TimeInterval::new(time, time + Duration::seconds(60))));

        visualizer.update(Some(time)).unwrap();
        assert!(scene.primitives().get(0).unwrap().show());

        visualizer.update(Some(time + Duration::seconds(120))).unwrap();
        assert_eq!(scene.primitives().len(), 1);
        assert!(!scene.primitives().get(0).unwrap().show());
    }

    #[test]
    fn test_material_type_change_replaces_material() {
        let (_scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        let time = Utc::now();

        visualizer.update(Some(time)).unwrap();
        let primitive = visualizer.primitive_for(entity.id()).unwrap();
        assert_eq!(
            primitive.lateral_surface_material().uniforms,
            MaterialUniforms::default_for(MaterialType::Color)
        );

        let mut graphics = CustomPatternSensorGraphics::with_directions(directions());
        graphics.lateral_surface_material = Some(Arc::new(GridMaterialProperty::default()));
        entity.set_custom_pattern_sensor(Some(graphics));
        visualizer.update(Some(time)).unwrap();

        assert_eq!(
            primitive.lateral_surface_material().material_type(),
            MaterialType::Grid
        );
    }

    #[test]
    fn test_destroy_removes_only_own_primitives() {
        let (scene, entities, mut visualizer) = setup();
        qualifying_entity(&entities, "a");
        qualifying_entity(&entities, "b");
        let foreign: PrimitiveHandle = Arc::new(CustomSensorPrimitive::default());
        scene.primitives().add(foreign.clone());

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 3);

        visualizer.destroy();
        assert_eq!(scene.primitives().len(), 1);
        assert!(scene.primitives().contains(&foreign));
    }

    #[test]
    fn test_drop_cleans_up() {
        let (scene, entities, mut visualizer) = setup();
        qualifying_entity(&entities, "test");
        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 1);

        drop(visualizer);
        assert!(scene.primitives().is_empty());
    }

    #[test]
    fn test_existing_entities_are_tracked_on_construction() {
        let scene = Arc::new(Scene::new());
        let entities = EntityCollection::new();
        qualifying_entity(&entities, "early");

        let mut visualizer =
            CustomPatternSensorVisualizer::new(Some(scene.clone()), &entities).unwrap();
        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 1);
    }

    #[test]
    fn test_notification_overflow_resynchronizes() {
        let scene = Arc::new(Scene::new());
        let entities = EntityCollection::with_event_capacity(2);
        let mut visualizer =
            CustomPatternSensorVisualizer::new(Some(scene.clone()), &entities).unwrap();

        for i in 0..5 {
            qualifying_entity(&entities, &format!("sensor-{}", i));
        }
        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 5);
    }

    #[test]
    fn test_readded_entity_gets_fresh_primitive() {
        let (scene, entities, mut visualizer) = setup();
        let first = qualifying_entity(&entities, "test");
        let time = Utc::now();
        visualizer.update(Some(time)).unwrap();

        entities.remove(first.id());
        let second = qualifying_entity(&entities, "test");
        visualizer.update(Some(time)).unwrap();

        assert_eq!(scene.primitives().len(), 1);
        let owner = scene.primitives().get(0).unwrap().owner().unwrap();
        assert!(owner.is(&second));
        assert!(!owner.is(&first));
    }

    #[test]
    fn test_bounding_sphere_states() {
        let (_scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        let bystander = entities.get_or_create_entity("bystander");
        let mut graphics = CustomPatternSensorGraphics::with_directions(directions());
        graphics.radius = Some(ConstantProperty::shared(50.0));
        entity.set_custom_pattern_sensor(Some(graphics));

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(
            visualizer.bounding_sphere(&entity),
            BoundingSphereState::Done(BoundingSphere {
                center: position(),
                radius: 50.0,
            })
        );
        assert_eq!(visualizer.bounding_sphere(&bystander), BoundingSphereState::Failed);

        entity.set_position(None);
        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(visualizer.bounding_sphere(&entity), BoundingSphereState::Pending);
    }

    #[test]
    fn test_hidden_primitive_keeps_bounding_sphere() {
        let (scene, entities, mut visualizer) = setup();
        let entity = qualifying_entity(&entities, "test");
        entity.set_show(Some(ConstantProperty::shared(false)));

        visualizer.update(Some(Utc::now())).unwrap();
        assert_eq!(scene.primitives().len(), 1);
        assert!(!scene.primitives().get(0).unwrap().show());
        assert_eq!(
            visualizer.bounding_sphere(&entity),
            BoundingSphereState::Done(BoundingSphere {
                center: position(),
                radius: f64::INFINITY,
            })
        );
    }

    #[test]
    fn test_new_primitive_is_complete_when_visible() {
        let (scene, entities, mut visualizer) = setup();
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let scene = scene.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut incomplete = 0usize;
                while !done.load(Ordering::Acquire) {
                    for primitive in scene.primitives().to_vec() {
                        if let Ok(sensor) = primitive.into_any().downcast::<CustomSensorPrimitive>()
                        {
                            if sensor.state().directions.is_empty() {
                                incomplete += 1;
                            }
                        }
                    }
                }
                incomplete
            })
        };

        let time = Utc::now();
        for _ in 0..2000 {
            qualifying_entity(&entities, "test");
            visualizer.update(Some(time)).unwrap();
            entities.remove_all();
            visualizer.update(Some(time)).unwrap();
        }
        done.store(true, Ordering::Release);

        assert_eq!(reader.join().unwrap(), 0);
    }

    #[test]
    fn test_overflow_resync_drops_removed_entities() {
        let scene = Arc::new(Scene::new());
        let entities = EntityCollection::with_event_capacity(2);
        let mut visualizer =
            CustomPatternSensorVisualizer::new(Some(scene.clone()), &entities).unwrap();
        let time = Utc::now();

        let kept = qualifying_entity(&entities, "kept");
        let gone = qualifying_entity(&entities, "gone");
        let replaced = qualifying_entity(&entities, "replaced");
        visualizer.update(Some(time)).unwrap();
        assert_eq!(scene.primitives().len(), 3);

        entities.remove(gone.id());
        entities.remove(replaced.id());
        let fresh = qualifying_entity(&entities, "replaced");
        for _ in 0..4 {
            kept.set_show(Some(ConstantProperty::shared(true)));
        }
        visualizer.update(Some(time)).unwrap();

        assert_eq!(scene.primitives().len(), 2);
        assert!(visualizer.primitive_for(gone.id()).is_none());
        let owner = visualizer.primitive_for(fresh.id()).unwrap().owner().unwrap();
        assert!(owner.is(&fresh));
        assert!(!owner.is(&replaced));

        for i in 0..4 {
            entities.get_or_create_entity(format!("bystander-{}", i));
        }
        entities.remove_all();
        visualizer.update(Some(time)).unwrap();
        assert!(scene.primitives().is_empty());
        assert_eq!(visualizer.primitive_count(), 0);
    }

    #[test]
    fn test_sensor_defaults_from_config() {
        let scene = Arc::new(Scene::new());
        let entities = EntityCollection::new();
        let config = VisualizerConfig {
            defaults: PrimitiveDefaults {
                radius: 1000.0,
                intersection_width: 1.0,
                ..Default::default()
            },
        };
        let mut visualizer =
            CustomPatternSensorVisualizer::with_config(Some(scene.clone()), &entities, config)
                .unwrap();
        qualifying_entity(&entities, "test");

        visualizer.update(Some(Utc::now())).unwrap();
        let state = scene.primitives().get_as::<CustomSensorPrimitive>(0).unwrap().state();
        assert_eq!(state.radius, 1000.0);
        assert_eq!(state.intersection_width, 1.0);
        assert_eq!(state.intersection_color, Color::WHITE);
    }

    #[test]
    fn test_regular_pattern() {
        let pattern = regular_pattern(4, 0.5);
        assert_eq!(pattern.len(), 4);
        assert!(pattern.iter().all(|d| d.cone == 0.5));
        assert!((pattern[2].clock - std::f64::consts::PI).abs() < 1e-12);
    }
}

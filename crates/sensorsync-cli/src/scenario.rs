//! JSON scenario files describing entities to visualize

use chrono::{DateTime, Utc};
use glam::{DQuat, DVec2, DVec3};
use sensorsync_core::collection::CollectionError;
use sensorsync_core::{
    Color, ColorMaterialProperty, ColorParseError, ConstantProperty, CustomPatternSensorGraphics,
    Entity, EntityCollection, EntityId, GridMaterialProperty, Interpolate, MaterialProperty,
    Property, SampledProperty, Spherical, StripeMaterialProperty, StripeOrientation, TimeInterval,
};
use sensorsync_scene::custom_pattern::regular_pattern;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid color for entity {entity}: {source}")]
    InvalidColor {
        entity: String,
        source: ColorParseError,
    },
    #[error("Sensor on entity {0} needs either directions or a pattern")]
    MissingDirections(String),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// A constant value or a list of time-tagged samples
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec<T> {
    Constant(T),
    Sampled { samples: Vec<SampleSpec<T>> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleSpec<T> {
    pub time: DateTime<Utc>,
    pub value: T,
}

impl<T: Clone> ValueSpec<T> {
    fn into_property<U, F>(self, convert: F) -> Arc<dyn Property<U>>
    where
        U: Interpolate + Send + Sync + fmt::Debug + 'static,
        F: Fn(T) -> U,
    {
        match self {
            Self::Constant(value) => Arc::new(ConstantProperty::new(convert(value))),
            Self::Sampled { samples } => Arc::new(SampledProperty::from_samples(
                samples.into_iter().map(|s| (s.time, convert(s.value))),
            )),
        }
    }
}

/// Regular polygon pattern of boundary directions
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSpec {
    pub sides: usize,
    pub half_angle_deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterialSpec {
    Color {
        color: Option<String>,
    },
    Grid {
        color: Option<String>,
        cell_alpha: Option<f64>,
        line_count: Option<[f64; 2]>,
        line_thickness: Option<[f64; 2]>,
        line_offset: Option<[f64; 2]>,
    },
    Stripe {
        orientation: Option<StripeOrientation>,
        even_color: Option<String>,
        odd_color: Option<String>,
        offset: Option<f64>,
        repeat: Option<f64>,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorSpec {
    pub directions: Option<Vec<Spherical>>,
    pub pattern: Option<PatternSpec>,
    pub radius: Option<f64>,
    pub intersection_color: Option<String>,
    pub intersection_width: Option<f64>,
    pub show_intersection: Option<bool>,
    pub show: Option<bool>,
    pub material: Option<MaterialSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitySpec {
    pub id: Option<String>,
    pub name: Option<String>,
    pub show: Option<bool>,
    pub availability: Option<TimeInterval>,
    /// Cartesian position in meters
    pub position: Option<ValueSpec<[f64; 3]>>,
    /// Rotation quaternion as `[x, y, z, w]`
    pub orientation: Option<ValueSpec<[f64; 4]>>,
    pub sensor: Option<SensorSpec>,
}

/// A set of entities plus the time playback starts at
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
}

fn constant<T>(value: T) -> Arc<dyn Property<T>>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    Arc::new(ConstantProperty::new(value))
}

fn parse_color(entity: &str, hex: &str) -> Result<Color, ScenarioError> {
    Color::from_hex(hex).map_err(|source| ScenarioError::InvalidColor {
        entity: entity.to_string(),
        source,
    })
}

fn optional_color(
    entity: &str,
    hex: Option<&String>,
) -> Result<Option<Arc<dyn Property<Color>>>, ScenarioError> {
    hex.map(|h| parse_color(entity, h).map(constant)).transpose()
}

impl MaterialSpec {
    fn build(&self, entity: &str) -> Result<Arc<dyn MaterialProperty>, ScenarioError> {
        let vec2 = |v: &Option<[f64; 2]>| v.map(|[x, y]| constant(DVec2::new(x, y)));
        let material: Arc<dyn MaterialProperty> = match self {
            Self::Color { color } => Arc::new(ColorMaterialProperty {
                color: optional_color(entity, color.as_ref())?,
            }),
            Self::Grid {
                color,
                cell_alpha,
                line_count,
                line_thickness,
                line_offset,
            } => Arc::new(GridMaterialProperty {
                color: optional_color(entity, color.as_ref())?,
                cell_alpha: cell_alpha.map(constant),
                line_count: vec2(line_count),
                line_thickness: vec2(line_thickness),
                line_offset: vec2(line_offset),
            }),
            Self::Stripe {
                orientation,
                even_color,
                odd_color,
                offset,
                repeat,
            } => Arc::new(StripeMaterialProperty {
                orientation: orientation.map(constant),
                even_color: optional_color(entity, even_color.as_ref())?,
                odd_color: optional_color(entity, odd_color.as_ref())?,
                offset: offset.map(constant),
                repeat: repeat.map(constant),
            }),
        };
        Ok(material)
    }
}

impl SensorSpec {
    fn build(&self, entity: &str) -> Result<CustomPatternSensorGraphics, ScenarioError> {
        let directions = match (&self.directions, &self.pattern) {
            (Some(directions), _) => directions.clone(),
            (None, Some(pattern)) => {
                regular_pattern(pattern.sides, pattern.half_angle_deg.to_radians())
            }
            (None, None) => return Err(ScenarioError::MissingDirections(entity.to_string())),
        };

        Ok(CustomPatternSensorGraphics {
            show: self.show.map(constant),
            directions: Some(constant(directions)),
            radius: self.radius.map(constant),
            intersection_color: optional_color(entity, self.intersection_color.as_ref())?,
            intersection_width: self.intersection_width.map(constant),
            show_intersection: self.show_intersection.map(constant),
            lateral_surface_material: self
                .material
                .as_ref()
                .map(|m| m.build(entity))
                .transpose()?,
        })
    }
}

impl EntitySpec {
    fn build(&self) -> Result<Entity, ScenarioError> {
        let id = self
            .id
            .clone()
            .map(EntityId::from)
            .unwrap_or_else(EntityId::generate);
        let label = id.to_string();
        let entity = Entity::new(id);

        entity.set_name(self.name.clone());
        entity.set_show(self.show.map(constant));
        entity.set_availability(self.availability);
        entity.set_position(
            self.position
                .clone()
                .map(|p| p.into_property(|[x, y, z]| DVec3::new(x, y, z))),
        );
        entity.set_orientation(
            self.orientation
                .clone()
                .map(|o| o.into_property(|[x, y, z, w]| DQuat::from_xyzw(x, y, z, w))),
        );
        if let Some(sensor) = &self.sensor {
            entity.set_custom_pattern_sensor(Some(sensor.build(&label)?));
        }
        Ok(entity)
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Add every entity to `entities`, returning how many were added
    pub fn populate(&self, entities: &EntityCollection) -> Result<usize, ScenarioError> {
        for entity in &self.entities {
            entities.add(entity.build()?)?;
        }
        Ok(self.entities.len())
    }
}

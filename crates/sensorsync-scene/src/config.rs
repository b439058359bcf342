//! Visualizer configuration

use sensorsync_core::{Color, MaterialUniforms, MaterialType};
use serde::{Deserialize, Serialize};

/// Configuration for [`CustomPatternSensorVisualizer`](crate::CustomPatternSensorVisualizer)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizerConfig {
    /// Values a primitive uses where its sensor leaves a property unset
    #[serde(default)]
    pub defaults: PrimitiveDefaults,
}

/// Fallback values for custom sensor primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDefaults {
    /// Sensor range in meters
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_intersection_color")]
    pub intersection_color: Color,
    /// Intersection line width in pixels
    #[serde(default = "default_intersection_width")]
    pub intersection_width: f64,
    #[serde(default = "default_true")]
    pub show_intersection: bool,
    #[serde(default = "default_lateral_surface_material")]
    pub lateral_surface_material: MaterialUniforms,
}

impl Default for PrimitiveDefaults {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            intersection_color: default_intersection_color(),
            intersection_width: default_intersection_width(),
            show_intersection: true,
            lateral_surface_material: default_lateral_surface_material(),
        }
    }
}

fn default_radius() -> f64 {
    f64::INFINITY
}

fn default_intersection_color() -> Color {
    Color::WHITE
}

fn default_intersection_width() -> f64 {
    5.0
}

fn default_true() -> bool {
    true
}

fn default_lateral_surface_material() -> MaterialUniforms {
    MaterialUniforms::default_for(MaterialType::Color)
}

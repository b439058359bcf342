//! sensorsync Scene - Rendering-side primitives and entity visualizers
//!
//! This crate keeps a scene's primitive collection in step with an
//! [`EntityCollection`](sensorsync_core::EntityCollection):
//! - [`PrimitiveCollection`] holds the renderable objects of a [`Scene`]
//! - [`CustomSensorPrimitive`] is the renderable form of a custom pattern sensor
//! - [`CustomPatternSensorVisualizer`] reconciles entities with primitives every tick

pub mod config;
pub mod custom_pattern;
pub mod error;
pub mod primitive;
pub mod scene;
pub mod sensor;
pub mod visualizer;

pub use config::{PrimitiveDefaults, VisualizerConfig};
pub use custom_pattern::CustomPatternSensorVisualizer;
pub use error::VisualizerError;
pub use primitive::{Primitive, PrimitiveCollection, PrimitiveHandle};
pub use scene::Scene;
pub use sensor::{CustomSensorPrimitive, CustomSensorState};
pub use visualizer::{BoundingSphere, BoundingSphereState, Visualizer};

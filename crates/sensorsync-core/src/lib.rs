//! sensorsync Core - Entities, time-varying properties and entity collections
//!
//! This crate provides the declarative side of the sensorsync system:
//! - Time-varying properties sampled at a [`JulianDate`]
//! - Material properties driving primitive material uniforms
//! - Entities carrying position, orientation and custom pattern sensor descriptions
//! - Observable entity collections that broadcast add/remove/change notifications

pub mod collection;
pub mod entity;
pub mod material;
pub mod math;
pub mod property;
pub mod time;

pub use collection::{CollectionError, CollectionEvent, EntityCollection, DEFAULT_EVENT_CAPACITY};
pub use entity::{CustomPatternSensorGraphics, Entity, EntityId, EntityRef};
pub use material::{
    ColorMaterialProperty, GridMaterialProperty, Material, MaterialProperty, MaterialType,
    MaterialUniforms, StripeMaterialProperty, StripeOrientation,
};
pub use math::{Color, ColorParseError, Spherical};
pub use property::{
    sample_or, CallbackProperty, ConstantProperty, Interpolate, Property, SampledProperty,
};
pub use time::{JulianDate, TimeInterval};

pub use glam::{DMat3, DMat4, DQuat, DVec2, DVec3};

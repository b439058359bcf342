//! Material properties and the material state they drive on primitives

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::math::Color;
use crate::property::{sample_or, Property};
use crate::time::JulianDate;

/// Kind of material, selecting the shader a renderer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Color,
    Grid,
    Stripe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripeOrientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Uniform values for one material, tagged by type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterialUniforms {
    Color {
        color: Color,
    },
    Grid {
        color: Color,
        cell_alpha: f64,
        line_count: DVec2,
        line_thickness: DVec2,
        line_offset: DVec2,
    },
    Stripe {
        orientation: StripeOrientation,
        even_color: Color,
        odd_color: Color,
        offset: f64,
        repeat: f64,
    },
}

impl MaterialUniforms {
    /// Uniforms a freshly created material of `kind` starts with
    pub fn default_for(kind: MaterialType) -> Self {
        match kind {
            MaterialType::Color => Self::Color {
                color: Color::new(1.0, 0.0, 0.0, 0.5),
            },
            MaterialType::Grid => Self::Grid {
                color: Color::WHITE,
                cell_alpha: 0.1,
                line_count: DVec2::new(8.0, 8.0),
                line_thickness: DVec2::ONE,
                line_offset: DVec2::ZERO,
            },
            MaterialType::Stripe => Self::Stripe {
                orientation: StripeOrientation::Horizontal,
                even_color: Color::WHITE,
                odd_color: Color::BLACK,
                offset: 0.0,
                repeat: 5.0,
            },
        }
    }

    pub fn material_type(&self) -> MaterialType {
        match self {
            Self::Color { .. } => MaterialType::Color,
            Self::Grid { .. } => MaterialType::Grid,
            Self::Stripe { .. } => MaterialType::Stripe,
        }
    }
}

/// Material state held by a primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub uniforms: MaterialUniforms,
}

impl Material {
    pub fn from_type(kind: MaterialType) -> Self {
        Self {
            uniforms: MaterialUniforms::default_for(kind),
        }
    }

    pub fn material_type(&self) -> MaterialType {
        self.uniforms.material_type()
    }

    /// Bring this material in line with `property` at `time`
    ///
    /// When the property's type differs from the current one the material is
    /// recreated from that type's defaults before the sampled uniforms are
    /// applied. Returns `true` if the material was recreated. An undefined
    /// type leaves the material untouched.
    pub fn sync(&mut self, property: &dyn MaterialProperty, time: &JulianDate) -> bool {
        let Some(kind) = property.material_type(time) else {
            return false;
        };

        let replaced = kind != self.material_type();
        if replaced {
            *self = Material::from_type(kind);
        }
        if let Some(uniforms) = property.value(time) {
            if uniforms.material_type() == kind {
                self.uniforms = uniforms;
            }
        }
        replaced
    }
}

/// A time-varying material description
pub trait MaterialProperty: Send + Sync + fmt::Debug {
    /// Material type at `time`
    fn material_type(&self, time: &JulianDate) -> Option<MaterialType>;

    /// Uniform values at `time`
    fn value(&self, time: &JulianDate) -> Option<MaterialUniforms>;

    fn is_constant(&self) -> bool;
}

fn all_constant<I>(properties: I) -> bool
where
    I: IntoIterator<Item = bool>,
{
    properties.into_iter().all(|c| c)
}

fn is_constant_or_unset<T>(property: &Option<Arc<dyn Property<T>>>) -> bool {
    property.as_ref().map_or(true, |p| p.is_constant())
}

/// Solid color material
#[derive(Debug, Clone, Default)]
pub struct ColorMaterialProperty {
    pub color: Option<Arc<dyn Property<Color>>>,
}

impl ColorMaterialProperty {
    pub fn new(color: Arc<dyn Property<Color>>) -> Self {
        Self { color: Some(color) }
    }

    pub fn from_color(color: Color) -> Self {
        Self::new(Arc::new(crate::property::ConstantProperty::new(color)))
    }
}

impl MaterialProperty for ColorMaterialProperty {
    fn material_type(&self, _time: &JulianDate) -> Option<MaterialType> {
        Some(MaterialType::Color)
    }

    fn value(&self, time: &JulianDate) -> Option<MaterialUniforms> {
        Some(MaterialUniforms::Color {
            color: sample_or(self.color.as_deref(), time, Color::WHITE),
        })
    }

    fn is_constant(&self) -> bool {
        is_constant_or_unset(&self.color)
    }
}

/// Grid of lines over a translucent cell fill
#[derive(Debug, Clone, Default)]
pub struct GridMaterialProperty {
    pub color: Option<Arc<dyn Property<Color>>>,
    pub cell_alpha: Option<Arc<dyn Property<f64>>>,
    pub line_count: Option<Arc<dyn Property<DVec2>>>,
    pub line_thickness: Option<Arc<dyn Property<DVec2>>>,
    pub line_offset: Option<Arc<dyn Property<DVec2>>>,
}

impl MaterialProperty for GridMaterialProperty {
    fn material_type(&self, _time: &JulianDate) -> Option<MaterialType> {
        Some(MaterialType::Grid)
    }

    fn value(&self, time: &JulianDate) -> Option<MaterialUniforms> {
        Some(MaterialUniforms::Grid {
            color: sample_or(self.color.as_deref(), time, Color::WHITE),
            cell_alpha: sample_or(self.cell_alpha.as_deref(), time, 0.1),
            line_count: sample_or(self.line_count.as_deref(), time, DVec2::new(8.0, 8.0)),
            line_thickness: sample_or(self.line_thickness.as_deref(), time, DVec2::ONE),
            line_offset: sample_or(self.line_offset.as_deref(), time, DVec2::ZERO),
        })
    }

    fn is_constant(&self) -> bool {
        all_constant([
            is_constant_or_unset(&self.color),
            is_constant_or_unset(&self.cell_alpha),
            is_constant_or_unset(&self.line_count),
            is_constant_or_unset(&self.line_thickness),
            is_constant_or_unset(&self.line_offset),
        ])
    }
}

/// Alternating two-color stripes
#[derive(Debug, Clone, Default)]
pub struct StripeMaterialProperty {
    pub orientation: Option<Arc<dyn Property<StripeOrientation>>>,
    pub even_color: Option<Arc<dyn Property<Color>>>,
    pub odd_color: Option<Arc<dyn Property<Color>>>,
    pub offset: Option<Arc<dyn Property<f64>>>,
    pub repeat: Option<Arc<dyn Property<f64>>>,
}

impl MaterialProperty for StripeMaterialProperty {
    fn material_type(&self, _time: &JulianDate) -> Option<MaterialType> {
        Some(MaterialType::Stripe)
    }

    fn value(&self, time: &JulianDate) -> Option<MaterialUniforms> {
        Some(MaterialUniforms::Stripe {
            orientation: sample_or(
                self.orientation.as_deref(),
                time,
                StripeOrientation::Horizontal,
            ),
            even_color: sample_or(self.even_color.as_deref(), time, Color::WHITE),
            odd_color: sample_or(self.odd_color.as_deref(), time, Color::BLACK),
            offset: sample_or(self.offset.as_deref(), time, 0.0),
            repeat: sample_or(self.repeat.as_deref(), time, 1.0),
        })
    }

    fn is_constant(&self) -> bool {
        all_constant([
            is_constant_or_unset(&self.orientation),
            is_constant_or_unset(&self.even_color),
            is_constant_or_unset(&self.odd_color),
            is_constant_or_unset(&self.offset),
            is_constant_or_unset(&self.repeat),
        ])
    }
}

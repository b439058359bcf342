//! Value types that glam does not cover: spherical directions and RGBA colors

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction expressed as clock and cone angles (radians) plus a magnitude
///
/// The cone angle is measured from the +Z boresight, the clock angle
/// counter-clockwise from +X in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    pub clock: f64,
    pub cone: f64,
    #[serde(default = "default_magnitude")]
    pub magnitude: f64,
}

fn default_magnitude() -> f64 {
    1.0
}

impl Spherical {
    pub fn new(clock: f64, cone: f64) -> Self {
        Self {
            clock,
            cone,
            magnitude: 1.0,
        }
    }

    pub fn with_magnitude(clock: f64, cone: f64, magnitude: f64) -> Self {
        Self {
            clock,
            cone,
            magnitude,
        }
    }

    /// Build from a Cartesian vector; the zero vector maps to a zero-magnitude boresight
    pub fn from_cartesian(v: DVec3) -> Self {
        let magnitude = v.length();
        if magnitude == 0.0 {
            return Self::with_magnitude(0.0, 0.0, 0.0);
        }
        let clock = v.y.atan2(v.x);
        let cone = (v.z / magnitude).clamp(-1.0, 1.0).acos();
        Self {
            clock,
            cone,
            magnitude,
        }
    }

    /// Cartesian vector including the magnitude
    pub fn to_cartesian(&self) -> DVec3 {
        self.unit_vector() * self.magnitude
    }

    /// Unit vector pointing along this direction, ignoring the magnitude
    pub fn unit_vector(&self) -> DVec3 {
        let (sin_cone, cos_cone) = self.cone.sin_cos();
        let (sin_clock, cos_clock) = self.clock.sin_cos();
        DVec3::new(sin_cone * cos_clock, sin_cone * sin_clock, cos_cone)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("Invalid color length: expected 6 or 8 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("Invalid hex digit in color: {0}")]
    InvalidDigit(String),
}

/// Linear RGBA color with components in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) {
            return Err(ColorParseError::InvalidLength(digits.len()));
        }

        let channel = |i: usize| -> Result<f32, ColorParseError> {
            let pair = digits
                .get(i * 2..i * 2 + 2)
                .ok_or_else(|| ColorParseError::InvalidDigit(s.to_string()))?;
            u8::from_str_radix(pair, 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| ColorParseError::InvalidDigit(s.to_string()))
        };

        let alpha = if digits.len() == 8 { channel(3)? } else { 1.0 };
        Ok(Self::new(channel(0)?, channel(1)?, channel(2)?, alpha))
    }

    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        Color::new(
            self.red + (other.red - self.red) * t,
            self.green + (other.green - self.green) * t,
            self.blue + (other.blue - self.blue) * t,
            self.alpha + (other.alpha - self.alpha) * t,
        )
    }
}

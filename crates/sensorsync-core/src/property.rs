//! Time-varying properties
//!
//! A property yields a value for a given [`JulianDate`], or `None` when it is
//! undefined at that time. Entities hold properties behind
//! `Arc<dyn Property<T>>` so producers can keep a handle and change the value
//! while consumers sample it every tick.

use glam::{DQuat, DVec3};
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::math::{Color, Spherical};
use crate::time::{seconds_between, JulianDate};

/// A value that can be sampled at any time
pub trait Property<T>: Send + Sync + fmt::Debug {
    /// Value at `time`, or `None` if the property is undefined there
    fn value(&self, time: &JulianDate) -> Option<T>;

    /// Whether the value is the same for every time
    fn is_constant(&self) -> bool;
}

/// Sample an optional property, falling back to `default` when it is unset or undefined
pub fn sample_or<T>(property: Option<&dyn Property<T>>, time: &JulianDate, default: T) -> T {
    property.and_then(|p| p.value(time)).unwrap_or(default)
}

/// A property whose value does not depend on time but can be replaced
pub struct ConstantProperty<T> {
    value: RwLock<Option<T>>,
}

impl<T: Clone> ConstantProperty<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// Convenience for handing the same property to an entity and a producer
    pub fn shared(value: T) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::new(value))
    }

    /// A property that is defined nowhere until [`set_value`](Self::set_value) is called
    pub fn undefined() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    pub fn set_value(&self, value: T) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    pub fn clear(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<T> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for ConstantProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ConstantProperty")
            .field("value", &*value)
            .finish()
    }
}

impl<T> Property<T> for ConstantProperty<T>
where
    T: Clone + Send + Sync + fmt::Debug,
{
    fn value(&self, _time: &JulianDate) -> Option<T> {
        self.get()
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// Types that can be blended between two samples
pub trait Interpolate: Clone {
    /// Blend from `self` (t = 0) to `other` (t = 1)
    fn interpolate(&self, other: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for DVec3 {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(*other, t)
    }
}

impl Interpolate for DQuat {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.slerp(*other, t)
    }
}

impl Interpolate for Color {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        self.lerp(other, t as f32)
    }
}

impl Interpolate for Spherical {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        Spherical::with_magnitude(
            self.clock.interpolate(&other.clock, t),
            self.cone.interpolate(&other.cone, t),
            self.magnitude.interpolate(&other.magnitude, t),
        )
    }
}

/// A property defined by time-tagged samples with linear interpolation between them
///
/// Outside the sampled range the property is undefined.
pub struct SampledProperty<T> {
    samples: RwLock<Vec<(JulianDate, T)>>,
}

impl<T: Interpolate> Default for SampledProperty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interpolate> SampledProperty<T> {
    pub fn new() -> Self {
        Self {
            samples: RwLock::new(Vec::new()),
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = (JulianDate, T)>) -> Self {
        let property = Self::new();
        for (time, value) in samples {
            property.add_sample(time, value);
        }
        property
    }

    /// Insert a sample, replacing any existing sample at the same time
    pub fn add_sample(&self, time: JulianDate, value: T) {
        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        match samples.binary_search_by(|(t, _)| t.cmp(&time)) {
            Ok(i) => samples[i].1 = value,
            Err(i) => samples.insert(i, (time, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: fmt::Debug> fmt::Debug for SampledProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SampledProperty")
            .field("samples", &samples.len())
            .finish()
    }
}

impl<T> Property<T> for SampledProperty<T>
where
    T: Interpolate + Send + Sync + fmt::Debug,
{
    fn value(&self, time: &JulianDate) -> Option<T> {
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        match samples.binary_search_by(|(t, _)| t.cmp(time)) {
            Ok(i) => Some(samples[i].1.clone()),
            Err(0) => None,
            Err(i) if i == samples.len() => None,
            Err(i) => {
                let (t0, v0) = &samples[i - 1];
                let (t1, v1) = &samples[i];
                let span = seconds_between(t0, t1);
                let t = seconds_between(t0, time) / span;
                Some(v0.interpolate(v1, t))
            }
        }
    }

    fn is_constant(&self) -> bool {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
            <= 1
    }
}

type Callback<T> = Box<dyn Fn(&JulianDate) -> Option<T> + Send + Sync>;

/// A property computed by a closure on every sample
pub struct CallbackProperty<T> {
    callback: Callback<T>,
    constant: bool,
}

impl<T> CallbackProperty<T> {
    pub fn new<F>(callback: F, constant: bool) -> Self
    where
        F: Fn(&JulianDate) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
            constant,
        }
    }
}

impl<T> fmt::Debug for CallbackProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}

impl<T> Property<T> for CallbackProperty<T> {
    fn value(&self, time: &JulianDate) -> Option<T> {
        (self.callback)(time)
    }

    fn is_constant(&self) -> bool {
        self.constant
    }
}

//! Stepping a visualizer through time and summarizing the scene

use sensorsync_core::time::add_seconds;
use sensorsync_core::{Color, JulianDate, MaterialType};
use sensorsync_scene::{CustomSensorPrimitive, Primitive, Scene, Visualizer, VisualizerError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum PlaybackError {
    #[error("Step length must be a finite number of seconds, got {0}")]
    InvalidStep(f64),

    #[error("Step {step} falls outside the representable time range")]
    TimeOutOfRange { step: usize },

    #[error("Visualizer error: {0}")]
    Visualizer(#[from] VisualizerError),
}

/// Serializable view of one sensor primitive
#[derive(Debug, Clone, Serialize)]
pub struct PrimitiveSnapshot {
    pub entity: Option<String>,
    pub show: bool,
    /// `None` for an unbounded sensor
    pub radius: Option<f64>,
    pub position: [f64; 3],
    pub directions: usize,
    pub intersection_color: Color,
    pub material: MaterialType,
    /// World-space end points of the boundary vectors
    pub boundary: Vec<[f64; 3]>,
}

impl PrimitiveSnapshot {
    pub fn from_primitive(primitive: &CustomSensorPrimitive) -> Self {
        let state = primitive.state();
        Self {
            entity: primitive.id().map(|id| id.id().to_string()),
            show: state.show,
            radius: state.radius.is_finite().then_some(state.radius),
            position: state.model_matrix.w_axis.truncate().to_array(),
            directions: state.directions.len(),
            intersection_color: state.intersection_color,
            material: state.lateral_surface_material.material_type(),
            boundary: primitive
                .world_boundary_points()
                .into_iter()
                .map(|p| p.to_array())
                .collect(),
        }
    }
}

/// Scene contents after one update
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub time: JulianDate,
    pub primitives: Vec<PrimitiveSnapshot>,
}

impl StepReport {
    pub fn visible(&self) -> usize {
        self.primitives.iter().filter(|p| p.show).count()
    }
}

/// Snapshot every custom sensor primitive currently in `scene`
pub fn snapshot(scene: &Scene) -> Vec<PrimitiveSnapshot> {
    scene
        .primitives()
        .to_vec()
        .into_iter()
        .filter_map(|p| p.into_any().downcast::<CustomSensorPrimitive>().ok())
        .map(|p| PrimitiveSnapshot::from_primitive(&p))
        .collect()
}

/// Run `steps` updates `step_secs` apart starting at `start`
pub fn run(
    visualizer: &mut dyn Visualizer,
    scene: &Scene,
    start: JulianDate,
    step_secs: f64,
    steps: usize,
) -> Result<Vec<StepReport>, PlaybackError> {
    if !step_secs.is_finite() {
        return Err(PlaybackError::InvalidStep(step_secs));
    }

    let mut reports = Vec::with_capacity(steps);
    for step in 0..steps {
        let time = add_seconds(&start, step as f64 * step_secs)
            .ok_or(PlaybackError::TimeOutOfRange { step })?;
        visualizer.update(Some(time))?;

        let report = StepReport {
            step,
            time,
            primitives: snapshot(scene),
        };
        debug!(
            step,
            primitives = report.primitives.len(),
            visible = report.visible(),
            "Playback step"
        );
        reports.push(report);
    }
    Ok(reports)
}

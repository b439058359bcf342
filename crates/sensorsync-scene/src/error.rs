//! Visualizer errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisualizerError {
    /// A required argument was missing or unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The visualizer was used after `destroy()`
    #[error("Visualizer has been destroyed")]
    Destroyed,
}

//! Tracking model collaborators
//!
//! The concrete trackers (their CV/ML internals) live outside Attune. The
//! runtime only needs to start them, stop them, and know their kind.

use attune_core::{ModelDescriptor, ModelKind};
use thiserror::Error;

/// Failure reported by a tracking model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelFault {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("model assets missing: {0}")]
    AssetsMissing(String),

    #[error("accelerator error: {0}")]
    Accelerator(String),

    #[error("model panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// A running (or runnable) tracker
pub trait TrackingModel: Send {
    fn kind(&self) -> ModelKind;

    fn start(&mut self) -> Result<(), ModelFault>;

    fn stop(&mut self) -> Result<(), ModelFault>;
}

/// Builds tracker instances for descriptors
pub trait ModelProvider: Send + Sync {
    fn instantiate(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Box<dyn TrackingModel>, ModelFault>;
}

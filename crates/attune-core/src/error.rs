//! Error types for Attune

use thiserror::Error;

use crate::{ModelKind, ProfileKind};

/// Core Attune errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttuneError {
    // Selection errors (recovered by falling back to the casual preset)
    #[error("Invalid capability profile: {0}")]
    InvalidCapability(String),

    #[error("Unknown {kind} profile: {id}")]
    UnknownProfile { kind: ProfileKind, id: String },

    #[error("Conflicting secondary requests: {winner} selected, {unmet} from {stakeholder} unmet")]
    ConfigurationConflict {
        winner: ModelKind,
        unmet: ModelKind,
        stakeholder: String,
    },

    // Lifecycle errors
    #[error("Model {kind} failed to initialize: {reason}")]
    ModelInitialization { kind: ModelKind, reason: String },

    #[error("Session start cancelled by stop")]
    StartCancelled,

    // Frame errors
    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AttuneError {
    /// Whether the selector recovers from this error locally
    pub fn is_recoverable_selection(&self) -> bool {
        matches!(
            self,
            AttuneError::InvalidCapability(_) | AttuneError::UnknownProfile { .. }
        )
    }
}

/// Result type for Attune operations
pub type AttuneResult<T> = Result<T, AttuneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AttuneError::UnknownProfile {
            kind: ProfileKind::Coach,
            id: "nobody".into(),
        };
        assert_eq!(err.to_string(), "Unknown coach profile: nobody");
        assert!(err.is_recoverable_selection());

        let err = AttuneError::ModelInitialization {
            kind: ModelKind::BodyPose,
            reason: "camera busy".into(),
        };
        assert_eq!(err.to_string(), "Model body-pose failed to initialize: camera busy");
        assert!(!err.is_recoverable_selection());
    }
}

//! Tracking model descriptors
//!
//! A descriptor names one computer-vision tracker and the properties the
//! selector weighs. Descriptors are value objects: built from the catalog and
//! never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The trackers Attune can orchestrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Facial emotion - the primary model, always on
    FaceEmotion,
    EyeGaze,
    BodyPose,
    HandGesture,
}

impl ModelKind {
    /// All kinds in slot order
    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::FaceEmotion,
            ModelKind::EyeGaze,
            ModelKind::BodyPose,
            ModelKind::HandGesture,
        ]
    }

    #[inline]
    pub fn is_primary(self) -> bool {
        self == ModelKind::FaceEmotion
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::FaceEmotion => "face-emotion",
            ModelKind::EyeGaze => "eye-gaze",
            ModelKind::BodyPose => "body-pose",
            ModelKind::HandGesture => "hand-gesture",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requirement priority. Ordered so that `Critical` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Optional,
    Important,
    Critical,
}

/// Expected accuracy of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyTier {
    Coarse,
    Standard,
    Precise,
}

/// Where a tracker's inference runs. Ordered from most to least private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivacyTier {
    Local,
    Hybrid,
    Cloud,
}

/// Tracking model descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub kind: ModelKind,
    pub priority: Priority,
    /// Processing load weight, 1 (light) to 10 (heavy)
    pub load: u8,
    pub accuracy: AccuracyTier,
    pub privacy: PrivacyTier,
}

impl ModelDescriptor {
    /// Catalog entry for a model kind
    pub fn catalog(kind: ModelKind) -> Self {
        match kind {
            ModelKind::FaceEmotion => Self {
                kind,
                priority: Priority::Critical,
                load: 4,
                accuracy: AccuracyTier::Precise,
                privacy: PrivacyTier::Local,
            },
            ModelKind::EyeGaze => Self {
                kind,
                priority: Priority::Important,
                load: 3,
                accuracy: AccuracyTier::Standard,
                privacy: PrivacyTier::Local,
            },
            ModelKind::BodyPose => Self {
                kind,
                priority: Priority::Important,
                load: 6,
                accuracy: AccuracyTier::Standard,
                privacy: PrivacyTier::Hybrid,
            },
            ModelKind::HandGesture => Self {
                kind,
                priority: Priority::Optional,
                load: 5,
                accuracy: AccuracyTier::Coarse,
                privacy: PrivacyTier::Local,
            },
        }
    }

    /// The always-on facial emotion model
    pub fn primary() -> Self {
        Self::catalog(ModelKind::FaceEmotion)
    }

    /// Copy of this descriptor with a different privacy tier
    pub fn with_privacy(mut self, privacy: PrivacyTier) -> Self {
        self.privacy = privacy;
        self
    }
}

/// The party a secondary-model request originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stakeholder {
    /// An explicitly selected tracking mode
    Mode,
    Coach,
    Partner,
    Lesson,
    Activity,
}

impl fmt::Display for Stakeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stakeholder::Mode => "mode",
            Stakeholder::Coach => "coach",
            Stakeholder::Partner => "partner",
            Stakeholder::Lesson => "lesson",
            Stakeholder::Activity => "activity",
        };
        f.write_str(name)
    }
}

/// A stakeholder's request for a secondary model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub kind: ModelKind,
    pub priority: Priority,
    pub stakeholder: Stakeholder,
    /// Human-readable origin, e.g. the coach id or objective name
    pub origin: String,
}

impl ModelRequest {
    pub fn new(
        kind: ModelKind,
        priority: Priority,
        stakeholder: Stakeholder,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            priority,
            stakeholder,
            origin: origin.into(),
        }
    }
}

/// Which registry an unresolvable id was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    Coach,
    Partner,
    Mode,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileKind::Coach => "coach",
            ProfileKind::Partner => "partner",
            ProfileKind::Mode => "mode",
        };
        f.write_str(name)
    }
}

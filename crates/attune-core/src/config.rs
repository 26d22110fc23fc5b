//! Tracking configuration - the immutable result of selection
//!
//! Computed once at session start. Changing focus means starting a new
//! session; the lifecycle manager derives a *realized* copy when slots fail
//! rather than editing the selected one.

use serde::{Deserialize, Serialize};

use crate::{ModelDescriptor, ModelKind, ModelRequest, PrivacyTier, TrackingMode};

/// Hard cap on concurrently active models: one primary plus one secondary
pub const MAX_ACTIVE_MODELS: usize = 2;

/// Model slots of a configuration
///
/// The face slot is the primary. At most one of eyes/pose/hands is populated,
/// which is enforced by construction: slots can only be built from a primary
/// plus an optional single secondary, and afterwards only cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSlots {
    face: Option<ModelDescriptor>,
    eyes: Option<ModelDescriptor>,
    pose: Option<ModelDescriptor>,
    hands: Option<ModelDescriptor>,
}

impl ModelSlots {
    /// Primary face model plus an optional secondary
    ///
    /// A secondary of kind `FaceEmotion` is ignored.
    pub fn with_secondary(primary: ModelDescriptor, secondary: Option<ModelDescriptor>) -> Self {
        let mut slots = ModelSlots {
            face: Some(primary),
            eyes: None,
            pose: None,
            hands: None,
        };

        if let Some(descriptor) = secondary {
            match descriptor.kind {
                ModelKind::FaceEmotion => {}
                ModelKind::EyeGaze => slots.eyes = Some(descriptor),
                ModelKind::BodyPose => slots.pose = Some(descriptor),
                ModelKind::HandGesture => slots.hands = Some(descriptor),
            }
        }

        slots
    }

    /// Only the primary face model
    pub fn primary_only() -> Self {
        Self::with_secondary(ModelDescriptor::primary(), None)
    }

    /// Descriptor occupying the slot for `kind`
    pub fn get(&self, kind: ModelKind) -> Option<&ModelDescriptor> {
        match kind {
            ModelKind::FaceEmotion => self.face.as_ref(),
            ModelKind::EyeGaze => self.eyes.as_ref(),
            ModelKind::BodyPose => self.pose.as_ref(),
            ModelKind::HandGesture => self.hands.as_ref(),
        }
    }

    /// Copy with the slot for `kind` emptied
    pub fn without(&self, kind: ModelKind) -> Self {
        let mut slots = self.clone();
        match kind {
            ModelKind::FaceEmotion => slots.face = None,
            ModelKind::EyeGaze => slots.eyes = None,
            ModelKind::BodyPose => slots.pose = None,
            ModelKind::HandGesture => slots.hands = None,
        }
        slots
    }

    /// Populated slots in slot order (face, eyes, pose, hands)
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        [&self.face, &self.eyes, &self.pose, &self.hands]
            .into_iter()
            .filter_map(|slot| slot.as_ref())
    }

    pub fn primary(&self) -> Option<&ModelDescriptor> {
        self.face.as_ref()
    }

    pub fn secondary(&self) -> Option<&ModelDescriptor> {
        self.eyes
            .as_ref()
            .or(self.pose.as_ref())
            .or(self.hands.as_ref())
    }

    pub fn active_count(&self) -> usize {
        self.iter().count()
    }
}

/// Per-frame update rate ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateFrequency {
    Hz5,
    Hz10,
    Hz15,
    Hz30,
}

impl UpdateFrequency {
    pub fn hz(self) -> u32 {
        match self {
            UpdateFrequency::Hz5 => 5,
            UpdateFrequency::Hz10 => 10,
            UpdateFrequency::Hz15 => 15,
            UpdateFrequency::Hz30 => 30,
        }
    }

    /// One tier lower; the lowest tier stays put
    pub fn step_down(self) -> Self {
        match self {
            UpdateFrequency::Hz30 => UpdateFrequency::Hz15,
            UpdateFrequency::Hz15 => UpdateFrequency::Hz10,
            UpdateFrequency::Hz10 | UpdateFrequency::Hz5 => UpdateFrequency::Hz5,
        }
    }
}

/// How much analysis is derived from the sample stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyticsDepth {
    Basic,
    Detailed,
    Comprehensive,
}

impl AnalyticsDepth {
    /// One tier lower; `Basic` stays put
    pub fn step_down(self) -> Self {
        match self {
            AnalyticsDepth::Comprehensive => AnalyticsDepth::Detailed,
            AnalyticsDepth::Detailed | AnalyticsDepth::Basic => AnalyticsDepth::Basic,
        }
    }
}

/// Where the session's inference runs overall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingMode {
    OnDevice,
    Hybrid,
    Cloud,
}

impl ProcessingMode {
    /// Most remote privacy tier among the populated slots
    pub fn for_slots(slots: &ModelSlots) -> Self {
        match slots.iter().map(|d| d.privacy).max() {
            Some(PrivacyTier::Cloud) => ProcessingMode::Cloud,
            Some(PrivacyTier::Hybrid) => ProcessingMode::Hybrid,
            Some(PrivacyTier::Local) | None => ProcessingMode::OnDevice,
        }
    }
}

/// What the lifecycle manager does when a model fails to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackStrategy {
    /// Null the failed slot and keep going
    #[default]
    Degrade,
    /// Abort the whole session start
    Pause,
    /// Drop down to the primary model only
    ContinueMinimal,
}

/// Insight severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightSeverity {
    Info,
    Warning,
}

/// What a session insight reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InsightKind {
    /// A stakeholder's secondary-model request lost to another
    UnmetRequirement {
        request: ModelRequest,
        winner: Option<ModelKind>,
    },
    /// Selection failed and fell back to the casual preset
    Recovered { reason: String },
    /// Resolution was lowered for the device
    Degraded { reason: String },
    /// A model was pulled to a more private processing tier
    PrivacyLimited { kind: ModelKind },
}

/// A visible note about how the configuration was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInsight {
    pub severity: InsightSeverity,
    pub kind: InsightKind,
    pub message: String,
}

impl SessionInsight {
    pub fn info(kind: InsightKind, message: impl Into<String>) -> Self {
        Self {
            severity: InsightSeverity::Info,
            kind,
            message: message.into(),
        }
    }

    pub fn warning(kind: InsightKind, message: impl Into<String>) -> Self {
        Self {
            severity: InsightSeverity::Warning,
            kind,
            message: message.into(),
        }
    }
}

/// The per-session tracking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfiguration {
    pub mode: TrackingMode,
    pub slots: ModelSlots,
    pub processing_mode: ProcessingMode,
    pub update_frequency: UpdateFrequency,
    pub analytics_depth: AnalyticsDepth,
    pub fallback: FallbackStrategy,
    pub insights: Vec<SessionInsight>,
}

impl TrackingConfiguration {
    /// Configuration with mid-tier resolution and the default fallback
    pub fn new(mode: TrackingMode, slots: ModelSlots) -> Self {
        let processing_mode = ProcessingMode::for_slots(&slots);
        Self {
            mode,
            slots,
            processing_mode,
            update_frequency: UpdateFrequency::Hz15,
            analytics_depth: AnalyticsDepth::Detailed,
            fallback: FallbackStrategy::default(),
            insights: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn active_model_count(&self) -> usize {
        self.slots.active_count()
    }

    /// Realized copy with `kind`'s slot emptied
    pub fn without_model(&self, kind: ModelKind) -> Self {
        let mut realized = self.clone();
        realized.slots = self.slots.without(kind);
        realized.processing_mode = ProcessingMode::for_slots(&realized.slots);
        realized
    }

    /// Realized copy reduced to the primary model
    pub fn minimal(&self) -> Self {
        let mut realized = self.clone();
        realized.slots = match self.slots.primary() {
            Some(primary) => ModelSlots::with_secondary(*primary, None),
            None => ModelSlots::primary_only(),
        };
        realized.processing_mode = ProcessingMode::for_slots(&realized.slots);
        realized
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SessionInsight> {
        self.insights
            .iter()
            .filter(|i| i.severity == InsightSeverity::Warning)
    }
}

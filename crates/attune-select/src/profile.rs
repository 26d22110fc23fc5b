//! Stakeholder profiles and the read-only registry they are looked up in
//!
//! The registry is built once at startup and shared immutably with the
//! selector; there is no process-wide profile state.

use std::collections::HashMap;

use attune_core::{ModelKind, ModelRequest, Priority, Stakeholder, TrackingMode};
use serde::{Deserialize, Serialize};

/// Coach profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachProfile {
    pub id: String,
    pub name: String,
    /// Secondary model this coach's feedback depends on
    pub focus: Option<ModelKind>,
    pub priority: Priority,
}

impl CoachProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            focus: None,
            priority: Priority::Optional,
        }
    }

    pub fn with_focus(mut self, focus: ModelKind, priority: Priority) -> Self {
        self.focus = Some(focus);
        self.priority = priority;
        self
    }

    pub fn request(&self) -> Option<ModelRequest> {
        self.focus
            .filter(|kind| !kind.is_primary())
            .map(|kind| ModelRequest::new(kind, self.priority, Stakeholder::Coach, &self.id))
    }
}

/// Sensitivity at or above which a partner requires a model
pub const PARTNER_REQUIRED_SENSITIVITY: f32 = 0.7;
/// Sensitivity at or above which a partner would like a model
pub const PARTNER_PREFERRED_SENSITIVITY: f32 = 0.4;

/// Simulated conversation partner ("NPC") sensitivity profile
///
/// Sensitivities are in [0.0, 1.0]: how strongly the partner reacts to the
/// user's eye contact, body distance/posture, and hand expressiveness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: String,
    pub name: String,
    pub eye_contact: f32,
    pub personal_space: f32,
    pub expressiveness: f32,
}

impl PartnerProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            eye_contact: 0.0,
            personal_space: 0.0,
            expressiveness: 0.0,
        }
    }

    pub fn with_sensitivities(
        mut self,
        eye_contact: f32,
        personal_space: f32,
        expressiveness: f32,
    ) -> Self {
        self.eye_contact = eye_contact;
        self.personal_space = personal_space;
        self.expressiveness = expressiveness;
        self
    }

    /// Request for the model behind the strongest sensitivity
    ///
    /// Ties go to the earlier of eye contact, personal space, expressiveness.
    pub fn request(&self) -> Option<ModelRequest> {
        let candidates = [
            (ModelKind::EyeGaze, self.eye_contact),
            (ModelKind::BodyPose, self.personal_space),
            (ModelKind::HandGesture, self.expressiveness),
        ];

        let mut strongest: Option<(ModelKind, f32)> = None;
        for (kind, sensitivity) in candidates {
            if !sensitivity.is_finite() {
                continue;
            }
            if strongest.map(|(_, s)| sensitivity > s).unwrap_or(true) {
                strongest = Some((kind, sensitivity));
            }
        }

        let (kind, sensitivity) = strongest?;
        let priority = if sensitivity >= PARTNER_REQUIRED_SENSITIVITY {
            Priority::Important
        } else if sensitivity >= PARTNER_PREFERRED_SENSITIVITY {
            Priority::Optional
        } else {
            return None;
        };

        Some(ModelRequest::new(kind, priority, Stakeholder::Partner, &self.id))
    }
}

/// Lesson objectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonObjective {
    MaintainEyeContact,
    OpenPosture,
    ExpressiveGestures,
    /// Served by the primary model alone
    EmotionalAwareness,
}

impl LessonObjective {
    pub fn name(self) -> &'static str {
        match self {
            LessonObjective::MaintainEyeContact => "maintain-eye-contact",
            LessonObjective::OpenPosture => "open-posture",
            LessonObjective::ExpressiveGestures => "expressive-gestures",
            LessonObjective::EmotionalAwareness => "emotional-awareness",
        }
    }

    pub fn request(self) -> Option<ModelRequest> {
        let kind = match self {
            LessonObjective::MaintainEyeContact => ModelKind::EyeGaze,
            LessonObjective::OpenPosture => ModelKind::BodyPose,
            LessonObjective::ExpressiveGestures => ModelKind::HandGesture,
            LessonObjective::EmotionalAwareness => return None,
        };
        Some(ModelRequest::new(
            kind,
            Priority::Important,
            Stakeholder::Lesson,
            self.name(),
        ))
    }
}

/// Activity the session is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityType {
    Conversation,
    Interview,
    Presentation,
    Storytelling,
    FreePractice,
}

impl ActivityType {
    pub fn name(self) -> &'static str {
        match self {
            ActivityType::Conversation => "conversation",
            ActivityType::Interview => "interview",
            ActivityType::Presentation => "presentation",
            ActivityType::Storytelling => "storytelling",
            ActivityType::FreePractice => "free-practice",
        }
    }

    /// Default secondary request; always the lowest priority
    pub fn request(self) -> Option<ModelRequest> {
        let kind = match self {
            ActivityType::Conversation | ActivityType::Interview => ModelKind::EyeGaze,
            ActivityType::Presentation => ModelKind::BodyPose,
            ActivityType::Storytelling => ModelKind::HandGesture,
            ActivityType::FreePractice => return None,
        };
        Some(ModelRequest::new(
            kind,
            Priority::Optional,
            Stakeholder::Activity,
            self.name(),
        ))
    }
}

/// User preferences that bound the resolution of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreference {
    pub battery_saver: bool,
    pub max_depth: Option<attune_core::AnalyticsDepth>,
    pub allow_cloud: bool,
}

impl Default for UserPreference {
    fn default() -> Self {
        Self {
            battery_saver: false,
            max_depth: None,
            allow_cloud: true,
        }
    }
}

/// Read-only keyed lookups for coaches, partners and tracking modes
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    coaches: HashMap<String, CoachProfile>,
    partners: HashMap<String, PartnerProfile>,
    modes: HashMap<String, TrackingMode>,
}

impl ProfileRegistry {
    /// Registry holding only the built-in mode presets
    pub fn with_presets() -> Self {
        let mut registry = Self::default();
        for mode in TrackingMode::presets() {
            registry.modes.insert(mode.id.clone(), mode);
        }
        registry
    }

    pub fn with_coach(mut self, coach: CoachProfile) -> Self {
        self.coaches.insert(coach.id.clone(), coach);
        self
    }

    pub fn with_partner(mut self, partner: PartnerProfile) -> Self {
        self.partners.insert(partner.id.clone(), partner);
        self
    }

    pub fn with_mode(mut self, mode: TrackingMode) -> Self {
        self.modes.insert(mode.id.clone(), mode);
        self
    }

    pub fn coach(&self, id: &str) -> Option<&CoachProfile> {
        self.coaches.get(id)
    }

    pub fn partner(&self, id: &str) -> Option<&PartnerProfile> {
        self.partners.get(id)
    }

    pub fn mode(&self, id: &str) -> Option<&TrackingMode> {
        self.modes.get(id)
    }
}

//! Tracking modes - named presets that pick the secondary focus
//!
//! A mode fixes exactly one secondary focus. Display-only modes run the
//! primary model alone.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ModelKind;

/// The single secondary focus of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecondaryFocus {
    /// No secondary model; the primary output is only displayed
    DisplayOnly,
    EyeGaze,
    Posture,
    Gestures,
}

impl SecondaryFocus {
    /// Model backing this focus, if any
    pub fn model(self) -> Option<ModelKind> {
        match self {
            SecondaryFocus::DisplayOnly => None,
            SecondaryFocus::EyeGaze => Some(ModelKind::EyeGaze),
            SecondaryFocus::Posture => Some(ModelKind::BodyPose),
            SecondaryFocus::Gestures => Some(ModelKind::HandGesture),
        }
    }

    /// Focus served by a secondary model
    pub fn for_model(kind: ModelKind) -> Self {
        match kind {
            ModelKind::FaceEmotion => SecondaryFocus::DisplayOnly,
            ModelKind::EyeGaze => SecondaryFocus::EyeGaze,
            ModelKind::BodyPose => SecondaryFocus::Posture,
            ModelKind::HandGesture => SecondaryFocus::Gestures,
        }
    }
}

/// Features a mode can switch off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    EyeContactFeedback,
    PostureFeedback,
    GestureFeedback,
    NoddingFeedback,
    EmotionOverlay,
}

/// Expected battery drain of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatteryImpact {
    Low,
    Medium,
    High,
}

/// A named tracking preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingMode {
    pub id: String,
    pub name: String,
    pub secondary: SecondaryFocus,
    pub disabled_features: Vec<Feature>,
    pub battery_impact: BatteryImpact,
    pub recommended_duration: Duration,
}

impl TrackingMode {
    pub const CASUAL: &'static str = "casual";
    pub const EYE_CONTACT: &'static str = "eye-contact";
    pub const PRESENCE: &'static str = "presence";
    pub const EXPRESSION: &'static str = "expression";

    /// Face only, nothing extra. The fallback for every selection failure.
    pub fn casual() -> Self {
        Self {
            id: Self::CASUAL.into(),
            name: "Casual".into(),
            secondary: SecondaryFocus::DisplayOnly,
            disabled_features: vec![
                Feature::EyeContactFeedback,
                Feature::PostureFeedback,
                Feature::GestureFeedback,
            ],
            battery_impact: BatteryImpact::Low,
            recommended_duration: Duration::from_secs(30 * 60),
        }
    }

    pub fn eye_contact() -> Self {
        Self {
            id: Self::EYE_CONTACT.into(),
            name: "Eye Contact".into(),
            secondary: SecondaryFocus::EyeGaze,
            disabled_features: vec![Feature::PostureFeedback, Feature::GestureFeedback],
            battery_impact: BatteryImpact::Medium,
            recommended_duration: Duration::from_secs(15 * 60),
        }
    }

    pub fn presence() -> Self {
        Self {
            id: Self::PRESENCE.into(),
            name: "Presence".into(),
            secondary: SecondaryFocus::Posture,
            disabled_features: vec![Feature::EyeContactFeedback, Feature::GestureFeedback],
            battery_impact: BatteryImpact::High,
            recommended_duration: Duration::from_secs(10 * 60),
        }
    }

    pub fn expression() -> Self {
        Self {
            id: Self::EXPRESSION.into(),
            name: "Expression".into(),
            secondary: SecondaryFocus::Gestures,
            disabled_features: vec![Feature::EyeContactFeedback, Feature::PostureFeedback],
            battery_impact: BatteryImpact::Medium,
            recommended_duration: Duration::from_secs(10 * 60),
        }
    }

    /// The built-in catalog
    pub fn presets() -> Vec<TrackingMode> {
        vec![
            Self::casual(),
            Self::eye_contact(),
            Self::presence(),
            Self::expression(),
        ]
    }

    /// Built-in preset serving a focus
    pub fn for_focus(focus: SecondaryFocus) -> Self {
        match focus {
            SecondaryFocus::DisplayOnly => Self::casual(),
            SecondaryFocus::EyeGaze => Self::eye_contact(),
            SecondaryFocus::Posture => Self::presence(),
            SecondaryFocus::Gestures => Self::expression(),
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        !self.disabled_features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_unique_ids() {
        let presets = TrackingMode::presets();
        for (i, a) in presets.iter().enumerate() {
            for b in &presets[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_focus_model_mapping() {
        assert_eq!(SecondaryFocus::DisplayOnly.model(), None);
        for focus in [
            SecondaryFocus::EyeGaze,
            SecondaryFocus::Posture,
            SecondaryFocus::Gestures,
        ] {
            let kind = focus.model().unwrap();
            assert_eq!(SecondaryFocus::for_model(kind), focus);
            assert_eq!(TrackingMode::for_focus(focus).secondary, focus);
        }
    }

    #[test]
    fn test_casual_disables_secondary_feedback() {
        let casual = TrackingMode::casual();
        assert!(!casual.is_enabled(Feature::EyeContactFeedback));
        assert!(casual.is_enabled(Feature::NoddingFeedback));
        assert!(casual.is_enabled(Feature::EmotionOverlay));
    }
}

//! Engagement score - the per-update output of the processor

use std::time::Duration;

use attune_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Overall weights; they sum to 1.0
pub const NODDING_WEIGHT: f32 = 0.3;
pub const POSTURE_WEIGHT: f32 = 0.4;
pub const EYE_CONTACT_WEIGHT: f32 = 0.3;

/// Nodding pattern by nods per minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoddingPattern {
    #[default]
    Neutral,
    Encouragement,
    Understanding,
    Agreement,
}

impl NoddingPattern {
    /// Band for a nodding frequency in nods per minute
    pub fn from_frequency(per_minute: f32) -> Self {
        if per_minute > 15.0 {
            NoddingPattern::Agreement
        } else if per_minute > 8.0 {
            NoddingPattern::Understanding
        } else if per_minute > 3.0 {
            NoddingPattern::Encouragement
        } else {
            NoddingPattern::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoddingPattern::Neutral => "neutral",
            NoddingPattern::Encouragement => "encouragement",
            NoddingPattern::Understanding => "understanding",
            NoddingPattern::Agreement => "agreement",
        }
    }
}

/// Posture engagement band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Disengaged,
    #[default]
    Neutral,
    Engaged,
    HighlyEngaged,
}

impl EngagementLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EngagementLevel::Disengaged => "disengaged",
            EngagementLevel::Neutral => "neutral",
            EngagementLevel::Engaged => "engaged",
            EngagementLevel::HighlyEngaged => "highly_engaged",
        }
    }
}

/// Eye contact quality by percentage of conversation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactQuality {
    #[default]
    Poor,
    Good,
    Excellent,
}

impl ContactQuality {
    pub fn from_percentage(percentage: f32) -> Self {
        if percentage > 60.0 {
            ContactQuality::Excellent
        } else if percentage > 30.0 {
            ContactQuality::Good
        } else {
            ContactQuality::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContactQuality::Poor => "poor",
            ContactQuality::Good => "good",
            ContactQuality::Excellent => "excellent",
        }
    }
}

/// Direction of the overall score against its recent mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    #[default]
    Stable,
    Falling,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoddingSignal {
    pub is_nodding: bool,
    /// Nods per minute
    pub frequency: f32,
    /// Normalized movement, [0, 1]
    pub intensity: f32,
    pub pattern: NoddingPattern,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureSignal {
    pub is_leaning_in: bool,
    /// Baseline shoulder level minus recent level; positive is forward
    pub change: f32,
    pub level: EngagementLevel,
    pub score: f32,
}

impl Default for PostureSignal {
    fn default() -> Self {
        Self {
            is_leaning_in: false,
            change: 0.0,
            level: EngagementLevel::Neutral,
            score: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyeContactSignal {
    pub has_eye_contact: bool,
    /// Share of the conversation spent in contact, [0, 100]
    pub percentage: f32,
    pub quality: ContactQuality,
    /// Contact time so far, including the ongoing contact
    pub total_contact: Duration,
}

/// Engagement score for one processed sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementScore {
    pub timestamp: Timestamp,
    pub nodding: NoddingSignal,
    pub posture: PostureSignal,
    pub eye_contact: EyeContactSignal,
    /// Weighted composite, [0, 1]
    pub overall: f32,
    pub trend: Trend,
}

impl EngagementScore {
    /// Weighted composite of the three sub-signals
    pub fn composite(
        nodding: &NoddingSignal,
        posture: &PostureSignal,
        eye: &EyeContactSignal,
    ) -> f32 {
        (NODDING_WEIGHT * nodding.score
            + POSTURE_WEIGHT * posture.score
            + EYE_CONTACT_WEIGHT * (eye.percentage / 100.0))
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodding_bands() {
        assert_eq!(NoddingPattern::from_frequency(16.0), NoddingPattern::Agreement);
        assert_eq!(NoddingPattern::from_frequency(15.0), NoddingPattern::Understanding);
        assert_eq!(NoddingPattern::from_frequency(8.5), NoddingPattern::Understanding);
        assert_eq!(NoddingPattern::from_frequency(4.0), NoddingPattern::Encouragement);
        assert_eq!(NoddingPattern::from_frequency(3.0), NoddingPattern::Neutral);
        assert_eq!(NoddingPattern::Agreement.as_str(), "agreement");
    }

    #[test]
    fn test_contact_bands() {
        assert_eq!(ContactQuality::from_percentage(61.0), ContactQuality::Excellent);
        assert_eq!(ContactQuality::from_percentage(60.0), ContactQuality::Good);
        assert_eq!(ContactQuality::from_percentage(30.0), ContactQuality::Poor);
    }

    #[test]
    fn test_composite_weights() {
        let nodding = NoddingSignal {
            score: 1.0,
            ..Default::default()
        };
        let posture = PostureSignal {
            score: 1.0,
            ..Default::default()
        };
        let eye = EyeContactSignal {
            percentage: 100.0,
            ..Default::default()
        };
        assert!((EngagementScore::composite(&nodding, &posture, &eye) - 1.0).abs() < 1e-6);

        let neutral = EngagementScore::composite(
            &NoddingSignal::default(),
            &PostureSignal::default(),
            &EyeContactSignal::default(),
        );
        assert!((neutral - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_level_order() {
        assert!(EngagementLevel::HighlyEngaged > EngagementLevel::Engaged);
        assert!(EngagementLevel::Neutral > EngagementLevel::Disengaged);
        assert_eq!(EngagementLevel::HighlyEngaged.as_str(), "highly_engaged");
    }
}

//! Per-frame readings produced by the external trackers
//!
//! Samples are ephemeral: produced by a tracker, consumed by the engagement
//! processor within the same capture tick, then dropped.

use serde::{Deserialize, Serialize};

use crate::{AttuneError, AttuneResult};

/// 3D position in normalized camera coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Vertical positions of the two shoulders in normalized coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoulderPair {
    pub left_y: f32,
    pub right_y: f32,
}

impl ShoulderPair {
    pub fn new(left_y: f32, right_y: f32) -> Self {
        Self { left_y, right_y }
    }

    /// Level of the shoulder line
    pub fn mid_y(&self) -> f32 {
        (self.left_y + self.right_y) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.left_y.is_finite() && self.right_y.is_finite()
    }
}

/// Gaze direction relative to the screen center (0,0 = looking at the partner)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeVector {
    pub x: f32,
    pub y: f32,
}

impl GazeVector {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn centered() -> Self {
        Self::default()
    }

    /// Euclidean distance from center
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One frame's geometric readings
///
/// Only the primary tracker plus one secondary run at a time, so each part is
/// optional. A sample must carry at least one part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementSample {
    pub head: Option<Position3D>,
    pub shoulders: Option<ShoulderPair>,
    pub gaze: Option<GazeVector>,
}

impl EngagementSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head(mut self, head: Position3D) -> Self {
        self.head = Some(head);
        self
    }

    pub fn with_shoulders(mut self, shoulders: ShoulderPair) -> Self {
        self.shoulders = Some(shoulders);
        self
    }

    pub fn with_gaze(mut self, gaze: GazeVector) -> Self {
        self.gaze = Some(gaze);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.shoulders.is_none() && self.gaze.is_none()
    }

    /// Reject empty samples and non-finite readings
    pub fn validate(&self) -> AttuneResult<()> {
        if self.is_empty() {
            return Err(AttuneError::MalformedSample("no readings".into()));
        }
        if self.head.map(|h| !h.is_finite()).unwrap_or(false) {
            return Err(AttuneError::MalformedSample("non-finite head position".into()));
        }
        if self.shoulders.map(|s| !s.is_finite()).unwrap_or(false) {
            return Err(AttuneError::MalformedSample("non-finite shoulder position".into()));
        }
        if self.gaze.map(|g| !g.is_finite()).unwrap_or(false) {
            return Err(AttuneError::MalformedSample("non-finite gaze vector".into()));
        }
        Ok(())
    }
}

/// Emotion vector reported by the primary face model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    pub joy: f32,
    pub sadness: f32,
    pub anger: f32,
    pub fear: f32,
    pub surprise: f32,
    pub disgust: f32,
    pub neutral: f32,
}

impl EmotionVector {
    /// Dominant emotion and its weight
    pub fn dominant(&self) -> (&'static str, f32) {
        let emotions = [
            ("joy", self.joy),
            ("sadness", self.sadness),
            ("anger", self.anger),
            ("fear", self.fear),
            ("surprise", self.surprise),
            ("disgust", self.disgust),
            ("neutral", self.neutral),
        ];

        emotions
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or(("neutral", 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample_is_malformed() {
        assert!(matches!(
            EngagementSample::new().validate(),
            Err(AttuneError::MalformedSample(_))
        ));
    }

    #[test]
    fn test_non_finite_sample_is_malformed() {
        let sample = EngagementSample::new().with_gaze(GazeVector::new(f32::NAN, 0.0));
        assert!(sample.validate().is_err());

        let sample = EngagementSample::new().with_head(Position3D::new(0.0, f32::INFINITY, 0.0));
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_partial_sample_is_valid() {
        let sample = EngagementSample::new().with_shoulders(ShoulderPair::new(0.4, 0.6));
        assert!(sample.validate().is_ok());
        assert!((sample.shoulders.unwrap().mid_y() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_gaze_magnitude() {
        assert_eq!(GazeVector::centered().magnitude(), 0.0);
        assert!((GazeVector::new(0.3, 0.4).magnitude() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_dominant_emotion() {
        let emotion = EmotionVector {
            joy: 0.8,
            surprise: 0.2,
            ..Default::default()
        };
        assert_eq!(emotion.dominant(), ("joy", 0.8));
    }
}

//! Engagement processor configuration

use std::time::Duration;

use attune_core::{AttuneError, AttuneResult};
use serde::{Deserialize, Serialize};

/// Thresholds and window sizes for engagement analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Sliding window length
    pub window: Duration,
    /// Hard cap on entries per window
    pub max_history: usize,

    /// Head-y delta that counts as movement
    pub movement_threshold: f32,
    /// How many recent head samples are inspected for nods
    pub nod_depth: usize,
    /// Head samples required before nodding is analyzed
    pub min_head_samples: usize,
    /// Cumulative movement that maps to full nodding intensity
    pub intensity_scale: f32,

    /// Shoulder samples required before posture is analyzed
    pub min_shoulder_samples: usize,
    /// Recent shoulder samples averaged
    pub posture_recent: usize,
    /// Earliest shoulder samples forming the baseline
    pub posture_baseline: usize,
    /// Shoulder drop that counts as leaning in
    pub lean_threshold: f32,
    /// Shoulder drop that counts as highly engaged
    pub strong_lean_threshold: f32,

    /// Gaze samples required before eye contact is analyzed
    pub min_gaze_samples: usize,
    /// Recent gaze vectors averaged
    pub gaze_average: usize,
    /// Distance from center under which gaze is contact
    pub contact_threshold: f32,
    /// Floor for the conversation duration used as a divisor
    pub min_elapsed: Duration,

    /// Recent overall scores kept for trend detection
    pub trend_history: usize,
    /// Scores required before a trend is reported
    pub trend_min_samples: usize,
    /// Distance from the rolling mean that counts as a trend
    pub trend_threshold: f32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(5000),
            max_history: 300,
            movement_threshold: 0.01,
            nod_depth: 20,
            min_head_samples: 10,
            intensity_scale: 0.5,
            min_shoulder_samples: 5,
            posture_recent: 10,
            posture_baseline: 5,
            lean_threshold: 0.05,
            strong_lean_threshold: 0.1,
            min_gaze_samples: 3,
            gaze_average: 5,
            contact_threshold: 0.3,
            min_elapsed: Duration::from_millis(1),
            trend_history: 10,
            trend_min_samples: 3,
            trend_threshold: 0.05,
        }
    }
}

impl EngagementConfig {
    /// Picks up subtle nods and small leans (quiet or distant users)
    pub fn sensitive() -> Self {
        Self {
            movement_threshold: 0.005,
            lean_threshold: 0.03,
            strong_lean_threshold: 0.07,
            contact_threshold: 0.35,
            ..Self::default()
        }
    }

    /// Ignores small movements (shaky cameras, handheld devices)
    pub fn relaxed() -> Self {
        Self {
            movement_threshold: 0.02,
            lean_threshold: 0.07,
            strong_lean_threshold: 0.14,
            contact_threshold: 0.25,
            ..Self::default()
        }
    }

    /// Nods per minute for a given nod count over the window
    pub fn nods_per_minute(&self, nods: f32) -> f32 {
        let window_secs = self.window.as_secs_f32().max(f32::EPSILON);
        nods * 60.0 / window_secs
    }

    pub fn validate(&self) -> AttuneResult<()> {
        if self.window.is_zero() {
            return Err(AttuneError::InvalidConfig("window must be non-zero".into()));
        }
        if self.max_history == 0 {
            return Err(AttuneError::InvalidConfig("max_history must be non-zero".into()));
        }
        if self.nod_depth < 2
            || self.posture_recent == 0
            || self.posture_baseline == 0
            || self.gaze_average == 0
        {
            return Err(AttuneError::InvalidConfig(
                "sample counts must be non-zero (nod_depth at least 2)".into(),
            ));
        }
        for (name, value) in [
            ("movement_threshold", self.movement_threshold),
            ("intensity_scale", self.intensity_scale),
            ("lean_threshold", self.lean_threshold),
            ("contact_threshold", self.contact_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AttuneError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if self.strong_lean_threshold < self.lean_threshold {
            return Err(AttuneError::InvalidConfig(
                "strong_lean_threshold below lean_threshold".into(),
            ));
        }
        Ok(())
    }
}

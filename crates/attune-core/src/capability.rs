//! Device capability profile
//!
//! Detected once at session start and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::{AttuneError, AttuneResult};

/// Device platform class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Desktop,
    Laptop,
    Tablet,
    Mobile,
    Web,
}

/// Coarse performance tier reported by capability detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceTier {
    Low,
    Medium,
    High,
}

/// Network quality at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkQuality {
    Offline,
    Poor,
    Good,
    Excellent,
}

/// Camera quality class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraQuality {
    Low,
    Standard,
    High,
}

/// Device capability profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub platform: Platform,
    pub performance_tier: PerformanceTier,
    /// Battery charge in [0.0, 1.0]; `None` when mains powered or unknown
    pub battery_level: Option<f32>,
    pub network_quality: NetworkQuality,
    /// GPU or neural accelerator available
    pub has_accelerator: bool,
    pub camera_quality: CameraQuality,
    /// Processing power score, 1 (weakest) to 10
    pub processing_power: u8,
}

impl CapabilityProfile {
    /// A mid-range desktop with a GPU
    pub fn desktop() -> Self {
        Self {
            platform: Platform::Desktop,
            performance_tier: PerformanceTier::High,
            battery_level: None,
            network_quality: NetworkQuality::Good,
            has_accelerator: true,
            camera_quality: CameraQuality::High,
            processing_power: 8,
        }
    }

    /// A budget phone on battery
    pub fn low_end_mobile() -> Self {
        Self {
            platform: Platform::Mobile,
            performance_tier: PerformanceTier::Low,
            battery_level: Some(0.5),
            network_quality: NetworkQuality::Poor,
            has_accelerator: false,
            camera_quality: CameraQuality::Standard,
            processing_power: 2,
        }
    }

    /// Reject profiles the selector cannot reason about
    pub fn validate(&self) -> AttuneResult<()> {
        if !(1..=10).contains(&self.processing_power) {
            return Err(AttuneError::InvalidCapability(format!(
                "processing power {} outside 1..=10",
                self.processing_power
            )));
        }

        if let Some(level) = self.battery_level {
            if !level.is_finite() || !(0.0..=1.0).contains(&level) {
                return Err(AttuneError::InvalidCapability(format!(
                    "battery level {} outside 0.0..=1.0",
                    level
                )));
            }
        }

        Ok(())
    }

    /// Low tier or processing power under `power_threshold`
    pub fn is_constrained(&self, power_threshold: u8) -> bool {
        self.performance_tier == PerformanceTier::Low || self.processing_power < power_threshold
    }

    /// Battery known and below `threshold`
    pub fn is_low_battery(&self, threshold: f32) -> bool {
        self.battery_level.map(|b| b < threshold).unwrap_or(false)
    }
}

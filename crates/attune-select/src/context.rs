//! Selection context - everything the selector is told at session start

use attune_core::{CapabilityProfile, FallbackStrategy};
use serde::{Deserialize, Serialize};

use crate::{ActivityType, LessonObjective, UserPreference};

/// Inputs to one selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionContext {
    /// Device capability; `None` means detection produced nothing
    pub capability: Option<CapabilityProfile>,
    /// Explicit tracking mode id, overriding stakeholder requests
    pub mode_id: Option<String>,
    pub activity: Option<ActivityType>,
    pub coach_id: Option<String>,
    pub partner_id: Option<String>,
    pub objectives: Vec<LessonObjective>,
    pub preference: UserPreference,
    /// Overrides the selector's default fallback strategy
    pub fallback: Option<FallbackStrategy>,
}

impl SelectionContext {
    pub fn new(capability: CapabilityProfile) -> Self {
        Self {
            capability: Some(capability),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode_id: impl Into<String>) -> Self {
        self.mode_id = Some(mode_id.into());
        self
    }

    pub fn with_activity(mut self, activity: ActivityType) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn with_coach(mut self, coach_id: impl Into<String>) -> Self {
        self.coach_id = Some(coach_id.into());
        self
    }

    pub fn with_partner(mut self, partner_id: impl Into<String>) -> Self {
        self.partner_id = Some(partner_id.into());
        self
    }

    pub fn with_objective(mut self, objective: LessonObjective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_preference(mut self, preference: UserPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

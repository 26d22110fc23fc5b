//! Configuration selector - one deterministic priority merge
//!
//! Selection steps:
//! 1. Validate the capability profile and resolve every profile id
//! 2. Collect secondary-model requests in declaration order
//!    (coach, partner, lesson objectives, activity default)
//! 3. Pick the secondary: the explicit mode's focus if one was given,
//!    otherwise the highest-priority request (earliest wins ties)
//! 4. Record every request that lost as an unmet-requirement insight
//! 5. Fit resolution (update frequency, analytics depth) to the device,
//!    lowering resolution but never dropping the chosen secondary

use std::sync::Arc;

use attune_core::{
    AnalyticsDepth, AttuneError, AttuneResult, BatteryImpact, CapabilityProfile, FallbackStrategy,
    InsightKind, ModelDescriptor, ModelKind, ModelRequest, ModelSlots, NetworkQuality,
    PerformanceTier, PrivacyTier, ProcessingMode, ProfileKind, SecondaryFocus, SessionInsight,
    Stakeholder, TrackingConfiguration, TrackingMode, UpdateFrequency,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{ProfileRegistry, SelectionContext, UserPreference};

/// Selector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Processing power below this counts as a constrained device
    pub power_threshold: u8,
    /// Battery level below this counts as low battery
    pub low_battery_threshold: f32,
    /// Fallback strategy when the context does not name one
    pub default_fallback: FallbackStrategy,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            power_threshold: 4,
            low_battery_threshold: 0.2,
            default_fallback: FallbackStrategy::Degrade,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> AttuneResult<()> {
        if !(1..=10).contains(&self.power_threshold) {
            return Err(AttuneError::InvalidConfig(format!(
                "power_threshold {} outside 1..=10",
                self.power_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.low_battery_threshold) {
            return Err(AttuneError::InvalidConfig(format!(
                "low_battery_threshold {} outside 0.0..=1.0",
                self.low_battery_threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of merging secondary-model requests
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub winner: Option<ModelRequest>,
    /// Requests for a different model than the winner, in declaration order
    pub unmet: Vec<ModelRequest>,
}

/// Pick the highest-priority request; the earliest declared wins ties
///
/// Requests for the same model as the winner are satisfied, not unmet.
pub fn merge_requests(requests: &[ModelRequest]) -> MergeOutcome {
    let mut winner: Option<&ModelRequest> = None;
    for request in requests {
        if winner.map(|w| request.priority > w.priority).unwrap_or(true) {
            winner = Some(request);
        }
    }

    let Some(winner) = winner else {
        return MergeOutcome::default();
    };

    let unmet = requests
        .iter()
        .filter(|r| r.kind != winner.kind)
        .cloned()
        .collect();

    MergeOutcome {
        winner: Some(winner.clone()),
        unmet,
    }
}

/// Merges stakeholder inputs into a tracking configuration
#[derive(Debug, Clone)]
pub struct ConfigurationSelector {
    registry: Arc<ProfileRegistry>,
    config: SelectorConfig,
}

impl ConfigurationSelector {
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self::with_config(registry, SelectorConfig::default())
    }

    pub fn with_config(registry: Arc<ProfileRegistry>, config: SelectorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select the configuration for a session
    ///
    /// Never fails: recoverable selection errors produce the casual default
    /// with a warning insight.
    pub fn select(&self, context: &SelectionContext) -> TrackingConfiguration {
        match self.try_select(context) {
            Ok(configuration) => {
                info!(
                    mode = %configuration.mode.id,
                    secondary = ?configuration.slots.secondary().map(|d| d.kind),
                    hz = configuration.update_frequency.hz(),
                    depth = ?configuration.analytics_depth,
                    insights = configuration.insights.len(),
                    "tracking configuration selected"
                );
                configuration
            }
            Err(err) => {
                warn!(error = %err, "selection failed, falling back to casual preset");
                self.casual_fallback(context, &err)
            }
        }
    }

    /// Select, surfacing recoverable errors instead of falling back
    pub fn try_select(&self, context: &SelectionContext) -> AttuneResult<TrackingConfiguration> {
        let capability = context.capability.as_ref().ok_or_else(|| {
            AttuneError::InvalidCapability("missing capability profile".into())
        })?;
        capability.validate()?;

        let explicit_mode = match context.mode_id.as_deref() {
            Some(id) => Some(self.registry.mode(id).ok_or_else(|| {
                AttuneError::UnknownProfile {
                    kind: ProfileKind::Mode,
                    id: id.to_string(),
                }
            })?),
            None => None,
        };

        let requests = self.collect_requests(context)?;
        let mut insights = Vec::new();

        let (mode, secondary) = match explicit_mode {
            Some(mode) => {
                let winner = mode.secondary.model();
                let unmet: Vec<ModelRequest> = requests
                    .into_iter()
                    .filter(|r| Some(r.kind) != winner)
                    .collect();
                let winner_request = winner.map(|kind| {
                    ModelRequest::new(
                        kind,
                        ModelDescriptor::catalog(kind).priority,
                        Stakeholder::Mode,
                        &mode.id,
                    )
                });
                record_unmet(&mut insights, winner_request.as_ref(), &unmet);
                (mode.clone(), winner)
            }
            None => {
                let outcome = merge_requests(&requests);
                record_unmet(&mut insights, outcome.winner.as_ref(), &outcome.unmet);
                let winner = outcome.winner.map(|r| r.kind);
                let focus = winner
                    .map(SecondaryFocus::for_model)
                    .unwrap_or(SecondaryFocus::DisplayOnly);
                (self.mode_for_focus(focus), winner)
            }
        };

        let secondary = secondary.map(|kind| {
            self.limit_privacy(
                ModelDescriptor::catalog(kind),
                capability,
                &context.preference,
                &mut insights,
            )
        });
        let primary = self.limit_privacy(
            ModelDescriptor::primary(),
            capability,
            &context.preference,
            &mut insights,
        );
        let slots = ModelSlots::with_secondary(primary, secondary);

        let (update_frequency, analytics_depth) =
            self.fit_resolution(capability, &mode, &context.preference, &mut insights);

        Ok(TrackingConfiguration {
            processing_mode: ProcessingMode::for_slots(&slots),
            mode,
            slots,
            update_frequency,
            analytics_depth,
            fallback: context.fallback.unwrap_or(self.config.default_fallback),
            insights,
        })
    }

    /// Secondary-model requests in declaration order
    fn collect_requests(&self, context: &SelectionContext) -> AttuneResult<Vec<ModelRequest>> {
        let mut requests = Vec::new();

        if let Some(id) = context.coach_id.as_deref() {
            let coach = self
                .registry
                .coach(id)
                .ok_or_else(|| AttuneError::UnknownProfile {
                    kind: ProfileKind::Coach,
                    id: id.to_string(),
                })?;
            requests.extend(coach.request());
        }

        if let Some(id) = context.partner_id.as_deref() {
            let partner = self
                .registry
                .partner(id)
                .ok_or_else(|| AttuneError::UnknownProfile {
                    kind: ProfileKind::Partner,
                    id: id.to_string(),
                })?;
            requests.extend(partner.request());
        }

        requests.extend(context.objectives.iter().filter_map(|o| o.request()));
        requests.extend(context.activity.and_then(|a| a.request()));

        debug!(count = requests.len(), "collected secondary model requests");
        Ok(requests)
    }

    /// Registered mode for a focus, preferring the built-in preset id
    fn mode_for_focus(&self, focus: SecondaryFocus) -> TrackingMode {
        let preset = TrackingMode::for_focus(focus);
        self.registry
            .mode(&preset.id)
            .filter(|mode| mode.secondary == focus)
            .cloned()
            .unwrap_or(preset)
    }

    /// Pull a model to the most remote tier the device and user allow
    fn limit_privacy(
        &self,
        descriptor: ModelDescriptor,
        capability: &CapabilityProfile,
        preference: &UserPreference,
        insights: &mut Vec<SessionInsight>,
    ) -> ModelDescriptor {
        let allowed = if capability.network_quality == NetworkQuality::Offline {
            PrivacyTier::Local
        } else if !preference.allow_cloud {
            PrivacyTier::Hybrid
        } else {
            PrivacyTier::Cloud
        };

        if descriptor.privacy <= allowed {
            return descriptor;
        }

        insights.push(SessionInsight::info(
            InsightKind::PrivacyLimited {
                kind: descriptor.kind,
            },
            format!(
                "{} limited to {:?} processing",
                descriptor.kind, allowed
            ),
        ));
        descriptor.with_privacy(allowed)
    }

    /// Update frequency and analytics depth for the device
    fn fit_resolution(
        &self,
        capability: &CapabilityProfile,
        mode: &TrackingMode,
        preference: &UserPreference,
        insights: &mut Vec<SessionInsight>,
    ) -> (UpdateFrequency, AnalyticsDepth) {
        let (mut frequency, mut depth) =
            if capability.has_accelerator && capability.performance_tier == PerformanceTier::High {
                (UpdateFrequency::Hz30, AnalyticsDepth::Comprehensive)
            } else {
                (UpdateFrequency::Hz15, AnalyticsDepth::Detailed)
            };

        if capability.is_constrained(self.config.power_threshold) {
            frequency = frequency.step_down();
            depth = depth.step_down();
            insights.push(SessionInsight::warning(
                InsightKind::Degraded {
                    reason: "constrained device".into(),
                },
                format!(
                    "constrained device ({:?} tier, power {}): {} Hz, {:?} analytics",
                    capability.performance_tier,
                    capability.processing_power,
                    frequency.hz(),
                    depth
                ),
            ));
        }

        let battery_limited = preference.battery_saver
            || capability.is_low_battery(self.config.low_battery_threshold);
        if mode.battery_impact == BatteryImpact::High && battery_limited {
            frequency = frequency.step_down();
            insights.push(SessionInsight::warning(
                InsightKind::Degraded {
                    reason: "battery".into(),
                },
                format!(
                    "high battery impact mode '{}' on limited battery: {} Hz",
                    mode.id,
                    frequency.hz()
                ),
            ));
        }

        if let Some(max_depth) = preference.max_depth {
            depth = depth.min(max_depth);
        }

        (frequency, depth)
    }

    /// The casual default, annotated with why selection fell back
    fn casual_fallback(
        &self,
        context: &SelectionContext,
        err: &AttuneError,
    ) -> TrackingConfiguration {
        let mut configuration = TrackingConfiguration::new(
            self.mode_for_focus(SecondaryFocus::DisplayOnly),
            ModelSlots::primary_only(),
        )
        .with_fallback(context.fallback.unwrap_or(self.config.default_fallback));

        configuration.insights.push(SessionInsight::warning(
            InsightKind::Recovered {
                reason: err.to_string(),
            },
            format!("using casual preset: {}", err),
        ));
        configuration
    }
}

fn record_unmet(
    insights: &mut Vec<SessionInsight>,
    winner: Option<&ModelRequest>,
    unmet: &[ModelRequest],
) {
    for request in unmet {
        let message = match winner {
            Some(w) => AttuneError::ConfigurationConflict {
                winner: w.kind,
                unmet: request.kind,
                stakeholder: format!("{} '{}'", request.stakeholder, request.origin),
            }
            .to_string(),
            None => format!(
                "{} requested by {} '{}' but the mode runs no secondary model",
                request.kind, request.stakeholder, request.origin
            ),
        };
        warn!(%message, "secondary model requirement unmet");
        insights.push(SessionInsight::warning(
            InsightKind::UnmetRequirement {
                request: request.clone(),
                winner: winner.map(|w| w.kind),
            },
            message,
        ));
    }
}

/// Models the configuration leaves unmet for a stakeholder
pub fn unmet_models(configuration: &TrackingConfiguration) -> Vec<ModelKind> {
    configuration
        .insights
        .iter()
        .filter_map(|i| match &i.kind {
            InsightKind::UnmetRequirement { request, .. } => Some(request.kind),
            _ => None,
        })
        .collect()
}

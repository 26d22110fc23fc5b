//! End-to-end session scenarios
//!
//! A `Scenario` wires a `SessionCoordinator` to scripted models so whole
//! sessions (select, start, frames, stop) can be driven on synthetic time.

use std::sync::Arc;

use attune_core::{AttuneResult, ModelKind, Timestamp, TrackingConfiguration};
use attune_engagement::EngagementScore;
use attune_runtime::{SessionConfig, SessionCoordinator, StopReport, TrackingFrame};
use attune_select::{ProfileRegistry, SelectionContext};

use crate::{frames, CallJournal, ModelScript, ScriptedProvider, TimedSample};

/// Scenario builder
#[derive(Debug, Clone)]
pub struct Scenario {
    registry: ProfileRegistry,
    config: SessionConfig,
    provider: ScriptedProvider,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Preset modes, healthy models, engagement analytics on
    pub fn new() -> Self {
        Self {
            registry: ProfileRegistry::with_presets(),
            config: SessionConfig {
                engagement_analytics: true,
                ..Default::default()
            },
            provider: ScriptedProvider::new(),
        }
    }

    pub fn with_registry(mut self, registry: ProfileRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_script(mut self, kind: ModelKind, script: ModelScript) -> Self {
        self.provider = self.provider.with_script(kind, script);
        self
    }

    pub fn build(self) -> AttuneResult<ScenarioRun> {
        let journal = self.provider.journal();
        let session = SessionCoordinator::from_config(
            &self.config,
            Arc::new(self.registry),
            Arc::new(self.provider),
        )?;
        Ok(ScenarioRun {
            session: Arc::new(session),
            journal,
        })
    }
}

/// A built scenario: the session plus the journal of its model calls
pub struct ScenarioRun {
    pub session: Arc<SessionCoordinator>,
    pub journal: CallJournal,
}

impl ScenarioRun {
    pub fn start(
        &self,
        context: &SelectionContext,
        at: Timestamp,
    ) -> AttuneResult<TrackingConfiguration> {
        self.session.start(context, at)
    }

    /// Push samples through `on_frame` in order
    pub fn feed(&self, samples: &[TimedSample]) -> Vec<TrackingFrame> {
        frames(samples)
            .into_iter()
            .map(|frame| self.session.on_frame(frame))
            .collect()
    }

    /// Feed samples and return the last score produced
    pub fn feed_for_score(&self, samples: &[TimedSample]) -> Option<EngagementScore> {
        last_score(&self.feed(samples))
    }

    pub fn stop(&self) -> StopReport {
        self.session.stop()
    }
}

/// Most recent engagement score among `frames`
pub fn last_score(frames: &[TrackingFrame]) -> Option<EngagementScore> {
    frames.iter().rev().find_map(|frame| frame.engagement)
}

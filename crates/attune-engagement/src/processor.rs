//! Engagement signal processor
//!
//! Pure with respect to time: every call carries the caller's timestamp, so
//! the same sample stream always produces the same scores.

use attune_core::{AttuneResult, EngagementSample, Timestamp};
use tracing::{debug, trace};

use crate::{
    analyze_nodding, analyze_posture, update_eye_contact, EngagementConfig, EngagementScore,
    EngagementState,
};

/// Turns the per-frame sample stream into engagement scores
#[derive(Debug, Clone)]
pub struct EngagementSignalProcessor {
    config: EngagementConfig,
    state: EngagementState,
    processed: u64,
}

impl EngagementSignalProcessor {
    pub fn new(config: EngagementConfig) -> Self {
        let state = EngagementState::new(&config);
        Self {
            config,
            state,
            processed: 0,
        }
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub fn state(&self) -> &EngagementState {
        &self.state
    }

    /// Samples processed since construction
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Start a new conversation at `now`
    ///
    /// Must be called once per conversation: the processor cannot tell
    /// conversations apart and would otherwise carry contact time over.
    pub fn reset(&mut self, now: Timestamp) {
        debug!(?now, "engagement state reset");
        self.state.reset(now);
    }

    /// Process one sample
    ///
    /// A malformed sample (no readings, or non-finite values) is rejected
    /// with `MalformedSample` and leaves the state untouched.
    pub fn process_sample(
        &mut self,
        sample: &EngagementSample,
        now: Timestamp,
    ) -> AttuneResult<EngagementScore> {
        sample.validate()?;

        self.state.record(sample, now);

        let nodding = analyze_nodding(&self.state.head, &self.config);
        let posture = analyze_posture(&self.state.shoulders, &self.config);
        let eye_contact =
            update_eye_contact(&mut self.state, sample.gaze.is_some(), now, &self.config);

        let overall = EngagementScore::composite(&nodding, &posture, &eye_contact);
        let trend = self.state.push_score(overall, &self.config);
        self.processed += 1;

        trace!(
            overall,
            nodding = nodding.score,
            posture = posture.score,
            contact = eye_contact.percentage,
            "engagement updated"
        );

        Ok(EngagementScore {
            timestamp: now,
            nodding,
            posture,
            eye_contact,
            overall,
            trend,
        })
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> EngagementState {
        self.state.clone()
    }

    /// Replace the current state with a snapshot
    pub fn restore(&mut self, state: EngagementState) {
        self.state = state;
    }
}

impl Default for EngagementSignalProcessor {
    fn default() -> Self {
        Self::new(EngagementConfig::default())
    }
}

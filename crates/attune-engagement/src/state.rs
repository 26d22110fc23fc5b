//! Engagement state - the only mutable state of a processor
//!
//! Kept as one plain value so it can be zeroed, snapshotted and restored as a
//! whole. It is owned by exactly one processor and never shared.

use std::collections::VecDeque;
use std::time::Duration;

use attune_core::{EngagementSample, GazeVector, Position3D, Timestamp};

use crate::{EngagementConfig, SlidingWindow, Trend};

/// Eye contact state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactState {
    #[default]
    NotInContact,
    InContact {
        since: Timestamp,
    },
}

impl ContactState {
    pub fn is_in_contact(&self) -> bool {
        matches!(self, ContactState::InContact { .. })
    }
}

/// Per-conversation engagement state
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementState {
    pub head: SlidingWindow<Position3D>,
    /// Mid-shoulder level
    pub shoulders: SlidingWindow<f32>,
    pub gaze: SlidingWindow<GazeVector>,
    /// Completed contact time, excluding an ongoing contact
    pub cumulative_contact: Duration,
    pub conversation_start: Option<Timestamp>,
    pub contact: ContactState,
    /// End of the last contact; a new contact is never dated before it
    pub contact_floor: Option<Timestamp>,
    /// Recent overall scores, oldest first
    pub recent_scores: VecDeque<f32>,
}

impl EngagementState {
    pub fn new(config: &EngagementConfig) -> Self {
        Self {
            head: SlidingWindow::new(config.window, config.max_history),
            shoulders: SlidingWindow::new(config.window, config.max_history),
            gaze: SlidingWindow::new(config.window, config.max_history),
            cumulative_contact: Duration::ZERO,
            conversation_start: None,
            contact: ContactState::NotInContact,
            contact_floor: None,
            recent_scores: VecDeque::with_capacity(config.trend_history),
        }
    }

    /// Zero everything and start a new conversation at `now`
    pub fn reset(&mut self, now: Timestamp) {
        self.head.clear();
        self.shoulders.clear();
        self.gaze.clear();
        self.cumulative_contact = Duration::ZERO;
        self.conversation_start = Some(now);
        self.contact = ContactState::NotInContact;
        self.contact_floor = Some(now);
        self.recent_scores.clear();
    }

    /// Append the sample's readings and evict stale entries
    pub fn record(&mut self, sample: &EngagementSample, now: Timestamp) {
        if self.conversation_start.is_none() {
            self.conversation_start = Some(now);
            self.contact_floor = Some(now);
        }

        if let Some(head) = sample.head {
            self.head.push(now, head);
        }
        if let Some(shoulders) = sample.shoulders {
            self.shoulders.push(now, shoulders.mid_y());
        }
        if let Some(gaze) = sample.gaze {
            self.gaze.push(now, gaze);
        }

        self.head.evict(now);
        self.shoulders.evict(now);
        self.gaze.evict(now);
    }

    /// Start a contact, dated no earlier than the end of the previous one
    pub fn enter_contact(&mut self, since: Timestamp) {
        if self.contact.is_in_contact() {
            return;
        }
        let since = match self.contact_floor {
            Some(floor) => since.max(floor),
            None => since,
        };
        self.contact = ContactState::InContact { since };
    }

    /// End the ongoing contact at `now`, adding its duration to the total
    pub fn leave_contact(&mut self, now: Timestamp) {
        if let ContactState::InContact { since } = self.contact {
            self.cumulative_contact += now - since;
            self.contact = ContactState::NotInContact;
            self.contact_floor = Some(now);
        }
    }

    /// Contact time including the ongoing contact
    pub fn contact_time(&self, now: Timestamp) -> Duration {
        match self.contact {
            ContactState::InContact { since } => self.cumulative_contact + (now - since),
            ContactState::NotInContact => self.cumulative_contact,
        }
    }

    /// Time since the conversation started, zero if it has not
    pub fn conversation_elapsed(&self, now: Timestamp) -> Duration {
        self.conversation_start
            .map(|start| now - start)
            .unwrap_or(Duration::ZERO)
    }

    /// Contact time over conversation time, in [0, 100]
    pub fn contact_percentage(&self, now: Timestamp, min_elapsed: Duration) -> f32 {
        let elapsed = self.conversation_elapsed(now).max(min_elapsed);
        if elapsed.is_zero() {
            return 0.0;
        }
        let ratio = self.contact_time(now).as_secs_f64() / elapsed.as_secs_f64();
        (ratio * 100.0).clamp(0.0, 100.0) as f32
    }

    /// Record an overall score and classify it against the rolling mean
    pub fn push_score(&mut self, overall: f32, config: &EngagementConfig) -> Trend {
        let trend = if self.recent_scores.len() >= config.trend_min_samples.max(1) {
            let mean = self.recent_scores.iter().sum::<f32>() / self.recent_scores.len() as f32;
            if overall > mean + config.trend_threshold {
                Trend::Rising
            } else if overall < mean - config.trend_threshold {
                Trend::Falling
            } else {
                Trend::Stable
            }
        } else {
            Trend::Stable
        };

        self.recent_scores.push_back(overall);
        while self.recent_scores.len() > config.trend_history.max(1) {
            self.recent_scores.pop_front();
        }

        trend
    }
}

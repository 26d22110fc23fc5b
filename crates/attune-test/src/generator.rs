//! Synthetic engagement streams on synthetic time
//!
//! Streams advance a generator-owned clock by one frame interval per sample,
//! so tests and benches never depend on wall time. Optional jitter comes
//! from a seeded RNG and stays well under the movement threshold.

use std::time::Duration;

use attune_core::{EngagementSample, GazeVector, Position3D, ShoulderPair, Timestamp};
use attune_runtime::TrackingFrame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Resting head height used by the streams
pub const REST_HEAD_Y: f32 = 0.5;

/// Resting shoulder line used by the streams
pub const REST_SHOULDER_Y: f32 = 0.6;

/// A timestamped sample
pub type TimedSample = (Timestamp, EngagementSample);

/// Deterministic sample stream builder
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    clock: Timestamp,
    interval: Duration,
    jitter: f32,
    rng: StdRng,
}

impl SampleGenerator {
    /// 30 fps from time zero, no jitter
    pub fn new(seed: u64) -> Self {
        Self {
            clock: Timestamp::from_millis(0),
            interval: Duration::from_micros(1_000_000 / 30),
            jitter: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.interval = Duration::from_micros(1_000_000 / u64::from(fps.max(1)));
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Uniform noise of up to `amplitude` on every coordinate
    pub fn with_jitter(mut self, amplitude: f32) -> Self {
        self.jitter = amplitude.abs();
        self
    }

    pub fn starting_at(mut self, at: Timestamp) -> Self {
        self.clock = at;
        self
    }

    pub fn now(&self) -> Timestamp {
        self.clock
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Move the clock without producing samples
    pub fn skip(&mut self, duration: Duration) {
        self.clock = self.clock + duration;
    }

    fn tick(&mut self) -> Timestamp {
        let at = self.clock;
        self.clock = self.clock + self.interval;
        at
    }

    fn noise(&mut self) -> f32 {
        if self.jitter == 0.0 {
            0.0
        } else {
            self.rng.gen_range(-self.jitter..=self.jitter)
        }
    }

    fn head(&mut self, y: f32) -> Position3D {
        Position3D::new(self.noise(), y + self.noise(), self.noise())
    }

    fn shoulders(&mut self, y: f32) -> ShoulderPair {
        ShoulderPair::new(y + self.noise(), y + self.noise())
    }

    fn gaze(&mut self, direction: GazeVector) -> GazeVector {
        GazeVector::new(direction.x + self.noise(), direction.y + self.noise())
    }

    /// Head bobbing between two heights, switching every `half_period` frames
    pub fn nodding(
        &mut self,
        frames: usize,
        amplitude: f32,
        half_period: usize,
    ) -> Vec<TimedSample> {
        let half_period = half_period.max(1);
        (0..frames)
            .map(|i| {
                let up = (i / half_period) % 2 == 1;
                let y = if up { REST_HEAD_Y + amplitude } else { REST_HEAD_Y };
                let head = self.head(y);
                (self.tick(), EngagementSample::new().with_head(head))
            })
            .collect()
    }

    /// Head held still
    pub fn still_head(&mut self, frames: usize) -> Vec<TimedSample> {
        (0..frames)
            .map(|_| {
                let head = self.head(REST_HEAD_Y);
                (self.tick(), EngagementSample::new().with_head(head))
            })
            .collect()
    }

    /// Shoulders at rest for `baseline` frames, then dropped by `drop`
    ///
    /// A positive `drop` is a forward lean; a negative one leans back.
    pub fn lean(&mut self, baseline: usize, leaning: usize, drop: f32) -> Vec<TimedSample> {
        (0..baseline + leaning)
            .map(|i| {
                let y = if i < baseline {
                    REST_SHOULDER_Y
                } else {
                    REST_SHOULDER_Y - drop
                };
                let shoulders = self.shoulders(y);
                (self.tick(), EngagementSample::new().with_shoulders(shoulders))
            })
            .collect()
    }

    /// Gaze held on `direction`
    pub fn gaze_at(&mut self, frames: usize, direction: GazeVector) -> Vec<TimedSample> {
        (0..frames)
            .map(|_| {
                let gaze = self.gaze(direction);
                (self.tick(), EngagementSample::new().with_gaze(gaze))
            })
            .collect()
    }

    pub fn centered_gaze(&mut self, frames: usize) -> Vec<TimedSample> {
        self.gaze_at(frames, GazeVector::centered())
    }

    /// Gaze well outside the contact radius
    pub fn averted_gaze(&mut self, frames: usize) -> Vec<TimedSample> {
        self.gaze_at(frames, GazeVector::new(0.6, 0.2))
    }

    /// Every part present: still head, resting shoulders, gaze on `direction`
    pub fn full(&mut self, frames: usize, direction: GazeVector) -> Vec<TimedSample> {
        (0..frames)
            .map(|_| {
                let sample = EngagementSample::new()
                    .with_head(self.head(REST_HEAD_Y))
                    .with_shoulders(self.shoulders(REST_SHOULDER_Y))
                    .with_gaze(self.gaze(direction));
                (self.tick(), sample)
            })
            .collect()
    }
}

/// Wrap samples as tracking frames
pub fn frames(samples: &[TimedSample]) -> Vec<TrackingFrame> {
    samples
        .iter()
        .map(|(at, sample)| TrackingFrame::new(*at, *sample))
        .collect()
}

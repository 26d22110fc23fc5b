//! Signal analysis over the sliding windows
//!
//! Each analyzer has a warm-up minimum. Below it the documented default is
//! returned: not nodding (score 0), neutral posture (score 0.5), no eye
//! contact.

use attune_core::{GazeVector, Position3D, Timestamp};

use crate::{
    ContactQuality, EngagementConfig, EngagementLevel, EngagementState, EyeContactSignal,
    NoddingPattern, NoddingSignal, PostureSignal, SlidingWindow,
};

/// Nodding from direction flips in recent head-y movement
///
/// Adjacent deltas above the movement threshold carry a direction; every
/// flip against the previous significant movement is one nod stroke, and
/// two strokes make one nod.
pub fn analyze_nodding(
    head: &SlidingWindow<Position3D>,
    config: &EngagementConfig,
) -> NoddingSignal {
    if head.len() < config.min_head_samples {
        return NoddingSignal::default();
    }

    let ys: Vec<f32> = head.latest(config.nod_depth).map(|(_, p)| p.y).collect();

    let mut last_direction: Option<bool> = None;
    let mut strokes = 0u32;
    let mut movement = 0.0f32;

    for pair in ys.windows(2) {
        let delta = pair[1] - pair[0];
        if delta.abs() <= config.movement_threshold {
            continue;
        }
        movement += delta.abs();

        let rising = delta > 0.0;
        if let Some(previous) = last_direction {
            if previous != rising {
                strokes += 1;
            }
        }
        last_direction = Some(rising);
    }

    let frequency = config.nods_per_minute(strokes as f32 / 2.0);
    let intensity = (movement / config.intensity_scale).min(1.0);
    let pattern = NoddingPattern::from_frequency(frequency);
    let score = 0.7 * (frequency / 10.0).min(1.0) + 0.3 * intensity;

    NoddingSignal {
        is_nodding: pattern != NoddingPattern::Neutral,
        frequency,
        intensity,
        pattern,
        score,
    }
}

/// Forward lean from the recent shoulder level against the window baseline
pub fn analyze_posture(shoulders: &SlidingWindow<f32>, config: &EngagementConfig) -> PostureSignal {
    if shoulders.len() < config.min_shoulder_samples {
        return PostureSignal::default();
    }

    let recent = mean(shoulders.latest(config.posture_recent).map(|(_, y)| *y));
    let baseline = mean(shoulders.earliest(config.posture_baseline).map(|(_, y)| *y));
    let change = baseline - recent;

    let level = if change > config.strong_lean_threshold {
        EngagementLevel::HighlyEngaged
    } else if change > config.lean_threshold {
        EngagementLevel::Engaged
    } else if change >= -config.lean_threshold {
        EngagementLevel::Neutral
    } else {
        EngagementLevel::Disengaged
    };

    PostureSignal {
        is_leaning_in: change > config.lean_threshold,
        change,
        level,
        score: (change * 5.0 + 0.5).clamp(0.0, 1.0),
    }
}

/// Advance the eye contact state machine and report contact share
///
/// A contact is dated from the oldest gaze sample in the averaged run, since
/// that is when the steady gaze began. A frame without a gaze reading ends
/// any ongoing contact: stale window entries never extend it.
pub fn update_eye_contact(
    state: &mut EngagementState,
    gaze_observed: bool,
    now: Timestamp,
    config: &EngagementConfig,
) -> EyeContactSignal {
    let has_eye_contact = if !gaze_observed || state.gaze.len() < config.min_gaze_samples {
        false
    } else {
        let run: Vec<&(Timestamp, GazeVector)> = state.gaze.latest(config.gaze_average).collect();
        let n = run.len() as f32;
        let (sx, sy) = run
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), (_, g)| (sx + g.x, sy + g.y));
        let average = GazeVector::new(sx / n, sy / n);

        let in_contact = average.magnitude() < config.contact_threshold;
        if in_contact {
            let run_start = run.first().map(|(t, _)| *t).unwrap_or(now);
            state.enter_contact(run_start);
        }
        in_contact
    };

    if !has_eye_contact {
        state.leave_contact(now);
    }

    let percentage = state.contact_percentage(now, config.min_elapsed);
    EyeContactSignal {
        has_eye_contact,
        percentage,
        quality: ContactQuality::from_percentage(percentage),
        total_contact: state.contact_time(now),
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

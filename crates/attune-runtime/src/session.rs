//! Session coordinator - select, start, score frames, stop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use attune_core::{
    AttuneError, AttuneResult, EmotionVector, EngagementSample, InsightKind, ModelKind,
    SessionInsight, Timestamp, TrackingConfiguration,
};
use attune_engagement::{EngagementScore, EngagementSignalProcessor, EngagementState};
use attune_select::{ConfigurationSelector, ProfileRegistry, SelectionContext};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{ModelLifecycleManager, ModelProvider, SessionConfig, StartNotice, StopReport};

/// Per-frame payload flowing from the trackers to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingFrame {
    pub captured_at: Timestamp,
    /// Primary model output, when the face tracker produced one
    pub emotion: Option<EmotionVector>,
    pub sample: EngagementSample,
    /// Filled in by the coordinator when engagement analytics is on
    pub engagement: Option<EngagementScore>,
}

impl TrackingFrame {
    pub fn new(captured_at: Timestamp, sample: EngagementSample) -> Self {
        Self {
            captured_at,
            emotion: None,
            sample,
            engagement: None,
        }
    }

    pub fn with_emotion(mut self, emotion: EmotionVector) -> Self {
        self.emotion = Some(emotion);
        self
    }
}

/// Composes selection, model lifecycle and engagement scoring
///
/// `start` calls are serialized against each other. `stop` is never blocked
/// by a start in progress: it cancels it instead.
pub struct SessionCoordinator {
    selector: ConfigurationSelector,
    lifecycle: ModelLifecycleManager,
    processor: Mutex<EngagementSignalProcessor>,
    analytics: AtomicBool,
    configuration: Mutex<Option<TrackingConfiguration>>,
    start_lock: Mutex<()>,
}

impl SessionCoordinator {
    /// Coordinator with default engagement settings and analytics off
    pub fn new(selector: ConfigurationSelector, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            selector,
            lifecycle: ModelLifecycleManager::new(provider),
            processor: Mutex::new(EngagementSignalProcessor::default()),
            analytics: AtomicBool::new(false),
            configuration: Mutex::new(None),
            start_lock: Mutex::new(()),
        }
    }

    pub fn from_config(
        config: &SessionConfig,
        registry: Arc<ProfileRegistry>,
        provider: Arc<dyn ModelProvider>,
    ) -> AttuneResult<Self> {
        config.validate()?;

        let selector = ConfigurationSelector::with_config(registry, config.selector.clone());
        let coordinator = Self {
            selector,
            lifecycle: ModelLifecycleManager::new(provider),
            processor: Mutex::new(EngagementSignalProcessor::new(config.engagement.clone())),
            analytics: AtomicBool::new(config.engagement_analytics),
            configuration: Mutex::new(None),
            start_lock: Mutex::new(()),
        };
        Ok(coordinator)
    }

    /// Start a session for `context`
    ///
    /// Any previous session is stopped first. Returns the realized
    /// configuration; model start failures absorbed by the fallback strategy
    /// appear in its insights.
    pub fn start(
        &self,
        context: &SelectionContext,
        now: Timestamp,
    ) -> AttuneResult<TrackingConfiguration> {
        let _starting = self.start_lock.lock();

        if self.is_active() || self.lifecycle.running_count() > 0 {
            debug!("stopping previous session");
            self.stop();
        }

        let token = self.lifecycle.generation();
        let selected = self.selector.select(context);
        let report = self.lifecycle.start_all_with(&selected, token)?;

        let mut realized = report.configuration;
        for notice in report.notices {
            realized.insights.push(notice_insight(notice));
        }

        if self.analytics_enabled() {
            self.processor.lock().reset(now);
        }

        let mut current = self.configuration.lock();
        if self.lifecycle.generation() != token {
            // A stop landed after the last model started
            return Err(AttuneError::StartCancelled);
        }
        *current = Some(realized.clone());
        drop(current);

        info!(
            mode = %realized.mode.id,
            models = realized.active_model_count(),
            analytics = self.analytics_enabled(),
            "session started"
        );
        Ok(realized)
    }

    /// Stop every running model and discard the configuration
    ///
    /// Safe at any time: before `start`, twice in a row, or while a `start`
    /// is in flight (which then fails with `StartCancelled`).
    pub fn stop(&self) -> StopReport {
        let report = self.lifecycle.stop_all();
        let previous = self.configuration.lock().take();
        if previous.is_some() {
            info!(
                stopped = report.stopped,
                failures = report.failures.len(),
                "session stopped"
            );
        }
        report
    }

    /// Score a frame when analytics is on; otherwise pass it through
    ///
    /// A malformed sample is skipped: the frame goes out without a score.
    pub fn on_frame(&self, mut frame: TrackingFrame) -> TrackingFrame {
        if !self.analytics_enabled() || !self.is_active() {
            return frame;
        }

        match self
            .processor
            .lock()
            .process_sample(&frame.sample, frame.captured_at)
        {
            Ok(score) => frame.engagement = Some(score),
            Err(err) => debug!(error = %err, at = ?frame.captured_at, "frame skipped"),
        }
        frame
    }

    /// Toggle engagement scoring; running models are not touched
    ///
    /// Turning analytics on mid-session keeps the processor's previous state;
    /// call `reset_conversation` to start counting afresh.
    pub fn set_engagement_analytics(&self, enabled: bool) {
        let previous = self.analytics.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!(enabled, "engagement analytics toggled");
        }
    }

    pub fn analytics_enabled(&self) -> bool {
        self.analytics.load(Ordering::SeqCst)
    }

    /// Begin a new conversation within the running session
    pub fn reset_conversation(&self, now: Timestamp) {
        self.processor.lock().reset(now);
    }

    /// Realized configuration of the running session
    pub fn configuration(&self) -> Option<TrackingConfiguration> {
        self.configuration.lock().clone()
    }

    pub fn is_active(&self) -> bool {
        self.configuration.lock().is_some()
    }

    pub fn running_models(&self) -> Vec<ModelKind> {
        self.lifecycle.running()
    }

    pub fn engagement_state(&self) -> EngagementState {
        self.processor.lock().snapshot()
    }

    pub fn processed_frames(&self) -> u64 {
        self.processor.lock().processed()
    }
}

fn notice_insight(notice: StartNotice) -> SessionInsight {
    match notice {
        StartNotice::SlotDegraded { kind, reason } => {
            warn!(%kind, "running without model");
            let message = format!("{kind} could not start and was disabled: {reason}");
            SessionInsight::warning(InsightKind::Degraded { reason }, message)
        }
        StartNotice::FellBackToMinimal { failed, reason } => {
            warn!(%failed, "running primary model only");
            let message =
                format!("{failed} could not start; continuing with the primary model only");
            SessionInsight::warning(InsightKind::Degraded { reason }, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelFault, TrackingModel};
    use attune_core::{CapabilityProfile, FallbackStrategy, GazeVector, ModelDescriptor};
    use std::sync::mpsc;
    use std::thread;

    /// Blocks a model start until the test releases it
    struct Gate {
        entered: mpsc::Sender<()>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    struct FakeModel {
        kind: ModelKind,
        gate: Option<Arc<Gate>>,
    }

    impl TrackingModel for FakeModel {
        fn kind(&self) -> ModelKind {
            self.kind
        }

        fn start(&mut self) -> Result<(), ModelFault> {
            if let Some(gate) = &self.gate {
                gate.entered.send(()).unwrap();
                gate.release.lock().recv().unwrap();
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ModelFault> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        broken: Option<ModelKind>,
        panicking: Option<ModelKind>,
        gate: Option<Arc<Gate>>,
    }

    impl ModelProvider for FakeProvider {
        fn instantiate(
            &self,
            descriptor: &ModelDescriptor,
        ) -> Result<Box<dyn TrackingModel>, ModelFault> {
            if self.panicking == Some(descriptor.kind) {
                panic!("{} tracker failed to load", descriptor.kind);
            }
            if self.broken == Some(descriptor.kind) {
                return Err(ModelFault::AssetsMissing(descriptor.kind.to_string()));
            }
            let gate = if descriptor.kind.is_primary() {
                self.gate.clone()
            } else {
                None
            };
            Ok(Box::new(FakeModel {
                kind: descriptor.kind,
                gate,
            }))
        }
    }

    fn coordinator(provider: FakeProvider) -> SessionCoordinator {
        let selector = ConfigurationSelector::new(Arc::new(ProfileRegistry::with_presets()));
        SessionCoordinator::new(selector, Arc::new(provider))
    }

    fn eye_contact_context() -> SelectionContext {
        SelectionContext::new(CapabilityProfile::desktop()).with_mode("eye-contact")
    }

    fn gaze_frame(ms: i64) -> TrackingFrame {
        TrackingFrame::new(
            Timestamp::from_millis(ms),
            EngagementSample::new().with_gaze(GazeVector::centered()),
        )
    }

    #[test]
    fn test_start_runs_selected_models() {
        let session = coordinator(FakeProvider::default());

        let configuration = session
            .start(&eye_contact_context(), Timestamp::from_millis(0))
            .unwrap();

        assert_eq!(configuration.active_model_count(), 2);
        assert_eq!(
            session.running_models(),
            vec![ModelKind::FaceEmotion, ModelKind::EyeGaze]
        );
        assert_eq!(session.configuration(), Some(configuration));
    }

    #[test]
    fn test_degraded_slot_becomes_insight() {
        let session = coordinator(FakeProvider {
            broken: Some(ModelKind::EyeGaze),
            ..Default::default()
        });

        let configuration = session
            .start(&eye_contact_context(), Timestamp::from_millis(0))
            .unwrap();

        assert_eq!(configuration.active_model_count(), 1);
        assert!(configuration
            .warnings()
            .any(|i| matches!(i.kind, InsightKind::Degraded { .. })));
    }

    #[test]
    fn test_panicking_provider_keeps_session_consistent() {
        let session = coordinator(FakeProvider {
            panicking: Some(ModelKind::EyeGaze),
            ..Default::default()
        });

        let configuration = session
            .start(&eye_contact_context(), Timestamp::from_millis(0))
            .unwrap();

        assert_eq!(configuration.active_model_count(), 1);
        assert!(session.is_active());
        assert_eq!(session.running_models(), vec![ModelKind::FaceEmotion]);
    }

    #[test]
    fn test_pause_failure_propagates() {
        let session = coordinator(FakeProvider {
            broken: Some(ModelKind::EyeGaze),
            ..Default::default()
        });
        let context = eye_contact_context().with_fallback(FallbackStrategy::Pause);

        let err = session.start(&context, Timestamp::from_millis(0)).unwrap_err();

        assert!(matches!(err, AttuneError::ModelInitialization { .. }));
        assert!(!session.is_active());
        assert!(session.running_models().is_empty());
    }

    #[test]
    fn test_frames_pass_through_without_analytics() {
        let session = coordinator(FakeProvider::default());
        session.start(&eye_contact_context(), Timestamp::from_millis(0)).unwrap();

        let frame = gaze_frame(100);
        assert_eq!(session.on_frame(frame.clone()), frame);
        assert_eq!(session.processed_frames(), 0);
    }

    #[test]
    fn test_frames_scored_with_analytics() {
        let session = coordinator(FakeProvider::default());
        session.set_engagement_analytics(true);
        session.start(&eye_contact_context(), Timestamp::from_millis(0)).unwrap();

        let scored = session.on_frame(gaze_frame(100));

        let score = scored.engagement.unwrap();
        assert_eq!(score.timestamp, Timestamp::from_millis(100));
        assert!((0.0..=1.0).contains(&score.overall));
        assert_eq!(session.processed_frames(), 1);
    }

    #[test]
    fn test_malformed_frame_skipped() {
        let session = coordinator(FakeProvider::default());
        session.set_engagement_analytics(true);
        session.start(&eye_contact_context(), Timestamp::from_millis(0)).unwrap();

        let empty = TrackingFrame::new(Timestamp::from_millis(100), EngagementSample::new());
        assert!(session.on_frame(empty).engagement.is_none());

        let broken = TrackingFrame::new(
            Timestamp::from_millis(133),
            EngagementSample::new().with_gaze(GazeVector::new(f32::NAN, 0.0)),
        );
        assert!(session.on_frame(broken).engagement.is_none());

        // The session keeps going
        assert!(session.on_frame(gaze_frame(166)).engagement.is_some());
    }

    #[test]
    fn test_toggle_leaves_models_alone() {
        let session = coordinator(FakeProvider::default());
        session.start(&eye_contact_context(), Timestamp::from_millis(0)).unwrap();
        let before = session.running_models();

        session.set_engagement_analytics(true);
        assert!(session.on_frame(gaze_frame(50)).engagement.is_some());
        session.set_engagement_analytics(false);
        assert!(session.on_frame(gaze_frame(100)).engagement.is_none());

        assert_eq!(session.running_models(), before);
    }

    #[test]
    fn test_stop_before_start_and_twice() {
        let session = coordinator(FakeProvider::default());
        assert_eq!(session.stop(), StopReport::default());

        session.start(&eye_contact_context(), Timestamp::from_millis(0)).unwrap();
        assert_eq!(session.stop().stopped, 2);
        assert_eq!(session.stop(), StopReport::default());

        assert!(!session.is_active());
        assert!(session.running_models().is_empty());
    }

    #[test]
    fn test_restart_replaces_session() {
        let session = coordinator(FakeProvider::default());
        session.start(&eye_contact_context(), Timestamp::from_millis(0)).unwrap();

        let presence = SelectionContext::new(CapabilityProfile::desktop()).with_mode("presence");
        session.start(&presence, Timestamp::from_millis(1_000)).unwrap();

        assert_eq!(
            session.running_models(),
            vec![ModelKind::FaceEmotion, ModelKind::BodyPose]
        );
    }

    #[test]
    fn test_stop_during_start_cancels_it() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Arc::new(Gate {
            entered: entered_tx,
            release: Mutex::new(release_rx),
        });
        let session = Arc::new(coordinator(FakeProvider {
            gate: Some(gate),
            ..Default::default()
        }));

        let starter = {
            let session = session.clone();
            thread::spawn(move || session.start(&eye_contact_context(), Timestamp::from_millis(0)))
        };

        // The face model is mid-start
        entered_rx.recv().unwrap();
        let report = session.stop();
        assert_eq!(report.stopped, 0);
        release_tx.send(()).unwrap();

        let result = starter.join().unwrap();
        assert_eq!(result.unwrap_err(), AttuneError::StartCancelled);
        assert!(!session.is_active());
        assert!(session.running_models().is_empty());
    }
}

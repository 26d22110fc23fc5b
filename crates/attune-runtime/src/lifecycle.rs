//! Model lifecycle - starting and stopping the models a configuration names

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use attune_core::{
    AttuneError, AttuneResult, FallbackStrategy, ModelDescriptor, ModelKind, TrackingConfiguration,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{ModelFault, ModelProvider, TrackingModel};

/// Something the caller should know about a completed start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartNotice {
    /// The slot failed to start and was emptied
    SlotDegraded { kind: ModelKind, reason: String },
    /// A model failed to start and the session dropped to the primary only
    FellBackToMinimal { failed: ModelKind, reason: String },
}

/// Outcome of a successful start
#[derive(Debug, Clone)]
pub struct StartReport {
    /// Realized configuration: the selected one with failed slots emptied
    pub configuration: TrackingConfiguration,
    pub notices: Vec<StartNotice>,
}

/// Outcome of a stop; stopping never fails as a whole
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Models that received a stop call
    pub stopped: usize,
    /// Models whose stop call reported a fault
    pub failures: Vec<(ModelKind, ModelFault)>,
}

impl StopReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Starts and stops tracking models
///
/// Each `stop_all` advances a generation counter. A start running under an
/// older generation notices the change the next time it touches the running
/// set and unwinds, so a stop issued mid-start never leaves a model behind.
pub struct ModelLifecycleManager {
    provider: Arc<dyn ModelProvider>,
    running: Mutex<Vec<Box<dyn TrackingModel>>>,
    generation: AtomicU64,
}

impl ModelLifecycleManager {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            running: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current stop generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Kinds of the running models, in start order
    pub fn running(&self) -> Vec<ModelKind> {
        self.running.lock().iter().map(|m| m.kind()).collect()
    }

    pub fn running_count(&self) -> usize {
        self.running.lock().len()
    }

    /// Start every populated slot, most important first
    pub fn start_all(&self, configuration: &TrackingConfiguration) -> AttuneResult<StartReport> {
        self.start_all_with(configuration, self.generation())
    }

    /// Start under a generation token obtained before the start began
    ///
    /// Returns `StartCancelled` if a `stop_all` happened since `token` was
    /// read; anything this call started is stopped again.
    pub fn start_all_with(
        &self,
        configuration: &TrackingConfiguration,
        token: u64,
    ) -> AttuneResult<StartReport> {
        let mut order: Vec<ModelDescriptor> = configuration.slots.iter().copied().collect();
        order.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut realized = configuration.clone();
        let mut notices = Vec::new();

        for descriptor in order {
            if realized.slots.get(descriptor.kind).is_none() {
                // Emptied by an earlier fallback
                continue;
            }

            let fault = match self.start_one(&descriptor, token) {
                Ok(()) => continue,
                Err(StartFailure::Cancelled) => return Err(AttuneError::StartCancelled),
                Err(StartFailure::Fault(fault)) => fault,
            };

            let kind = descriptor.kind;
            let reason = fault.to_string();
            warn!(%kind, %reason, fallback = ?configuration.fallback, "model failed to start");

            match configuration.fallback {
                FallbackStrategy::Degrade => {
                    realized = realized.without_model(kind);
                    notices.push(StartNotice::SlotDegraded { kind, reason });
                }
                FallbackStrategy::Pause => {
                    self.stop_all();
                    return Err(AttuneError::ModelInitialization { kind, reason });
                }
                FallbackStrategy::ContinueMinimal => {
                    if kind.is_primary() {
                        self.stop_all();
                        return Err(AttuneError::ModelInitialization { kind, reason });
                    }
                    self.stop_secondaries();
                    realized = realized.minimal();
                    notices.push(StartNotice::FellBackToMinimal {
                        failed: kind,
                        reason,
                    });
                }
            }
        }

        info!(
            models = realized.active_model_count(),
            degraded = notices.len(),
            "models started"
        );

        Ok(StartReport {
            configuration: realized,
            notices,
        })
    }

    fn start_one(&self, descriptor: &ModelDescriptor, token: u64) -> Result<(), StartFailure> {
        if self.generation() != token {
            return Err(StartFailure::Cancelled);
        }

        let mut model = guarded(|| self.provider.instantiate(descriptor))?;
        guarded(|| model.start())?;

        let mut running = self.running.lock();
        if self.generation() != token {
            drop(running);
            debug!(kind = %descriptor.kind, "start overtaken by stop");
            if let Err(fault) = guarded(|| model.stop()) {
                warn!(kind = %descriptor.kind, %fault, "model failed to stop");
            }
            return Err(StartFailure::Cancelled);
        }

        debug!(kind = %descriptor.kind, priority = ?descriptor.priority, "model started");
        running.push(model);
        Ok(())
    }

    fn stop_secondaries(&self) {
        let secondaries: Vec<Box<dyn TrackingModel>> = {
            let mut running = self.running.lock();
            let (primary, secondary) = std::mem::take(&mut *running)
                .into_iter()
                .partition(|m| m.kind().is_primary());
            *running = primary;
            secondary
        };

        for mut model in secondaries.into_iter().rev() {
            let kind = model.kind();
            if let Err(fault) = guarded(|| model.stop()) {
                warn!(%kind, %fault, "model failed to stop");
            }
        }
    }

    /// Stop every running model in reverse start order
    ///
    /// Every model receives its stop call even when earlier ones fail or
    /// panic. Calling this with nothing running is a no-op.
    pub fn stop_all(&self) -> StopReport {
        let models = {
            let mut running = self.running.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            std::mem::take(&mut *running)
        };

        let mut report = StopReport::default();
        for mut model in models.into_iter().rev() {
            let kind = model.kind();
            report.stopped += 1;
            match guarded(|| model.stop()) {
                Ok(()) => debug!(%kind, "model stopped"),
                Err(fault) => {
                    warn!(%kind, %fault, "model failed to stop");
                    report.failures.push((kind, fault));
                }
            }
        }

        if report.stopped > 0 {
            info!(
                stopped = report.stopped,
                failures = report.failures.len(),
                "models stopped"
            );
        }
        report
    }
}

impl Drop for ModelLifecycleManager {
    fn drop(&mut self) {
        if !self.running.get_mut().is_empty() {
            self.stop_all();
        }
    }
}

enum StartFailure {
    Cancelled,
    Fault(ModelFault),
}

impl From<ModelFault> for StartFailure {
    fn from(fault: ModelFault) -> Self {
        StartFailure::Fault(fault)
    }
}

/// Run a provider or model call, turning a panic into a fault
fn guarded<T>(op: impl FnOnce() -> Result<T, ModelFault>) -> Result<T, ModelFault> {
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ModelFault::Panicked(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::{ModelSlots, TrackingMode};
    use std::collections::HashSet;

    #[derive(Default)]
    struct Journal {
        calls: Mutex<Vec<String>>,
    }

    impl Journal {
        fn log(&self, entry: String) {
            self.calls.lock().push(entry);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    struct FakeModel {
        kind: ModelKind,
        journal: Arc<Journal>,
        fail_stop: bool,
        panic_stop: bool,
    }

    impl TrackingModel for FakeModel {
        fn kind(&self) -> ModelKind {
            self.kind
        }

        fn start(&mut self) -> Result<(), ModelFault> {
            self.journal.log(format!("start {}", self.kind));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), ModelFault> {
            self.journal.log(format!("stop {}", self.kind));
            if self.panic_stop {
                panic!("stop exploded");
            }
            if self.fail_stop {
                return Err(ModelFault::Other("stuck".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        journal: Arc<Journal>,
        fail_start: HashSet<ModelKind>,
        fail_stop: HashSet<ModelKind>,
        panic_stop: HashSet<ModelKind>,
        panic_instantiate: HashSet<ModelKind>,
    }

    impl ModelProvider for FakeProvider {
        fn instantiate(
            &self,
            descriptor: &ModelDescriptor,
        ) -> Result<Box<dyn TrackingModel>, ModelFault> {
            if self.panic_instantiate.contains(&descriptor.kind) {
                panic!("no weights for {}", descriptor.kind);
            }
            if self.fail_start.contains(&descriptor.kind) {
                return Err(ModelFault::CameraUnavailable(descriptor.kind.to_string()));
            }
            Ok(Box::new(FakeModel {
                kind: descriptor.kind,
                journal: self.journal.clone(),
                fail_stop: self.fail_stop.contains(&descriptor.kind),
                panic_stop: self.panic_stop.contains(&descriptor.kind),
            }))
        }
    }

    fn configuration(secondary: ModelKind, fallback: FallbackStrategy) -> TrackingConfiguration {
        let slots = ModelSlots::with_secondary(
            ModelDescriptor::primary(),
            Some(ModelDescriptor::catalog(secondary)),
        );
        TrackingConfiguration::new(TrackingMode::presence(), slots).with_fallback(fallback)
    }

    #[test]
    fn test_starts_critical_first() {
        let provider = Arc::new(FakeProvider::default());
        let journal = provider.journal.clone();
        let manager = ModelLifecycleManager::new(provider);

        let report = manager
            .start_all(&configuration(ModelKind::BodyPose, FallbackStrategy::Degrade))
            .unwrap();

        assert!(report.notices.is_empty());
        assert_eq!(report.configuration.active_model_count(), 2);
        assert_eq!(journal.calls(), vec!["start face-emotion", "start body-pose"]);
        assert_eq!(manager.running(), vec![ModelKind::FaceEmotion, ModelKind::BodyPose]);
    }

    #[test]
    fn test_degrade_empties_failed_slot() {
        let provider = Arc::new(FakeProvider {
            fail_start: [ModelKind::EyeGaze].into_iter().collect(),
            ..Default::default()
        });
        let manager = ModelLifecycleManager::new(provider);
        let selected = configuration(ModelKind::EyeGaze, FallbackStrategy::Degrade);

        let report = manager.start_all(&selected).unwrap();

        assert!(report.configuration.slots.get(ModelKind::EyeGaze).is_none());
        assert!(report.configuration.slots.primary().is_some());
        assert!(matches!(
            report.notices.as_slice(),
            [StartNotice::SlotDegraded { kind: ModelKind::EyeGaze, .. }]
        ));
        // The selected configuration is left as chosen
        assert!(selected.slots.get(ModelKind::EyeGaze).is_some());
        assert_eq!(manager.running_count(), 1);
    }

    #[test]
    fn test_pause_aborts_and_stops_started_models() {
        let provider = Arc::new(FakeProvider {
            fail_start: [ModelKind::HandGesture].into_iter().collect(),
            ..Default::default()
        });
        let journal = provider.journal.clone();
        let manager = ModelLifecycleManager::new(provider);

        let err = manager
            .start_all(&configuration(ModelKind::HandGesture, FallbackStrategy::Pause))
            .unwrap_err();

        assert!(matches!(
            err,
            AttuneError::ModelInitialization { kind: ModelKind::HandGesture, .. }
        ));
        assert_eq!(manager.running_count(), 0);
        assert_eq!(journal.calls(), vec!["start face-emotion", "stop face-emotion"]);
    }

    #[test]
    fn test_continue_minimal_keeps_primary() {
        let provider = Arc::new(FakeProvider {
            fail_start: [ModelKind::BodyPose].into_iter().collect(),
            ..Default::default()
        });
        let manager = ModelLifecycleManager::new(provider);

        let report = manager
            .start_all(&configuration(ModelKind::BodyPose, FallbackStrategy::ContinueMinimal))
            .unwrap();

        assert_eq!(report.configuration.active_model_count(), 1);
        assert!(report.configuration.slots.secondary().is_none());
        assert!(matches!(
            report.notices.as_slice(),
            [StartNotice::FellBackToMinimal { failed: ModelKind::BodyPose, .. }]
        ));
        assert_eq!(manager.running(), vec![ModelKind::FaceEmotion]);
    }

    #[test]
    fn test_continue_minimal_primary_failure_aborts() {
        let provider = Arc::new(FakeProvider {
            fail_start: [ModelKind::FaceEmotion].into_iter().collect(),
            ..Default::default()
        });
        let manager = ModelLifecycleManager::new(provider);

        let err = manager
            .start_all(&configuration(ModelKind::EyeGaze, FallbackStrategy::ContinueMinimal))
            .unwrap_err();

        assert!(matches!(
            err,
            AttuneError::ModelInitialization { kind: ModelKind::FaceEmotion, .. }
        ));
        assert_eq!(manager.running_count(), 0);
    }

    #[test]
    fn test_stop_all_reaches_every_model() {
        let provider = Arc::new(FakeProvider {
            fail_stop: [ModelKind::EyeGaze].into_iter().collect(),
            ..Default::default()
        });
        let journal = provider.journal.clone();
        let manager = ModelLifecycleManager::new(provider);
        manager
            .start_all(&configuration(ModelKind::EyeGaze, FallbackStrategy::Degrade))
            .unwrap();

        let report = manager.stop_all();

        // Reverse order, and the face model is stopped despite the gaze fault
        assert_eq!(report.stopped, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, ModelKind::EyeGaze);
        assert_eq!(
            &journal.calls()[2..],
            &["stop eye-gaze".to_string(), "stop face-emotion".to_string()]
        );
        assert_eq!(manager.running_count(), 0);
    }

    #[test]
    fn test_stop_all_survives_panicking_model() {
        let provider = Arc::new(FakeProvider {
            panic_stop: [ModelKind::HandGesture].into_iter().collect(),
            ..Default::default()
        });
        let journal = provider.journal.clone();
        let manager = ModelLifecycleManager::new(provider);
        manager
            .start_all(&configuration(ModelKind::HandGesture, FallbackStrategy::Degrade))
            .unwrap();

        let report = manager.stop_all();

        assert_eq!(report.stopped, 2);
        assert!(matches!(
            report.failures.as_slice(),
            [(ModelKind::HandGesture, ModelFault::Panicked(_))]
        ));
        assert!(journal.calls().contains(&"stop face-emotion".to_string()));
    }

    #[test]
    fn test_panicking_provider_follows_fallback() {
        let provider = Arc::new(FakeProvider {
            panic_instantiate: [ModelKind::EyeGaze].into_iter().collect(),
            ..Default::default()
        });
        let manager = ModelLifecycleManager::new(provider);

        let report = manager
            .start_all(&configuration(ModelKind::EyeGaze, FallbackStrategy::Degrade))
            .unwrap();
        assert!(report.configuration.slots.get(ModelKind::EyeGaze).is_none());
        match report.notices.as_slice() {
            [StartNotice::SlotDegraded { kind, reason }] => {
                assert_eq!(*kind, ModelKind::EyeGaze);
                assert!(reason.contains("panicked"));
            }
            other => panic!("unexpected notices: {other:?}"),
        }
        assert_eq!(manager.running(), vec![ModelKind::FaceEmotion]);
        manager.stop_all();

        let err = manager
            .start_all(&configuration(ModelKind::EyeGaze, FallbackStrategy::Pause))
            .unwrap_err();
        assert!(matches!(
            err,
            AttuneError::ModelInitialization { kind: ModelKind::EyeGaze, .. }
        ));
        assert_eq!(manager.running_count(), 0);
    }

    #[test]
    fn test_stop_all_is_idempotent() {
        let manager = ModelLifecycleManager::new(Arc::new(FakeProvider::default()));

        assert_eq!(manager.stop_all(), StopReport::default());
        manager
            .start_all(&configuration(ModelKind::EyeGaze, FallbackStrategy::Degrade))
            .unwrap();
        assert_eq!(manager.stop_all().stopped, 2);
        assert_eq!(manager.stop_all(), StopReport::default());
    }

    #[test]
    fn test_stale_token_cancels_start() {
        let provider = Arc::new(FakeProvider::default());
        let journal = provider.journal.clone();
        let manager = ModelLifecycleManager::new(provider);
        let token = manager.generation();
        manager.stop_all();

        let err = manager
            .start_all_with(&configuration(ModelKind::EyeGaze, FallbackStrategy::Degrade), token)
            .unwrap_err();

        assert_eq!(err, AttuneError::StartCancelled);
        assert!(journal.calls().is_empty());
        assert_eq!(manager.running_count(), 0);
    }

    #[test]
    fn test_drop_stops_running_models() {
        let provider = Arc::new(FakeProvider::default());
        let journal = provider.journal.clone();
        {
            let manager = ModelLifecycleManager::new(provider);
            manager
                .start_all(&configuration(ModelKind::EyeGaze, FallbackStrategy::Degrade))
                .unwrap();
        }
        assert_eq!(journal.calls().len(), 4);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_fallback() -> impl Strategy<Value = FallbackStrategy> {
            prop_oneof![
                Just(FallbackStrategy::Degrade),
                Just(FallbackStrategy::Pause),
                Just(FallbackStrategy::ContinueMinimal),
            ]
        }

        fn arb_secondary() -> impl Strategy<Value = ModelKind> {
            prop_oneof![
                Just(ModelKind::EyeGaze),
                Just(ModelKind::BodyPose),
                Just(ModelKind::HandGesture),
            ]
        }

        proptest! {
            #[test]
            fn prop_every_started_model_is_stopped_once(
                secondary in arb_secondary(),
                fallback in arb_fallback(),
                primary_fails in any::<bool>(),
                secondary_fails in any::<bool>(),
                secondary_stop_fails in any::<bool>(),
            ) {
                let mut fail_start = HashSet::new();
                if primary_fails {
                    fail_start.insert(ModelKind::FaceEmotion);
                }
                if secondary_fails {
                    fail_start.insert(secondary);
                }
                let mut fail_stop = HashSet::new();
                if secondary_stop_fails {
                    fail_stop.insert(secondary);
                }
                let provider = Arc::new(FakeProvider {
                    fail_start,
                    fail_stop,
                    ..Default::default()
                });
                let journal = provider.journal.clone();
                let manager = ModelLifecycleManager::new(provider);
                let selected = configuration(secondary, fallback);

                if let Ok(report) = manager.start_all(&selected) {
                    let started = report.configuration.active_model_count();
                    prop_assert!(started <= selected.active_model_count());
                    prop_assert_eq!(started, manager.running_count());
                }
                manager.stop_all();

                prop_assert_eq!(manager.running_count(), 0);
                let calls = journal.calls();
                for kind in ModelKind::all() {
                    let starts = calls.iter().filter(|c| **c == format!("start {kind}")).count();
                    let stops = calls.iter().filter(|c| **c == format!("stop {kind}")).count();
                    prop_assert_eq!(starts, stops);
                    prop_assert!(stops <= 1);
                }
            }
        }
    }
}

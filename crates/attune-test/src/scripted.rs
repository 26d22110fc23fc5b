//! Scripted tracking models
//!
//! Each model kind follows a `ModelScript` (fail to instantiate, fail or
//! stall on start, fail or panic on stop). Every call lands in a journal
//! shared by the provider and all models it created.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use attune_core::{ModelDescriptor, ModelKind};
use attune_runtime::{ModelFault, ModelProvider, TrackingModel};
use parking_lot::Mutex;

/// One recorded model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCall {
    Instantiate(ModelKind),
    Start { kind: ModelKind, ok: bool },
    Stop(ModelKind),
}

/// Shared, append-only record of model calls
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    calls: Arc<Mutex<Vec<ModelCall>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: ModelCall) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().clone()
    }

    /// Kinds that started successfully, in order
    pub fn started(&self) -> Vec<ModelKind> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ModelCall::Start { kind, ok: true } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> Vec<ModelKind> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ModelCall::Stop(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Kinds whose last successful start has no matching stop yet
    pub fn live(&self) -> Vec<ModelKind> {
        let mut live: Vec<ModelKind> = Vec::new();
        for call in self.calls.lock().iter() {
            match call {
                ModelCall::Start { kind, ok: true } => live.push(*kind),
                ModelCall::Stop(kind) => {
                    if let Some(pos) = live.iter().position(|k| k == kind) {
                        live.remove(pos);
                    }
                }
                _ => {}
            }
        }
        live
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// How a scripted model behaves
#[derive(Debug, Clone, Default)]
pub struct ModelScript {
    pub instantiate_fault: Option<ModelFault>,
    pub start_fault: Option<ModelFault>,
    pub stop_fault: Option<ModelFault>,
    pub panic_on_stop: bool,
    /// Blocking delay inside `start`
    pub start_delay: Duration,
}

impl ModelScript {
    /// Model that starts and stops cleanly
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn missing_assets() -> Self {
        Self {
            instantiate_fault: Some(ModelFault::AssetsMissing("weights not found".into())),
            ..Default::default()
        }
    }

    pub fn failing_start(fault: ModelFault) -> Self {
        Self {
            start_fault: Some(fault),
            ..Default::default()
        }
    }

    pub fn failing_stop(fault: ModelFault) -> Self {
        Self {
            stop_fault: Some(fault),
            ..Default::default()
        }
    }

    pub fn panicking_stop() -> Self {
        Self {
            panic_on_stop: true,
            ..Default::default()
        }
    }

    pub fn slow_start(delay: Duration) -> Self {
        Self {
            start_delay: delay,
            ..Default::default()
        }
    }
}

/// Tracking model that follows its script
pub struct ScriptedModel {
    kind: ModelKind,
    script: ModelScript,
    journal: CallJournal,
    running: bool,
}

impl ScriptedModel {
    pub fn new(kind: ModelKind, script: ModelScript, journal: CallJournal) -> Self {
        Self {
            kind,
            script,
            journal,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl TrackingModel for ScriptedModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn start(&mut self) -> Result<(), ModelFault> {
        if !self.script.start_delay.is_zero() {
            std::thread::sleep(self.script.start_delay);
        }

        let result = match &self.script.start_fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        };
        self.running = result.is_ok();
        self.journal.record(ModelCall::Start {
            kind: self.kind,
            ok: self.running,
        });
        result
    }

    fn stop(&mut self) -> Result<(), ModelFault> {
        self.journal.record(ModelCall::Stop(self.kind));
        self.running = false;

        if self.script.panic_on_stop {
            panic!("{} tracker crashed during shutdown", self.kind);
        }
        match &self.script.stop_fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }
}

/// Provider handing out scripted models; unscripted kinds are healthy
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    scripts: HashMap<ModelKind, ModelScript>,
    journal: CallJournal,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, kind: ModelKind, script: ModelScript) -> Self {
        self.scripts.insert(kind, script);
        self
    }

    pub fn journal(&self) -> CallJournal {
        self.journal.clone()
    }
}

impl ModelProvider for ScriptedProvider {
    fn instantiate(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Box<dyn TrackingModel>, ModelFault> {
        self.journal.record(ModelCall::Instantiate(descriptor.kind));

        let script = self.scripts.get(&descriptor.kind).cloned().unwrap_or_default();
        if let Some(fault) = &script.instantiate_fault {
            return Err(fault.clone());
        }

        Ok(Box::new(ScriptedModel::new(
            descriptor.kind,
            script,
            self.journal.clone(),
        )))
    }
}

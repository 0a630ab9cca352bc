//! Execution of parsed programs against a live class and instance store.
//!
//! A [`Session`] owns everything one program touches: classes, instances,
//! named blocks and conditions, variables and timers. Nothing is shared
//! between sessions.
pub mod error;
mod eval;
mod executor;
pub mod registry;
mod scope;
pub mod template;
pub mod timers;


use rustc_hash::FxHashMap;
use tracing::warn;

use crate::config::EngineConfig;
use crate::definitions::ClassCatalog;
use crate::instances::InstanceStore;
use crate::model::{ClassDefinition, InstanceRecord};
use crate::parser::parse_against;
use crate::result::ExecutionResult;
use crate::value::Value;
use error::{ExecError, ExecResult};
use registry::BlockRegistry;
use timers::TimerScheduler;

/// Output and errors produced by an interactive entry point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionReport {
    pub output: Vec<String>,
    pub errors: Vec<String>,
}

impl ActionReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, kind: &str, outcome: ExecResult<()>) {
        if let Err(err) = outcome {
            self.fail(kind, err);
        }
    }

    fn fail(&mut self, kind: &str, err: ExecError) {
        let message = format!("Error executing {kind}: {err}");
        warn!(kind, error = %err, "operation failed");
        self.errors.push(message);
    }
}

#[derive(Debug, Default)]
pub struct Session {
    config: EngineConfig,
    classes: ClassCatalog,
    instances: InstanceStore,
    registry: BlockRegistry,
    variables: FxHashMap<String, Value>,
    timers: TimerScheduler,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Starts from classes and instances persisted by the host.
    pub fn with_state(
        classes: impl IntoIterator<Item = ClassDefinition>,
        instances: impl IntoIterator<Item = InstanceRecord>,
    ) -> Self {
        Self {
            classes: ClassCatalog::from_definitions(classes),
            instances: InstanceStore::from_records(instances),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classes(&self) -> &[ClassDefinition] {
        self.classes.classes()
    }

    pub fn instances(&self) -> &[InstanceRecord] {
        self.instances.records()
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceRecord> {
        self.instances.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Parses `source` against the session's classes and executes it.
    pub fn run(&mut self, source: &str) -> ExecutionResult {
        let parsed = parse_against(source, &self.classes);
        self.execute(parsed)
    }

    pub fn stop_timer(&mut self, name: &str) -> bool {
        self.timers.cancel(name)
    }

    pub fn stop_all_timers(&mut self) {
        self.timers.cancel_all();
    }

    pub fn active_timers(&self) -> Vec<&str> {
        self.timers.names()
    }
}

/// Parses and executes `source` in a fresh session seeded with the given
/// classes and instances.
pub fn execute(
    source: &str,
    classes: &[ClassDefinition],
    instances: &[InstanceRecord],
) -> ExecutionResult {
    let mut session = Session::with_state(classes.iter().cloned(), instances.iter().cloned());
    session.run(source)
}

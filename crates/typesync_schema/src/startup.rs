//! Startup synchronization
//!
//! A full run reconciles every enabled kind in the order Document, Media,
//! Member. [`SyncCoordinator`] makes sure that happens at most once per
//! process: the first caller runs it, later callers return immediately.

use crate::config::SyncSettings;
use crate::error::Result;
use crate::mapping::TypeMappingRegistry;
use crate::model::{KindClassifier, ModelProvider};
use crate::store::SchemaStore;
use crate::sync::{ContentTypeSynchronizer, SyncReport};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Reports of one full run, one per synchronized kind, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub reports: Vec<SyncReport>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(SyncReport::is_success)
    }

    pub fn created(&self) -> usize {
        self.reports.iter().map(|r| r.created.len()).sum()
    }

    pub fn updated(&self) -> usize {
        self.reports.iter().map(|r| r.updated.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed.len()).sum()
    }
}

/// Synchronize every kind enabled in `settings`.
pub fn synchronize_all<S, M>(
    store: &mut S,
    model: &M,
    mappings: &TypeMappingRegistry,
    settings: &SyncSettings,
) -> Result<RunReport>
where
    S: SchemaStore + ?Sized,
    M: ModelProvider + KindClassifier,
{
    let mut run = RunReport::default();

    for kind in settings.kinds() {
        let definitions = model.definitions(kind);
        debug!("Synchronizing {} {} types", definitions.len(), kind);

        let report = ContentTypeSynchronizer::new(&mut *store, mappings, kind)
            .with_policy(settings.on_error)
            .synchronize(definitions, model)?;
        run.reports.push(report);
    }

    Ok(run)
}

/// Process-wide run-once guard.
#[derive(Debug)]
pub struct SyncCoordinator {
    has_run: AtomicBool,
    lock: Mutex<()>,
}

impl SyncCoordinator {
    pub const fn new() -> Self {
        Self {
            has_run: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    pub fn has_run(&self) -> bool {
        self.has_run.load(Ordering::Acquire)
    }

    /// Run `sync` unless a previous call already completed successfully.
    ///
    /// Returns `Ok(None)` when skipped. The flag is set only after `sync`
    /// succeeds, so a failed run may be retried.
    pub fn run_once<T, F>(&self, sync: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if self.has_run() {
            return Ok(None);
        }

        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self.has_run() {
            return Ok(None);
        }

        info!("Running startup synchronization");
        let result = sync()?;
        self.has_run.store(true, Ordering::Release);
        Ok(Some(result))
    }
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

static COORDINATOR: SyncCoordinator = SyncCoordinator::new();

/// The coordinator guarding this process's startup run.
pub fn coordinator() -> &'static SyncCoordinator {
    &COORDINATOR
}

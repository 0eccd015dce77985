//! Observers of a fusion run.
//!
//! The pipeline reports state transitions, finished warps, and the final
//! outcome to every registered observer.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::FusionError;
use crate::pipeline::FusionReport;
use crate::state::PipelineState;

/// Observer of pipeline progress. All hooks default to no-ops.
///
/// `on_warp` may be called from worker threads and in completion order
/// when warps run in parallel.
pub trait PipelineObserver: Send + Sync {
    fn on_transition(&self, _from: PipelineState, _to: PipelineState) {}

    /// Source `index` of `total` was warped to `output`.
    fn on_warp(&self, _index: usize, _total: usize, _output: &Path) {}

    fn on_complete(&self, _report: &FusionReport) {}

    /// The run failed while in `state`.
    fn on_error(&self, _state: PipelineState, _error: &FusionError) {}
}

/// Logs progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl PipelineObserver for LoggingObserver {
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        tracing::debug!("pipeline {} -> {}", from, to);
    }

    fn on_warp(&self, index: usize, total: usize, output: &Path) {
        tracing::info!("warped image {}/{} -> {}", index + 1, total, output.display());
    }

    fn on_complete(&self, report: &FusionReport) {
        tracing::info!(
            "merged {} images into {}",
            report.volumes,
            report.output.display()
        );
        if let Some(workspace) = &report.retained_workspace {
            tracing::info!("temporary files kept in {}", workspace.display());
        }
    }

    fn on_error(&self, state: PipelineState, error: &FusionError) {
        tracing::error!("fusion failed after {}: {}", state, error);
    }
}

/// Records every state visited and every finished warp.
#[derive(Debug, Clone, Default)]
pub struct TransitionHistory {
    states: Arc<Mutex<Vec<PipelineState>>>,
    warps: Arc<Mutex<Vec<(usize, PathBuf)>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// States in visiting order, starting with the initial one.
    pub fn states(&self) -> Vec<PipelineState> {
        lock(&self.states).clone()
    }

    /// Last state reached, if the run started.
    pub fn last(&self) -> Option<PipelineState> {
        lock(&self.states).last().copied()
    }

    /// Finished warps in completion order.
    pub fn warps(&self) -> Vec<(usize, PathBuf)> {
        lock(&self.warps).clone()
    }

    pub fn clear(&self) {
        lock(&self.states).clear();
        lock(&self.warps).clear();
    }
}

impl PipelineObserver for TransitionHistory {
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        let mut states = lock(&self.states);
        if states.is_empty() {
            states.push(from);
        }
        states.push(to);
    }

    fn on_warp(&self, index: usize, _total: usize, output: &Path) {
        lock(&self.warps).push((index, output.to_path_buf()));
    }
}

/// Fans every hook out to the registered observers, in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl PipelineObserver for ObserverSet {
    fn on_transition(&self, from: PipelineState, to: PipelineState) {
        for observer in &self.observers {
            observer.on_transition(from, to);
        }
    }

    fn on_warp(&self, index: usize, total: usize, output: &Path) {
        for observer in &self.observers {
            observer.on_warp(index, total, output);
        }
    }

    fn on_complete(&self, report: &FusionReport) {
        for observer in &self.observers {
            observer.on_complete(report);
        }
    }

    fn on_error(&self, state: PipelineState, error: &FusionError) {
        for observer in &self.observers {
            observer.on_error(state, error);
        }
    }
}

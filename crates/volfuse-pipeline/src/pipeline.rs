//! Fusion orchestrator.
//!
//! Drives one run through `Init → Staged → Warped → Merged → Exported →
//! Done`. Any error moves the run to `Failed`; the workspace is removed
//! (unless retained) before the error is returned.

use std::path::PathBuf;
use std::sync::Arc;

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::error::{FusionError, Result};
use crate::observer::{ObserverSet, PipelineObserver};
use crate::operator::{NiftiOperators, ReduceOperator, WarpOperator};
use crate::params::PipelineParams;
use crate::request::FusionRequest;
use crate::stages::{stage_inputs, MergeStage, WarpStage};
use crate::state::PipelineState;
use crate::workspace::Workspace;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionReport {
    pub output: PathBuf,
    /// Number of source images merged.
    pub volumes: usize,
    /// Workspace path when it was kept on disk.
    pub retained_workspace: Option<PathBuf>,
}

pub struct Pipeline {
    params: PipelineParams,
    warp: Arc<dyn WarpOperator>,
    reduce: Arc<dyn ReduceOperator>,
    observers: ObserverSet,
    cancel: Option<CancellationToken>,
}

impl Pipeline {
    pub fn new(params: PipelineParams, warp: Arc<dyn WarpOperator>, reduce: Arc<dyn ReduceOperator>) -> Self {
        Self {
            params,
            warp,
            reduce,
            observers: ObserverSet::new(),
            cancel: None,
        }
    }

    /// Pipeline backed by [`NiftiOperators`] on `device`.
    pub fn nifti<B: Backend>(params: PipelineParams, device: B::Device) -> Self {
        let operators = Arc::new(NiftiOperators::<B>::new(device));
        Self::new(params, operators.clone(), operators)
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Build the request from parallel lists and run it. An arity mismatch
    /// fails in `Init` without touching the filesystem.
    pub fn run_paths<S, F>(&self, sources: S, destination: impl Into<PathBuf>, fields: F) -> Result<FusionReport>
    where
        S: IntoIterator,
        S::Item: Into<PathBuf>,
        F: IntoIterator,
        F::Item: Into<PathBuf>,
    {
        match FusionRequest::from_lists(sources, destination, fields) {
            Ok(request) => self.run(&request),
            Err(err) => Err(self.fail(PipelineState::Init, err)),
        }
    }

    pub fn run(&self, request: &FusionRequest) -> Result<FusionReport> {
        let mut state = PipelineState::Init;
        tracing::info!(
            "fusing {} images into {} ({} interpolation)",
            request.len(),
            self.params.output.display(),
            self.params.interpolation
        );

        match self.execute(request, &mut state) {
            Ok(report) => {
                self.advance(&mut state, PipelineState::Done);
                self.observers.on_complete(&report);
                Ok(report)
            }
            Err(err) => Err(self.fail(state, err)),
        }
    }

    fn execute(&self, request: &FusionRequest, state: &mut PipelineState) -> Result<FusionReport> {
        self.params.validate()?;
        let extension = self.params.output_extension()?;
        self.check_cancelled(*state)?;

        let workspace = Workspace::create(
            self.params.workspace_parent.as_deref(),
            self.params.retain_workspace(),
        )?;
        let staged = stage_inputs(&workspace, request)?;
        self.advance(state, PipelineState::Staged);
        self.check_cancelled(*state)?;

        let warped = WarpStage {
            operator: self.warp.as_ref(),
            interpolation: self.params.interpolation,
            parallel: self.params.parallel_warps,
            cancel: self.cancel.as_ref(),
            observer: &self.observers,
        }
        .run(&workspace, &staged)?;
        self.advance(state, PipelineState::Warped);
        self.check_cancelled(*state)?;

        let merged = MergeStage {
            operator: self.reduce.as_ref(),
        }
        .run(&workspace, &warped, extension)?;
        self.advance(state, PipelineState::Merged);
        self.check_cancelled(*state)?;

        workspace.export(&merged, &self.params.output)?;
        self.advance(state, PipelineState::Exported);

        let retained_workspace = workspace.finish().unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            None
        });

        Ok(FusionReport {
            output: self.params.output.clone(),
            volumes: warped.len(),
            retained_workspace,
        })
    }

    fn advance(&self, state: &mut PipelineState, to: PipelineState) {
        debug_assert!(state.can_transition_to(to), "illegal transition {} -> {}", state, to);
        self.observers.on_transition(*state, to);
        *state = to;
    }

    fn fail(&self, from: PipelineState, err: FusionError) -> FusionError {
        let mut state = from;
        self.advance(&mut state, PipelineState::Failed);
        self.observers.on_error(from, &err);
        err
    }

    fn check_cancelled(&self, state: PipelineState) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(FusionError::Cancelled { state }),
            _ => Ok(()),
        }
    }
}

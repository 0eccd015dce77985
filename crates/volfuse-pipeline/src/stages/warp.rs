use rayon::prelude::*;
use volfuse_core::interpolation::Interpolation;

use crate::cancel::CancellationToken;
use crate::error::{FusionError, Result};
use crate::observer::PipelineObserver;
use crate::operator::WarpOperator;
use crate::state::PipelineState;
use crate::stages::StagedInputs;
use crate::workspace::{Role, VolumeRef, Workspace};

/// Warps every staged source onto the destination grid.
///
/// The returned list is in input order whether or not the warps ran in
/// parallel. On failure the error of the lowest failing index is returned
/// and nothing is merged.
pub struct WarpStage<'a> {
    pub operator: &'a dyn WarpOperator,
    pub interpolation: Interpolation,
    pub parallel: bool,
    pub cancel: Option<&'a CancellationToken>,
    pub observer: &'a dyn PipelineObserver,
}

impl WarpStage<'_> {
    pub fn run(&self, workspace: &Workspace, inputs: &StagedInputs) -> Result<Vec<VolumeRef>> {
        let total = inputs.len();
        let warp = |(index, (source, field)): (usize, &(VolumeRef, VolumeRef))| {
            self.warp_one(workspace, &inputs.destination, index, total, source, field)
        };

        if self.parallel {
            let results: Vec<Result<VolumeRef>> = inputs.pairs.par_iter().enumerate().map(warp).collect();
            results.into_iter().collect()
        } else {
            inputs.pairs.iter().enumerate().map(warp).collect()
        }
    }

    fn warp_one(
        &self,
        workspace: &Workspace,
        destination: &VolumeRef,
        index: usize,
        total: usize,
        source: &VolumeRef,
        field: &VolumeRef,
    ) -> Result<VolumeRef> {
        if self.cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(FusionError::Cancelled {
                state: PipelineState::Staged,
            });
        }

        let extension = source.extension().unwrap_or("nii");
        let output = workspace.artifact(Role::Warped, Some(index), extension);

        tracing::debug!(
            "warping {} with {}",
            source.logical_path().display(),
            field.logical_path().display()
        );
        self.operator
            .apply_warp(
                &source.path,
                &destination.path,
                &field.path,
                self.interpolation,
                &output.path,
            )
            .map_err(|e| {
                FusionError::warp_application(index, source.logical_path(), field.logical_path(), &e)
            })?;

        if !output.path.is_file() {
            let missing = anyhow::anyhow!("operator produced no output at {}", output.path.display());
            return Err(FusionError::warp_application(
                index,
                source.logical_path(),
                field.logical_path(),
                &missing,
            ));
        }

        self.observer.on_warp(index, total, &output.path);
        Ok(output)
    }
}

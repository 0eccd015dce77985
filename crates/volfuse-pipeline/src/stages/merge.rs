use std::path::PathBuf;

use crate::error::Result;
use crate::operator::ReduceOperator;
use crate::workspace::{Role, VolumeRef, Workspace};

/// Stacks the warped volumes in index order (`concat_image`) and averages
/// the stack (`merged_image`).
pub struct MergeStage<'a> {
    pub operator: &'a dyn ReduceOperator,
}

impl MergeStage<'_> {
    /// `extension` is used for both artifacts so the merged file can be
    /// exported as is.
    pub fn run(&self, workspace: &Workspace, warped: &[VolumeRef], extension: &str) -> Result<VolumeRef> {
        debug_assert!(warped
            .iter()
            .enumerate()
            .all(|(i, volume)| volume.index == Some(i)));

        let inputs: Vec<PathBuf> = warped.iter().map(|volume| volume.path.clone()).collect();

        let stacked = workspace.artifact(Role::Stacked, None, extension);
        self.operator.concat(&inputs, &stacked.path)?;
        tracing::debug!("stacked {} volumes into {}", inputs.len(), stacked.path.display());

        let merged = workspace.artifact(Role::Merged, None, extension);
        self.operator.mean(&stacked.path, &merged.path)?;
        tracing::debug!("averaged stack into {}", merged.path.display());

        Ok(merged)
    }
}

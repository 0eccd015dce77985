//! The steps of a fusion run, each confined to one workspace.

pub mod merge;
pub mod warp;

pub use merge::MergeStage;
pub use warp::WarpStage;

use crate::error::Result;
use crate::request::FusionRequest;
use crate::workspace::{Role, VolumeRef, Workspace};

/// Workspace copies of a request's files.
#[derive(Debug, Clone)]
pub struct StagedInputs {
    pub destination: VolumeRef,
    /// `(source, field)` per index, in request order.
    pub pairs: Vec<(VolumeRef, VolumeRef)>,
}

impl StagedInputs {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Copy the destination and every pair into `workspace`.
pub fn stage_inputs(workspace: &Workspace, request: &FusionRequest) -> Result<StagedInputs> {
    let destination = workspace.stage(request.destination(), Role::Destination, None)?;
    let pairs = request
        .pairs()
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            let source = workspace.stage(&pair.source, Role::Source, Some(index))?;
            let field = workspace.stage(&pair.field, Role::Field, Some(index))?;
            Ok((source, field))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StagedInputs { destination, pairs })
}

//! Warp-then-merge fusion of volumes into a common destination space.
//!
//! A [`Pipeline`] copies its inputs into a scoped [`Workspace`], warps each
//! source through its displacement field onto the destination grid, stacks
//! the warped volumes in input order, averages them, and exports the result.

pub mod cancel;
pub mod error;
pub mod observer;
pub mod operator;
pub mod params;
pub mod pipeline;
pub mod request;
pub mod stages;
pub mod state;
pub mod workspace;

pub use cancel::CancellationToken;
pub use error::{FusionError, Result};
pub use observer::{LoggingObserver, ObserverSet, PipelineObserver, TransitionHistory};
pub use operator::{NiftiOperators, ReduceOperator, WarpOperator};
pub use params::{PipelineParams, Verbosity, DEFAULT_OUTPUT};
pub use pipeline::{FusionReport, Pipeline};
pub use request::{FusionRequest, WarpPair};
pub use state::PipelineState;
pub use workspace::{Role, VolumeRef, Workspace};

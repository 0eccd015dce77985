//! Volume filters: resampling onto a reference grid and stack reduction.

pub mod resample;
pub mod merge;

pub use resample::ResampleFilter;
pub use merge::{mean_across_stack, merge_volumes};

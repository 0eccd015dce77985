//! Per-run configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use volfuse_core::interpolation::Interpolation;

use crate::error::{FusionError, Result};
use crate::workspace::nifti_extension;

/// Output location used when the caller does not name one.
pub const DEFAULT_OUTPUT: &str = "merged_images.nii.gz";

/// How much a run reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Expanded,
}

impl Verbosity {
    pub fn level(self) -> u8 {
        match self {
            Self::Quiet => 0,
            Self::Normal => 1,
            Self::Expanded => 2,
        }
    }

    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::Quiet),
            1 => Ok(Self::Normal),
            2 => Ok(Self::Expanded),
            other => Err(FusionError::invalid_parameter(format!(
                "verbosity must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }

    /// Default `tracing` filter directive for this level.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Expanded => "debug",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

impl FromStr for Verbosity {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "quiet" => Ok(Self::Quiet),
            "1" | "normal" => Ok(Self::Normal),
            "2" | "expanded" => Ok(Self::Expanded),
            other => Err(FusionError::invalid_parameter(format!(
                "unsupported verbosity `{}` (expected 0, 1 or 2)",
                other
            ))),
        }
    }
}

/// Immutable configuration of one fusion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub interpolation: Interpolation,
    pub output: PathBuf,
    /// Remove the workspace when the run ends.
    pub remove_temp: bool,
    pub verbosity: Verbosity,
    /// Run the per-source warps on the rayon pool.
    pub parallel_warps: bool,
    /// Directory the workspace is created in; the system temp dir if unset.
    pub workspace_parent: Option<PathBuf>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            remove_temp: true,
            verbosity: Verbosity::default(),
            parallel_warps: false,
            workspace_parent: None,
        }
    }
}

impl PipelineParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_remove_temp(mut self, remove_temp: bool) -> Self {
        self.remove_temp = remove_temp;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_parallel_warps(mut self, parallel: bool) -> Self {
        self.parallel_warps = parallel;
        self
    }

    pub fn with_workspace_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workspace_parent = Some(parent.into());
        self
    }

    pub fn retain_workspace(&self) -> bool {
        !self.remove_temp
    }

    /// Extension (`nii` or `nii.gz`) the merged artifacts are written with.
    pub fn output_extension(&self) -> Result<&'static str> {
        nifti_extension(&self.output).ok_or_else(|| {
            FusionError::invalid_parameter(format!(
                "output {} must end in .nii or .nii.gz",
                self.output.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.output_extension()?;
        if self.output.file_name().is_none() {
            return Err(FusionError::invalid_parameter(format!(
                "output {} does not name a file",
                self.output.display()
            )));
        }
        if let Some(parent) = self.workspace_parent.as_deref().filter(|p| !p.is_dir()) {
            return Err(FusionError::invalid_parameter(format!(
                "workspace parent {} is not a directory",
                parent.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PipelineParams::default();
        assert_eq!(params.interpolation, Interpolation::NearestNeighbor);
        assert_eq!(params.output, PathBuf::from("merged_images.nii.gz"));
        assert!(params.remove_temp);
        assert_eq!(params.verbosity, Verbosity::Normal);
        assert!(!params.parallel_warps);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::new()
            .with_interpolation(Interpolation::Spline)
            .with_output("fused.nii")
            .with_remove_temp(false)
            .with_verbosity(Verbosity::Expanded);

        assert_eq!(params.interpolation, Interpolation::Spline);
        assert!(params.retain_workspace());
        assert_eq!(params.output_extension().unwrap(), "nii");
    }

    #[test]
    fn test_output_extension_is_checked() {
        let err = PipelineParams::new().with_output("fused.mha").validate().unwrap_err();
        assert!(matches!(err, FusionError::InvalidParameter(_)));
    }

    #[test]
    fn test_missing_workspace_parent_is_rejected() {
        let err = PipelineParams::new()
            .with_workspace_parent("/nonexistent/volfuse/parent")
            .validate()
            .unwrap_err();
        assert!(matches!(err, FusionError::InvalidParameter(_)));
    }

    #[test]
    fn test_verbosity_parsing() {
        assert_eq!("0".parse::<Verbosity>().unwrap(), Verbosity::Quiet);
        assert_eq!(" 2 ".parse::<Verbosity>().unwrap(), Verbosity::Expanded);
        assert_eq!("normal".parse::<Verbosity>().unwrap(), Verbosity::Normal);
        assert!("3".parse::<Verbosity>().is_err());
        assert!(Verbosity::from_level(7).is_err());
        assert_eq!(Verbosity::Expanded.filter_directive(), "debug");
    }
}

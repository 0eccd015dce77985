//! Scoped working directory for intermediate artifacts.
//!
//! Inputs are copied in under positional names so caller-owned files are
//! never touched; every stage resolves its paths against [`Workspace::root`].
//! The directory is removed when the workspace is destroyed or dropped,
//! unless it was created with retention.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{FusionError, Result};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "volfuse_";

/// `nii.gz` or `nii` if `path` names a NIfTI-1 file, matched case-insensitively.
pub fn nifti_extension(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.ends_with(".nii.gz") && name.len() > ".nii.gz".len() {
        Some("nii.gz")
    } else if name.ends_with(".nii") && name.len() > ".nii".len() {
        Some("nii")
    } else {
        None
    }
}

/// What a file in the workspace is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    Field,
    Destination,
    Warped,
    Stacked,
    Merged,
}

impl Role {
    /// File stem inside the workspace. Indexed roles need `index`.
    pub fn file_stem(self, index: Option<usize>) -> String {
        let i = index.unwrap_or(0);
        match self {
            Self::Source => format!("input_{}", i),
            Self::Field => format!("warp_{}", i),
            Self::Destination => "dest".to_string(),
            Self::Warped => format!("input_{}_reg", i),
            Self::Stacked => "concat_image".to_string(),
            Self::Merged => "merged_image".to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Field => "field",
            Self::Destination => "destination",
            Self::Warped => "warped",
            Self::Stacked => "stacked",
            Self::Merged => "merged",
        };
        f.write_str(name)
    }
}

/// A volume file owned by a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRef {
    /// Caller's file this was copied from; `None` for produced artifacts.
    pub origin: Option<PathBuf>,
    pub path: PathBuf,
    pub index: Option<usize>,
    pub role: Role,
}

impl VolumeRef {
    /// The caller-facing name: the original path if staged, else the
    /// workspace path.
    pub fn logical_path(&self) -> &Path {
        self.origin.as_deref().unwrap_or(&self.path)
    }

    /// Extension of the workspace file.
    pub fn extension(&self) -> Option<&'static str> {
        nifti_extension(&self.path)
    }
}

#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    dir: Option<TempDir>,
    retain: bool,
}

impl Workspace {
    /// Create a uniquely named directory under `parent`, or under the
    /// system temp dir when `parent` is `None`.
    pub fn create(parent: Option<&Path>, retain: bool) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            let location = parent.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
            FusionError::resource(format!("cannot create workspace in {}", location.display()), e)
        })?;

        tracing::debug!("created workspace {}", dir.path().display());
        Ok(Self {
            root: dir.path().to_path_buf(),
            dir: Some(dir),
            retain,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a produced artifact.
    pub fn artifact(&self, role: Role, index: Option<usize>, extension: &str) -> VolumeRef {
        VolumeRef {
            origin: None,
            path: self.root.join(format!("{}.{}", role.file_stem(index), extension)),
            index,
            role,
        }
    }

    /// Copy `path` into the workspace under its positional name, keeping
    /// the NIfTI extension.
    pub fn stage(&self, path: &Path, role: Role, index: Option<usize>) -> Result<VolumeRef> {
        let extension = nifti_extension(path).ok_or_else(|| {
            FusionError::invalid_parameter(format!(
                "{} input {} is not a .nii or .nii.gz file",
                role,
                path.display()
            ))
        })?;

        let mut staged = self.artifact(role, index, extension);
        fs::copy(path, &staged.path).map_err(|e| {
            FusionError::resource(
                format!("cannot copy {} input {} into workspace", role, path.display()),
                e,
            )
        })?;
        staged.origin = Some(path.to_path_buf());

        tracing::debug!("staged {} as {}", path.display(), staged.path.display());
        Ok(staged)
    }

    /// Copy an artifact out of the workspace.
    pub fn export(&self, volume: &VolumeRef, destination: &Path) -> Result<()> {
        fs::copy(&volume.path, destination).map_err(|e| {
            FusionError::resource(
                format!(
                    "cannot export {} to {}",
                    volume.path.display(),
                    destination.display()
                ),
                e,
            )
        })?;
        Ok(())
    }

    /// Remove the directory tree. Calling it again, or after the tree is
    /// already gone, is a no-op.
    pub fn destroy(&mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };

        match dir.close() {
            Ok(()) => {
                tracing::debug!("removed workspace {}", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FusionError::resource(
                format!("cannot remove workspace {}", self.root.display()),
                e,
            )),
        }
    }

    /// Release the directory from management so it outlives `self`.
    pub fn keep(&mut self) -> PathBuf {
        if let Some(dir) = self.dir.take() {
            let _ = dir.keep();
        }
        self.root.clone()
    }

    /// End-of-run disposal: keep and report the path when retained,
    /// otherwise destroy.
    pub fn finish(mut self) -> Result<Option<PathBuf>> {
        if self.retain {
            Ok(Some(self.keep()))
        } else {
            self.destroy().map(|()| None)
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.retain {
            self.keep();
        } else if let Err(e) = self.destroy() {
            tracing::warn!("{}", e);
        }
    }
}

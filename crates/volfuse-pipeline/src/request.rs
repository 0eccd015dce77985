//! The inputs of one fusion run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};

/// A source image and the field that maps destination space into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpPair {
    pub source: PathBuf,
    pub field: PathBuf,
}

impl WarpPair {
    pub fn new(source: impl Into<PathBuf>, field: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            field: field.into(),
        }
    }
}

/// An ordered, non-empty list of warp pairs and the destination they are
/// resampled onto. Pair `i` lands at position `i` of the merge stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionRequest {
    destination: PathBuf,
    pairs: Vec<WarpPair>,
}

impl FusionRequest {
    pub fn new(destination: impl Into<PathBuf>, pairs: Vec<WarpPair>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(FusionError::precondition("at least one source image is required"));
        }
        Ok(Self {
            destination: destination.into(),
            pairs,
        })
    }

    /// Pair two parallel lists by position. The counts must match.
    pub fn from_lists<S, F>(sources: S, destination: impl Into<PathBuf>, fields: F) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<PathBuf>,
        F: IntoIterator,
        F::Item: Into<PathBuf>,
    {
        let sources: Vec<PathBuf> = sources.into_iter().map(Into::into).collect();
        let fields: Vec<PathBuf> = fields.into_iter().map(Into::into).collect();

        if sources.len() != fields.len() {
            return Err(FusionError::precondition(format!(
                "{} source images but {} warp fields; each source needs exactly one field",
                sources.len(),
                fields.len()
            )));
        }

        let pairs = sources
            .into_iter()
            .zip(fields)
            .map(|(source, field)| WarpPair { source, field })
            .collect();
        Self::new(destination, pairs)
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn pairs(&self) -> &[WarpPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pairs_by_position() {
        let request = FusionRequest::from_lists(["a.nii", "b.nii"], "dest.nii", ["wa.nii", "wb.nii"]).unwrap();

        assert_eq!(request.len(), 2);
        assert_eq!(request.destination(), Path::new("dest.nii"));
        assert_eq!(request.pairs()[1], WarpPair::new("b.nii", "wb.nii"));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = FusionRequest::from_lists(["a.nii", "b.nii", "c.nii"], "dest.nii", ["wa.nii", "wb.nii"])
            .unwrap_err();

        assert!(matches!(err, FusionError::Precondition(_)));
        assert!(err.to_string().contains("3 source images but 2 warp fields"));
    }

    #[test]
    fn test_empty_request() {
        let err = FusionRequest::new("dest.nii", Vec::new()).unwrap_err();
        assert!(matches!(err, FusionError::Precondition(_)));
    }

    proptest! {
        #[test]
        fn test_arity_decides_validity(sources in 0usize..6, fields in 0usize..6) {
            let names = |prefix: &str, n: usize| (0..n).map(|i| format!("{}_{}.nii", prefix, i)).collect::<Vec<_>>();
            let result = FusionRequest::from_lists(names("input", sources), "dest.nii", names("warp", fields));

            if sources == fields && sources > 0 {
                let request = result.unwrap();
                for (i, pair) in request.pairs().iter().enumerate() {
                    prop_assert_eq!(&pair.source, &PathBuf::from(format!("input_{}.nii", i)));
                    prop_assert_eq!(&pair.field, &PathBuf::from(format!("warp_{}.nii", i)));
                }
            } else {
                prop_assert!(matches!(result, Err(FusionError::Precondition(_))));
            }
        }
    }
}

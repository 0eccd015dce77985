//! Run states of the fusion pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `Init → Staged → Warped → Merged → Exported → Done`, with `Failed`
/// reachable from every state that is not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Init,
    Staged,
    Warped,
    Merged,
    Exported,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The state a successful step leads to, `None` once terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Staged),
            Self::Staged => Some(Self::Warped),
            Self::Warped => Some(Self::Merged),
            Self::Merged => Some(Self::Exported),
            Self::Exported => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn can_transition_to(self, to: Self) -> bool {
        match to {
            Self::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Staged => "staged",
            Self::Warped => "warped",
            Self::Merged => "merged",
            Self::Exported => "exported",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_linear() {
        let mut state = PipelineState::Init;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(state.can_transition_to(next));
            state = next;
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                PipelineState::Init,
                PipelineState::Staged,
                PipelineState::Warped,
                PipelineState::Merged,
                PipelineState::Exported,
                PipelineState::Done,
            ]
        );
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        for state in [
            PipelineState::Init,
            PipelineState::Staged,
            PipelineState::Warped,
            PipelineState::Merged,
            PipelineState::Exported,
        ] {
            assert!(state.can_transition_to(PipelineState::Failed), "{}", state);
        }
        assert!(!PipelineState::Done.can_transition_to(PipelineState::Failed));
        assert!(!PipelineState::Failed.can_transition_to(PipelineState::Failed));
    }

    #[test]
    fn test_no_skipping() {
        assert!(!PipelineState::Init.can_transition_to(PipelineState::Warped));
        assert!(!PipelineState::Merged.can_transition_to(PipelineState::Done));
    }
}

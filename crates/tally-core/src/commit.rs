//! # Commit Phases
//!
//! Lifecycle of a single order commit.
//!
//! ```text
//!  Received ──► Validating ──► Committing ──► Committed
//!                   │               │
//!                   └───────────────┴──────► RolledBack
//! ```
//!
//! A failure while validating ends the commit with nothing written; a failure
//! while committing rolls the transaction back. Both land in `RolledBack`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitPhase {
    Received,
    Validating,
    Committing,
    Committed,
    RolledBack,
}

impl CommitPhase {
    /// Terminal phases accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, CommitPhase::Committed | CommitPhase::RolledBack)
    }

    /// Checks whether moving from `self` to `next` is a legal step.
    pub const fn can_transition_to(&self, next: CommitPhase) -> bool {
        matches!(
            (self, next),
            (CommitPhase::Received, CommitPhase::Validating)
                | (CommitPhase::Validating, CommitPhase::Committing)
                | (CommitPhase::Validating, CommitPhase::RolledBack)
                | (CommitPhase::Committing, CommitPhase::Committed)
                | (CommitPhase::Committing, CommitPhase::RolledBack)
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            CommitPhase::Received => "received",
            CommitPhase::Validating => "validating",
            CommitPhase::Committing => "committing",
            CommitPhase::Committed => "committed",
            CommitPhase::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

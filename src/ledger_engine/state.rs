//! Transfer pipeline states
//!
//! Pending → Validated → Committed → BalancesApplied, with Rejected reachable before commit.
//! A transfer stuck in Committed has a durable record whose balance deltas never landed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Intent received, nothing checked yet
    Pending,

    /// Shape & status checks passed, code assigned for deposits
    Validated,

    /// Record persisted and indexed. Balances not yet touched
    Committed,

    /// Terminal: both record and balance deltas are in place
    BalancesApplied,

    /// Terminal: rejected before commit, nothing persisted
    Rejected,
}

impl TransferState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::BalancesApplied | TransferState::Rejected)
    }

    pub fn can_advance_to(&self, next: TransferState) -> bool {
        matches!(
            (self, next),
            (TransferState::Pending, TransferState::Validated)
                | (TransferState::Pending, TransferState::Rejected)
                | (TransferState::Validated, TransferState::Committed)
                | (TransferState::Validated, TransferState::Rejected)
                | (TransferState::Committed, TransferState::BalancesApplied)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Pending => "PENDING",
            TransferState::Validated => "VALIDATED",
            TransferState::Committed => "COMMITTED",
            TransferState::BalancesApplied => "BALANCES_APPLIED",
            TransferState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Errors raised by session management.
//!
//! These propagate to the caller. Request handling never uses them to fail a
//! peer request; the router answers with a JSON-RPC error instead.

use crate::retry::is_dead_proposal_message;
use crate::session::{ProposalId, TransportError};

/// Failure of a session lifecycle operation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The proposal is not in the transport's pending set.
    #[error("Proposal {id} does not exist or is no longer pending")]
    ProposalNotPending {
        /// The proposal that was looked up.
        id: ProposalId,
    },
    /// An approval or rejection of the proposal is already in flight.
    #[error("Proposal {id} is already being settled")]
    ProposalSettled {
        /// The proposal.
        id: ProposalId,
    },
    /// The pairing URI does not use the `wc:` scheme.
    #[error("Invalid pairing URI: expected a `wc:` URI")]
    InvalidPairingUri,
    /// The transport reported a failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Whether retrying the same operation can succeed.
    ///
    /// Only transport failures qualify, and only when their message does not
    /// describe a dead proposal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !is_dead_proposal_message(&e.message),
            Self::ProposalNotPending { .. } | Self::ProposalSettled { .. } | Self::InvalidPairingUri => {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SessionError::Transport(TransportError::new("relay timeout")).is_retryable());
        assert!(!SessionError::Transport(TransportError::new("Proposal expired")).is_retryable());
        assert!(!SessionError::ProposalNotPending { id: 1 }.is_retryable());
        assert!(!SessionError::ProposalSettled { id: 1 }.is_retryable());
    }
}

//! Caller callbacks for session lifecycle events.
//!
//! The [`SessionManager`](crate::SessionManager) consults [`SessionHooks`]
//! when a proposal is ready to be decided and notifies it of outcomes. All
//! methods have default implementations; override only the ones you need.

use std::future::Future;
use std::pin::Pin;

use crate::error::SessionError;
use crate::session::{Proposal, ProposalId, Session};

/// What to do with a proposal once it is ready to be decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalDecision {
    /// Approve with negotiated namespaces, retrying transient failures.
    Approve,
    /// Reject with [`ErrorReason::USER_REJECTED`](crate::session::ErrorReason::USER_REJECTED).
    Reject,
    /// Leave it pending; the caller will approve or reject later.
    Defer,
}

/// Lifecycle callbacks. This trait is dyn-compatible.
pub trait SessionHooks: Send + Sync {
    /// Called for each new proposal after the settle delay.
    fn on_proposal<'a>(
        &'a self,
        _proposal: &'a Proposal,
    ) -> Pin<Box<dyn Future<Output = ProposalDecision> + Send + 'a>> {
        Box::pin(async { ProposalDecision::Defer })
    }

    /// Called with the outcome of an approval started by [`ProposalDecision::Approve`].
    fn on_approval_result<'a>(
        &'a self,
        _id: ProposalId,
        _result: Result<&'a Session, &'a SessionError>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    /// Called after a peer deleted a session.
    fn on_session_delete<'a>(
        &'a self,
        _topic: &'a str,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    /// Called after a pending proposal expired.
    fn on_proposal_expire(&self, _id: ProposalId) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Hooks that leave every proposal pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl SessionHooks for NoHooks {}

/// Hooks that approve every proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl SessionHooks for AutoApprove {
    fn on_proposal<'a>(
        &'a self,
        proposal: &'a Proposal,
    ) -> Pin<Box<dyn Future<Output = ProposalDecision> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                proposal_id = proposal.id,
                peer = %proposal.proposer.name,
                "Auto-approving session proposal"
            );
            ProposalDecision::Approve
        })
    }
}

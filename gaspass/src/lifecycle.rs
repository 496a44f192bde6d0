//! Proposal and session state machine.
//!
//! A proposal is tracked from its event until it is approved, rejected, or
//! reported expired; terminal proposals are dropped from tracking. An
//! approved session lives until the peer or the wallet deletes it, or its
//! expiry passes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;

use crate::config::ConfigHandle;
use crate::error::SessionError;
use crate::hooks::{NoHooks, ProposalDecision, SessionHooks};
use crate::jsonrpc::JsonRpcResponse;
use crate::namespace::negotiate;
use crate::retry::{RetryPolicy, recheck, retry};
use crate::session::{
    ErrorReason, PairingTransport, PairingUri, Proposal, ProposalId, Session, SessionRequest,
    TransportEvent,
};
use crate::timestamp::UnixTimestamp;

/// Where a tracked proposal currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalState {
    /// Awaiting a decision.
    Proposed,
    /// An approval or rejection is in flight.
    Settling,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Proposed => "proposed",
            Self::Settling => "settling",
        })
    }
}

/// Delays used to absorb the transport's registration lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Wait between a proposal event and asking the hooks for a decision.
    pub proposal_settle_delay: Duration,
    /// Wait before the second pending-set lookup during approval.
    pub pending_recheck_delay: Duration,
    /// Backoff for [`SessionManager::approve_with_retry`].
    pub approval_retry: RetryPolicy,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            proposal_settle_delay: Duration::from_millis(500),
            pending_recheck_delay: Duration::from_secs(1),
            approval_retry: RetryPolicy::default(),
        }
    }
}

struct Inner<T> {
    transport: T,
    config: ConfigHandle,
    proposals: DashMap<ProposalId, ProposalState>,
    sessions: RwLock<Vec<Session>>,
}

/// Owns proposal and session state on top of a [`PairingTransport`].
///
/// Cheap to clone; clones share state.
pub struct SessionManager<T> {
    inner: Arc<Inner<T>>,
    timings: SessionTimings,
    hooks: Arc<dyn SessionHooks>,
}

impl<T> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timings: self.timings,
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<T> fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("tracked_proposals", &self.inner.proposals.len())
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

impl<T: PairingTransport> SessionManager<T> {
    /// Creates a manager with default timings and [`NoHooks`].
    #[must_use]
    pub fn new(transport: T, config: ConfigHandle) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                proposals: DashMap::new(),
                sessions: RwLock::new(Vec::new()),
            }),
            timings: SessionTimings::default(),
            hooks: Arc::new(NoHooks),
        }
    }

    /// Replaces the timings.
    #[must_use]
    pub const fn with_timings(mut self, timings: SessionTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Replaces the lifecycle hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The account configuration used for namespace negotiation.
    #[must_use]
    pub fn config(&self) -> &ConfigHandle {
        &self.inner.config
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// State of a proposal that is still undecided or being settled.
    #[must_use]
    pub fn proposal_state(&self, id: ProposalId) -> Option<ProposalState> {
        self.inner.proposals.get(&id).map(|state| *state)
    }

    /// Number of proposals awaiting a decision or being settled.
    #[must_use]
    pub fn tracked_proposals(&self) -> usize {
        self.inner.proposals.len()
    }

    /// Starts pairing with the peer behind a `wc:` URI.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidPairingUri`] for a non-`wc:` URI, or the
    /// transport's failure.
    #[tracing::instrument(skip_all, err)]
    pub async fn pair(&self, uri: &str) -> Result<(), SessionError> {
        let uri: PairingUri = uri.parse()?;
        self.inner.transport.pair(&uri).await?;
        tracing::info!("Pairing started");
        Ok(())
    }

    fn find_pending(&self, id: ProposalId) -> Option<Proposal> {
        self.inner
            .transport
            .pending_proposals()
            .into_iter()
            .find(|p| p.id == id)
    }

    /// Marks a proposal as settling, refusing one already in flight.
    /// Returns whether the proposal was tracked before the claim.
    fn claim(&self, id: ProposalId) -> Result<bool, SessionError> {
        match self.inner.proposals.entry(id) {
            Entry::Occupied(mut entry) => match *entry.get() {
                ProposalState::Proposed => {
                    entry.insert(ProposalState::Settling);
                    Ok(true)
                }
                ProposalState::Settling => Err(SessionError::ProposalSettled { id }),
            },
            Entry::Vacant(entry) => {
                entry.insert(ProposalState::Settling);
                Ok(false)
            }
        }
    }

    /// Undoes a failed claim: a tracked proposal becomes decidable again,
    /// an untracked one is dropped.
    fn release(&self, id: ProposalId, tracked: bool) {
        if tracked {
            if let Some(mut state) = self.inner.proposals.get_mut(&id) {
                *state = ProposalState::Proposed;
            }
        } else {
            self.forget(id, ProposalState::Settling);
        }
    }

    /// Stops tracking `id` if it is still in `state`.
    fn forget(&self, id: ProposalId, state: ProposalState) {
        self.inner.proposals.remove_if(&id, |_, current| *current == state);
    }

    /// Approves a proposal once, with namespaces negotiated against the
    /// current configuration.
    ///
    /// The proposal must still be pending on the transport; it is looked up
    /// again after [`SessionTimings::pending_recheck_delay`] before giving up.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ProposalSettled`] if an approval or rejection is in flight
    /// - [`SessionError::ProposalNotPending`] if the transport no longer lists it
    /// - [`SessionError::Transport`] if the approval call fails
    #[tracing::instrument(skip_all, fields(proposal_id = id), err)]
    pub async fn approve(&self, id: ProposalId) -> Result<Session, SessionError> {
        let tracked = self.claim(id)?;
        match self.approve_claimed(id).await {
            Ok(session) => {
                self.forget(id, ProposalState::Settling);
                tracing::info!(topic = %session.topic, peer = %session.peer.name, "Session approved");
                Ok(session)
            }
            Err(e) => {
                self.release(id, tracked);
                Err(e)
            }
        }
    }

    async fn approve_claimed(&self, id: ProposalId) -> Result<Session, SessionError> {
        let proposal = recheck(self.timings.pending_recheck_delay, || self.find_pending(id))
            .await
            .ok_or(SessionError::ProposalNotPending { id })?;
        let config = self.inner.config.load();
        let namespaces = negotiate(&proposal.required_namespaces, &config);
        let session = self.inner.transport.approve(id, namespaces).await?;
        self.refresh_sessions().await;
        Ok(session)
    }

    /// [`approve`](Self::approve), retried with backoff while the failure is
    /// transient. Dead-proposal failures return after the first attempt.
    ///
    /// # Errors
    ///
    /// The last approval error.
    pub async fn approve_with_retry(&self, id: ProposalId) -> Result<Session, SessionError> {
        retry(
            &self.timings.approval_retry,
            SessionError::is_retryable,
            |attempt| {
                tracing::debug!(proposal_id = id, attempt, "Approving proposal");
                self.approve(id)
            },
        )
        .await
    }

    /// Rejects a proposal with [`ErrorReason::USER_REJECTED`].
    ///
    /// # Errors
    ///
    /// [`SessionError::ProposalSettled`] if an approval or rejection is in
    /// flight, or the transport's failure.
    #[tracing::instrument(skip_all, fields(proposal_id = id), err)]
    pub async fn reject(&self, id: ProposalId) -> Result<(), SessionError> {
        let tracked = self.claim(id)?;
        match self
            .inner
            .transport
            .reject(id, ErrorReason::USER_REJECTED)
            .await
        {
            Ok(()) => {
                self.forget(id, ProposalState::Settling);
                tracing::info!("Session proposal rejected");
                Ok(())
            }
            Err(e) => {
                self.release(id, tracked);
                Err(e.into())
            }
        }
    }

    /// Ends a session with [`ErrorReason::USER_DISCONNECTED`] and refreshes
    /// the active-session cache.
    ///
    /// # Errors
    ///
    /// The transport's failure.
    #[tracing::instrument(skip(self), err)]
    pub async fn disconnect(&self, topic: &str) -> Result<(), SessionError> {
        self.inner
            .transport
            .disconnect(topic, ErrorReason::USER_DISCONNECTED)
            .await?;
        self.refresh_sessions().await;
        tracing::info!("Session disconnected");
        Ok(())
    }

    async fn refresh_sessions(&self) -> Vec<Session> {
        let now = UnixTimestamp::now();
        let live: Vec<Session> = self
            .inner
            .transport
            .active_sessions()
            .into_iter()
            .filter(|s| !s.is_expired_at(now))
            .collect();
        live.clone_into(&mut *self.inner.sessions.write().await);
        live
    }

    /// Unexpired sessions, freshly read from the transport.
    pub async fn active_sessions(&self) -> Vec<Session> {
        self.refresh_sessions().await
    }

    /// Sessions as of the last refresh.
    pub async fn cached_sessions(&self) -> Vec<Session> {
        self.inner.sessions.read().await.clone()
    }

    /// Whether `topic` names an unexpired session.
    pub async fn is_active(&self, topic: &str) -> bool {
        self.active_sessions().await.iter().any(|s| s.topic == topic)
    }

    /// Sends a response for a peer request.
    ///
    /// # Errors
    ///
    /// The transport's failure.
    pub async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), SessionError> {
        self.inner
            .transport
            .respond(topic, response)
            .await
            .map_err(Into::into)
    }

    /// Applies a transport event. Returns peer requests for the router.
    ///
    /// Proposals are decided on a spawned task after
    /// [`SessionTimings::proposal_settle_delay`], never inline.
    pub async fn handle_event(&self, event: TransportEvent) -> Option<SessionRequest> {
        match event {
            TransportEvent::Proposal(proposal) => {
                self.track(proposal);
                None
            }
            TransportEvent::Request(request) => Some(request),
            TransportEvent::SessionDelete { topic, .. } => {
                tracing::info!(topic = %topic, "Session deleted by peer");
                self.refresh_sessions().await;
                self.hooks.on_session_delete(&topic).await;
                None
            }
            TransportEvent::ProposalExpire { id } => {
                self.inner.proposals.remove(&id);
                tracing::info!(proposal_id = id, "Session proposal expired");
                self.hooks.on_proposal_expire(id).await;
                None
            }
        }
    }

    fn track(&self, proposal: Proposal) {
        self.inner
            .proposals
            .entry(proposal.id)
            .or_insert(ProposalState::Proposed);
        tracing::info!(
            proposal_id = proposal.id,
            peer = %proposal.proposer.name,
            "Session proposal received"
        );
        let manager = self.clone();
        tokio::spawn(async move { manager.decide(proposal).await });
    }

    async fn decide(&self, proposal: Proposal) {
        tokio::time::sleep(self.timings.proposal_settle_delay).await;
        let id = proposal.id;
        if self.proposal_state(id) != Some(ProposalState::Proposed) {
            tracing::debug!(proposal_id = id, "Proposal no longer awaiting a decision");
            return;
        }
        match self.hooks.on_proposal(&proposal).await {
            ProposalDecision::Approve => {
                let result = self.approve_with_retry(id).await;
                if let Err(e) = &result {
                    tracing::error!(proposal_id = id, error = %e, "Session approval failed");
                    self.forget(id, ProposalState::Proposed);
                }
                self.hooks.on_approval_result(id, result.as_ref()).await;
            }
            ProposalDecision::Reject => {
                if let Err(e) = self.reject(id).await {
                    tracing::error!(proposal_id = id, error = %e, "Session rejection failed");
                    self.forget(id, ProposalState::Proposed);
                }
            }
            ProposalDecision::Defer => {
                tracing::debug!(proposal_id = id, "Proposal left pending");
            }
        }
    }
}

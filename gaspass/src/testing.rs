//! In-memory doubles for the pairing transport, chain query, and executor.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::B256;
use serde_json::Value;

use crate::jsonrpc::JsonRpcResponse;
use crate::namespace::{ProposedNamespaces, SettledNamespaces};
use crate::router::{ChainQuery, TransactionResult, TransferExecutor, TransferRequest};
use crate::session::{
    ErrorReason, PairingTransport, PairingUri, PeerMetadata, Proposal, ProposalId, Session,
    TransportError,
};
use crate::timestamp::UnixTimestamp;

pub(crate) fn proposal(id: ProposalId, required: ProposedNamespaces) -> Proposal {
    Proposal {
        id,
        proposer: PeerMetadata {
            name: "Test Dapp".to_owned(),
            ..PeerMetadata::default()
        },
        required_namespaces: required,
        expiry: UnixTimestamp::from_secs(u64::MAX),
    }
}

pub(crate) fn session(topic: &str, expiry: u64) -> Session {
    Session {
        topic: topic.to_owned(),
        namespaces: BTreeMap::new(),
        peer: PeerMetadata::default(),
        expiry: UnixTimestamp::from_secs(expiry),
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub pending: Vec<Proposal>,
    pub late_pending: Option<Proposal>,
    pub pending_lookups: usize,
    pub sessions: Vec<Session>,
    pub approve_failures: VecDeque<String>,
    pub approve_calls: Vec<(ProposalId, SettledNamespaces)>,
    pub rejected: Vec<(ProposalId, ErrorReason)>,
    pub disconnected: Vec<(String, ErrorReason)>,
    pub responses: Vec<(String, JsonRpcResponse)>,
    pub paired: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn add_pending(&self, proposal: Proposal) {
        self.state().pending.push(proposal);
    }

    /// Listed only from the second pending lookup on.
    pub(crate) fn add_late_pending(&self, proposal: Proposal) {
        self.state().late_pending = Some(proposal);
    }

    pub(crate) fn add_session(&self, session: Session) {
        self.state().sessions.push(session);
    }

    pub(crate) fn fail_next_approvals<const N: usize>(&self, messages: [&str; N]) {
        self.state()
            .approve_failures
            .extend(messages.iter().map(|m| (*m).to_owned()));
    }
}

impl PairingTransport for FakeTransport {
    async fn pair(&self, uri: &PairingUri) -> Result<(), TransportError> {
        self.state().paired.push(uri.to_string());
        Ok(())
    }

    async fn approve(
        &self,
        id: ProposalId,
        namespaces: SettledNamespaces,
    ) -> Result<Session, TransportError> {
        let mut state = self.state();
        state.approve_calls.push((id, namespaces.clone()));
        if let Some(message) = state.approve_failures.pop_front() {
            return Err(TransportError::new(message));
        }
        state.pending.retain(|p| p.id != id);
        let session = Session {
            namespaces,
            ..session(&format!("topic-{id}"), u64::MAX)
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn reject(&self, id: ProposalId, reason: ErrorReason) -> Result<(), TransportError> {
        let mut state = self.state();
        state.pending.retain(|p| p.id != id);
        state.rejected.push((id, reason));
        Ok(())
    }

    async fn disconnect(&self, topic: &str, reason: ErrorReason) -> Result<(), TransportError> {
        let mut state = self.state();
        state.sessions.retain(|s| s.topic != topic);
        state.disconnected.push((topic.to_owned(), reason));
        Ok(())
    }

    async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), TransportError> {
        self.state().responses.push((topic.to_owned(), response));
        Ok(())
    }

    fn active_sessions(&self) -> Vec<Session> {
        self.state().sessions.clone()
    }

    fn pending_proposals(&self) -> Vec<Proposal> {
        let mut state = self.state();
        state.pending_lookups += 1;
        if state.pending_lookups > 1 {
            if let Some(late) = state.late_pending.take() {
                state.pending.push(late);
            }
        }
        state.pending.clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct FakeError(pub String);

/// Echoes a canned result and records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeQuery {
    pub result: Option<Value>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl ChainQuery for FakeQuery {
    type Error = FakeError;

    async fn call(&self, method: &str, params: &Value) -> Result<Value, FakeError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_owned(), params.clone()));
        self.result
            .clone()
            .ok_or_else(|| FakeError("upstream unavailable".to_owned()))
    }
}

/// Succeeds with fixed hashes unless `failure` is set.
#[derive(Debug, Default)]
pub(crate) struct FakeExecutor {
    pub failure: Option<String>,
    pub calls: Mutex<Vec<TransferRequest>>,
}

impl FakeExecutor {
    pub(crate) const USER_OP_HASH: B256 = B256::repeat_byte(0x11);
    pub(crate) const TX_HASH: B256 = B256::repeat_byte(0x22);
}

impl TransferExecutor for FakeExecutor {
    type Error = FakeError;

    async fn execute(&self, transfer: TransferRequest) -> Result<TransactionResult, FakeError> {
        self.calls.lock().unwrap().push(transfer);
        match &self.failure {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(TransactionResult {
                user_operation_hash: Self::USER_OP_HASH,
                transaction_hash: Self::TX_HASH,
            }),
        }
    }
}

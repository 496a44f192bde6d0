//! The pairing transport boundary.
//!
//! [`PairingTransport`] is implemented by the relay client that carries
//! proposals, sessions, and requests between the wallet and its peers. The
//! wallet reacts to [`TransportEvent`]s and answers through the trait.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionError;
use crate::jsonrpc::JsonRpcResponse;
use crate::namespace::{ProposedNamespaces, SettledNamespaces};
use crate::timestamp::UnixTimestamp;

/// Identifier of a session proposal.
pub type ProposalId = u64;

/// Descriptive metadata a peer publishes about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMetadata {
    /// Application name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Origin URL.
    #[serde(default)]
    pub url: String,
    /// Icon URLs.
    #[serde(default)]
    pub icons: Vec<String>,
}

/// A peer's request to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Proposal identifier.
    pub id: ProposalId,
    /// The proposing peer.
    pub proposer: PeerMetadata,
    /// Namespaces the peer requires; empty means "use defaults".
    #[serde(default)]
    pub required_namespaces: ProposedNamespaces,
    /// When the proposal lapses.
    pub expiry: UnixTimestamp,
}

/// An approved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque session topic.
    pub topic: String,
    /// Granted namespaces.
    pub namespaces: SettledNamespaces,
    /// The connected peer.
    pub peer: PeerMetadata,
    /// When the session lapses.
    pub expiry: UnixTimestamp,
}

impl Session {
    /// Whether the session has lapsed at `now`.
    #[must_use]
    pub const fn is_expired_at(&self, now: UnixTimestamp) -> bool {
        self.expiry.has_passed(now)
    }
}

/// A JSON-RPC request a peer sent over a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Request identifier, echoed in the response.
    pub id: u64,
    /// Session the request arrived on.
    pub topic: String,
    /// CAIP-2 chain the peer targets.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// Events emitted by the pairing transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A peer proposed a session.
    Proposal(Proposal),
    /// A peer sent a request over a session.
    Request(SessionRequest),
    /// A session was deleted by the peer.
    SessionDelete {
        /// Event identifier.
        id: u64,
        /// Topic of the deleted session.
        topic: String,
    },
    /// A pending proposal lapsed.
    ProposalExpire {
        /// The lapsed proposal.
        id: ProposalId,
    },
}

/// Reason code sent with a rejection or disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorReason {
    /// Protocol reason code.
    pub code: i64,
    /// Human-readable reason.
    pub message: &'static str,
}

impl ErrorReason {
    /// Sent when the wallet declines a proposal.
    pub const USER_REJECTED: Self = Self {
        code: 5000,
        message: "User rejected",
    };
    /// Sent when the wallet ends a session.
    pub const USER_DISCONNECTED: Self = Self {
        code: 6000,
        message: "User disconnected",
    };
}

/// A failure reported by the pairing transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// The transport's own description of the failure.
    pub message: String,
}

impl TransportError {
    /// Wraps a transport message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A validated `wc:` pairing URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairingUri(String);

impl PairingUri {
    /// The URI text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PairingUri {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() > 3 && trimmed.starts_with("wc:") {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(SessionError::InvalidPairingUri)
        }
    }
}

impl fmt::Display for PairingUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client side of the pairing relay.
///
/// The listing methods read the transport's local view, which is updated
/// asynchronously: a proposal event can be delivered before the proposal is
/// listed as pending.
pub trait PairingTransport: Send + Sync + 'static {
    /// Starts pairing with the peer behind `uri`.
    fn pair(&self, uri: &PairingUri) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Approves a pending proposal with the given namespaces.
    fn approve(
        &self,
        id: ProposalId,
        namespaces: SettledNamespaces,
    ) -> impl Future<Output = Result<Session, TransportError>> + Send;

    /// Rejects a pending proposal.
    fn reject(
        &self,
        id: ProposalId,
        reason: ErrorReason,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Ends a session from the wallet side.
    fn disconnect(
        &self,
        topic: &str,
        reason: ErrorReason,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Answers a peer request.
    fn respond(
        &self,
        topic: &str,
        response: JsonRpcResponse,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sessions the transport currently considers open.
    fn active_sessions(&self) -> Vec<Session>;

    /// Proposals not yet approved, rejected, or expired.
    fn pending_proposals(&self) -> Vec<Proposal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_uri_requires_wc_prefix() {
        let uri: PairingUri = " wc:abc@2?relay-protocol=irn&symKey=00 ".parse().unwrap();
        assert!(uri.as_str().starts_with("wc:abc@2"));
        assert!(matches!(
            "https://example.com".parse::<PairingUri>(),
            Err(SessionError::InvalidPairingUri)
        ));
        assert!("wc:".parse::<PairingUri>().is_err());
    }

    #[test]
    fn test_session_request_deserializes() {
        let request: SessionRequest = serde_json::from_value(serde_json::json!({
            "id": 1_700_000_000_123_u64,
            "topic": "t1",
            "chainId": "eip155:1",
            "method": "eth_chainId",
            "params": []
        }))
        .unwrap();
        assert_eq!(request.topic, "t1");
        assert_eq!(request.chain_id.as_deref(), Some("eip155:1"));
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(ErrorReason::USER_REJECTED.code, 5000);
        assert_eq!(ErrorReason::USER_DISCONNECTED.message, "User disconnected");
    }
}

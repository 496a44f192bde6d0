//! The wallet event loop.
//!
//! [`Wallet`] feeds transport events to the [`SessionManager`] and hands
//! each peer request to the [`RequestRouter`] on its own task, so a transfer
//! waiting for its receipt never delays other requests.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::lifecycle::SessionManager;
use crate::router::{ChainQuery, RequestRouter, RouteOutcome, TransferExecutor};
use crate::session::{PairingTransport, SessionRequest, TransportEvent};

/// Sessions plus request routing.
pub struct Wallet<T, Q, X> {
    sessions: SessionManager<T>,
    router: Arc<RequestRouter<Q, X>>,
}

impl<T, Q, X> Clone for Wallet<T, Q, X> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            router: Arc::clone(&self.router),
        }
    }
}

impl<T, Q: std::fmt::Debug, X: std::fmt::Debug> std::fmt::Debug for Wallet<T, Q, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("sessions", &self.sessions)
            .field("router", &self.router)
            .finish()
    }
}

impl<T, Q, X> Wallet<T, Q, X>
where
    T: PairingTransport,
    Q: ChainQuery,
    X: TransferExecutor,
{
    /// Creates a wallet.
    #[must_use]
    pub fn new(sessions: SessionManager<T>, router: RequestRouter<Q, X>) -> Self {
        Self {
            sessions,
            router: Arc::new(router),
        }
    }

    /// The session manager.
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager<T> {
        &self.sessions
    }

    /// The request router.
    #[must_use]
    pub fn router(&self) -> &RequestRouter<Q, X> {
        &self.router
    }

    /// Routes one request against the current active sessions and sends the
    /// response, if any.
    ///
    /// # Errors
    ///
    /// The transport's failure to deliver the response.
    pub async fn handle_request(&self, request: SessionRequest) -> Result<(), SessionError> {
        let active = self.sessions.active_sessions().await;
        match self.router.route(&request, &active).await {
            RouteOutcome::Dropped => Ok(()),
            RouteOutcome::Respond(response) => {
                if let Some(error) = &response.error {
                    tracing::debug!(request_id = request.id, %error, "Answering with error");
                }
                self.sessions.respond(&request.topic, response).await
            }
        }
    }

    /// Applies one transport event. Peer requests are handled on a spawned
    /// task whose handle is returned.
    pub async fn dispatch_event(&self, event: TransportEvent) -> Option<JoinHandle<()>> {
        let request = self.sessions.handle_event(event).await?;
        let wallet = self.clone();
        Some(tokio::spawn(async move {
            let topic = request.topic.clone();
            let id = request.id;
            if let Err(e) = wallet.handle_request(request).await {
                tracing::error!(topic = %topic, request_id = id, error = %e, "Failed to send response");
            }
        }))
    }

    /// Processes events until the sender side closes.
    pub async fn run(self, mut events: mpsc::Receiver<TransportEvent>) {
        tracing::info!("Wallet event loop started");
        while let Some(event) = events.recv().await {
            drop(self.dispatch_event(event).await);
        }
        tracing::info!("Transport event stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigHandle;
    use crate::jsonrpc::JsonRpcError;
    use crate::testing::{FakeExecutor, FakeQuery, FakeTransport, session};
    use serde_json::json;

    fn wallet() -> Wallet<FakeTransport, FakeQuery, FakeExecutor> {
        let sessions = SessionManager::new(FakeTransport::default(), ConfigHandle::default());
        let router = RequestRouter::new(
            FakeQuery {
                result: Some(json!("0x14a34")),
                ..FakeQuery::default()
            },
            FakeExecutor::default(),
        );
        Wallet::new(sessions, router)
    }

    fn request(topic: &str, method: &str) -> SessionRequest {
        SessionRequest {
            id: 9,
            topic: topic.to_owned(),
            chain_id: None,
            method: method.to_owned(),
            params: json!([]),
        }
    }

    #[tokio::test]
    async fn test_request_on_active_session_gets_one_response() {
        let wallet = wallet();
        wallet.sessions().transport().add_session(session("live", u64::MAX));

        let handle = wallet
            .dispatch_event(TransportEvent::Request(request("live", "eth_chainId")))
            .await
            .unwrap();
        handle.await.unwrap();

        let state = wallet.sessions().transport().state();
        assert_eq!(state.responses.len(), 1);
        assert_eq!(state.responses[0].0, "live");
        assert_eq!(state.responses[0].1.result, Some(json!("0x14a34")));
    }

    #[tokio::test]
    async fn test_request_on_unknown_session_gets_no_response() {
        let wallet = wallet();
        wallet.sessions().transport().add_session(session("live", u64::MAX));

        wallet.handle_request(request("stale", "eth_chainId")).await.unwrap();

        assert!(wallet.sessions().transport().state().responses.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_method_still_answered() {
        let wallet = wallet();
        wallet.sessions().transport().add_session(session("live", u64::MAX));

        wallet.handle_request(request("live", "eth_sign")).await.unwrap();

        let state = wallet.sessions().transport().state();
        let error = state.responses[0].1.error.clone().unwrap();
        assert_eq!(error.code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_drains_events() {
        let wallet = wallet();
        wallet.sessions().transport().add_session(session("live", u64::MAX));
        let (tx, rx) = mpsc::channel(4);
        tx.send(TransportEvent::SessionDelete {
            id: 1,
            topic: "other".to_owned(),
        })
        .await
        .unwrap();
        drop(tx);

        wallet.clone().run(rx).await;
        assert_eq!(wallet.sessions().cached_sessions().await.len(), 1);
    }
}

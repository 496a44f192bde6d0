//! Gasless submission of single-call transfers.
//!
//! [`OperationSubmitter`] turns a [`TransferRequest`] into a user operation
//! sponsored by the Circle paymaster, submits it, and waits for the bundle
//! transaction. The chain and network type come from the live
//! [`ConfigHandle`] at the start of every submission, so reconfiguration
//! takes effect on the next request. The smart account handle is kept
//! until the chain or network type changes.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use gaspass::chain::ChainId;
use gaspass::config::ConfigHandle;
use gaspass::router::{TransactionResult, TransferExecutor, TransferRequest};
use tokio::sync::Mutex;
use url::Url;

use crate::account::{ProvisioningError, SmartAccountHandle, SmartAccountProvisioner};
use crate::bundler::{Bundler, BundlerError, HttpBundler, ReceiptPolling, wait_for_receipt};
use crate::networks::{self, SponsorDeployment};
use crate::permit::{DEFAULT_PERMIT_AMOUNT, PaymasterFields, PermitMessage, pack_paymaster_data};
use crate::reader::{AlloyChainReader, ChainReader, ReadError};
use crate::signature::SignatureFormatError;
use crate::signer::{OwnerSigner, SignerError};
use crate::user_operation::{DUMMY_SIGNATURE, UserOperation};

/// Fixed max fee per gas: 20 gwei.
pub const MAX_FEE_PER_GAS: u64 = 20_000_000_000;

/// Fixed max priority fee per gas: 1 gwei.
pub const MAX_PRIORITY_FEE_PER_GAS: u64 = 1_000_000_000;

/// Fee-token balance considered enough to pay for gas: 1 USDC.
pub const MIN_FEE_TOKEN_BALANCE: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// A sponsored submission failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No smart account could be provisioned for the configured chain.
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
    /// Chain or bundler endpoint URL is invalid.
    #[error("invalid endpoint for chain {chain_id}: {source}")]
    Endpoint {
        /// Configured chain.
        chain_id: ChainId,
        /// Parse error.
        #[source]
        source: url::ParseError,
    },
    /// A chain read failed.
    #[error("chain read failed: {0}")]
    ChainRead(#[from] ReadError),
    /// The signer refused or failed to sign the permit.
    #[error("permit signing failed: {0}")]
    PermitSigningFailed(#[source] SignerError),
    /// The permit signature carried a malformed envelope.
    #[error("permit signature unusable: {0}")]
    PermitSignatureFormat(#[from] SignatureFormatError),
    /// The signer refused or failed to sign the user operation.
    #[error("user operation signing failed: {0}")]
    OperationSigningFailed(#[source] SignerError),
    /// The bundler refused the operation, typically on paymaster validation.
    #[error("paymaster rejected the operation: {message}")]
    PaymasterRejected {
        /// Bundler method.
        method: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// Bundler-provided reason.
        message: String,
    },
    /// The bundler did not report a receipt in time.
    #[error("no receipt for user operation {hash} after {attempts} attempts")]
    ReceiptTimeout {
        /// Operation hash.
        hash: B256,
        /// Polls made.
        attempts: u32,
    },
    /// The bundler could not be reached.
    #[error(transparent)]
    Bundler(BundlerError),
}

impl From<BundlerError> for SubmitError {
    fn from(e: BundlerError) -> Self {
        match e {
            BundlerError::Rpc {
                method,
                code,
                message,
            } => Self::PaymasterRejected {
                method,
                code,
                message,
            },
            BundlerError::ReceiptTimeout { hash, attempts } => {
                Self::ReceiptTimeout { hash, attempts }
            }
            e @ BundlerError::Transport { .. } => Self::Bundler(e),
        }
    }
}

/// Chain-bound clients for one submission.
#[derive(Debug, Clone)]
pub struct ChainClients {
    /// Public chain reads.
    pub reader: Arc<dyn ChainReader>,
    /// Bundler for the same chain.
    pub bundler: Arc<dyn Bundler>,
}

/// Opens chain clients for a chain id.
pub trait ChainConnector: Send + Sync + fmt::Debug + 'static {
    /// Clients for `chain_id`.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Endpoint`] when an endpoint URL is invalid.
    fn connect(&self, chain_id: ChainId) -> Result<ChainClients, SubmitError>;
}

/// Connects over HTTP: public RPC from the network table (or an override),
/// bundler from a URL template.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    bundler_url: String,
    rpc_url: Option<Url>,
}

impl HttpConnector {
    /// `bundler_url` may contain a `{chain_id}` placeholder.
    #[must_use]
    pub fn new(bundler_url: impl Into<String>) -> Self {
        Self {
            bundler_url: bundler_url.into(),
            rpc_url: None,
        }
    }

    /// Uses `url` for chain reads instead of the table's public endpoint.
    #[must_use]
    pub fn with_rpc_url(mut self, url: Url) -> Self {
        self.rpc_url = Some(url);
        self
    }
}

impl ChainConnector for HttpConnector {
    fn connect(&self, chain_id: ChainId) -> Result<ChainClients, SubmitError> {
        let endpoint = |source| SubmitError::Endpoint { chain_id, source };
        let rpc_url = match &self.rpc_url {
            Some(url) => url.clone(),
            None => networks::rpc_url(chain_id).parse().map_err(endpoint)?,
        };
        let bundler_url: Url = networks::bundler_url(&self.bundler_url, chain_id)
            .parse()
            .map_err(endpoint)?;
        Ok(ChainClients {
            reader: Arc::new(AlloyChainReader::new(rpc_url)),
            bundler: Arc::new(HttpBundler::new(bundler_url)),
        })
    }
}

/// Tunables of the submission pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitterSettings {
    /// Fee-token amount each permit authorizes.
    pub permit_amount: U256,
    /// Receipt polling.
    pub polling: ReceiptPolling,
}

impl Default for SubmitterSettings {
    fn default() -> Self {
        Self {
            permit_amount: DEFAULT_PERMIT_AMOUNT,
            polling: ReceiptPolling::default(),
        }
    }
}

/// Fee-token holdings of the smart account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTokenBalance {
    /// Smart account.
    pub account: Address,
    /// Fee token.
    pub token: Address,
    /// Balance in base units.
    pub balance: U256,
    /// Whether `balance` covers [`MIN_FEE_TOKEN_BALANCE`].
    pub has_enough: bool,
}

/// Submits paymaster-sponsored user operations for the configured chain.
pub struct OperationSubmitter<S> {
    config: ConfigHandle,
    signer: S,
    connector: Arc<dyn ChainConnector>,
    provisioner: SmartAccountProvisioner,
    settings: SubmitterSettings,
    account: Mutex<Option<Arc<SmartAccountHandle<S>>>>,
}

impl<S> fmt::Debug for OperationSubmitter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSubmitter")
            .field("config", &self.config)
            .field("connector", &self.connector)
            .field("provisioner", &self.provisioner)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S: OwnerSigner + Clone + 'static> OperationSubmitter<S> {
    /// Creates a submitter with default settings and factory.
    #[must_use]
    pub fn new(config: ConfigHandle, signer: S, connector: Arc<dyn ChainConnector>) -> Self {
        Self {
            config,
            signer,
            connector,
            provisioner: SmartAccountProvisioner::default(),
            settings: SubmitterSettings::default(),
            account: Mutex::new(None),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: SubmitterSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the provisioner.
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: SmartAccountProvisioner) -> Self {
        self.provisioner = provisioner;
        self.account = Mutex::new(None);
        self
    }

    /// The configuration the submitter follows.
    #[must_use]
    pub const fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Clients for the configured chain and the account handle, provisioned
    /// again only when the chain or network type differs from the cached
    /// handle's.
    async fn open(&self) -> Result<(ChainClients, Arc<SmartAccountHandle<S>>), SubmitError> {
        let config = self.config.load();
        let clients = self.connector.connect(config.chain_id)?;

        let mut cached = self.account.lock().await;
        if let Some(account) = cached.as_ref() {
            if account.chain_id() == config.chain_id && account.is_testnet() == config.is_testnet {
                return Ok((clients, Arc::clone(account)));
            }
            tracing::debug!(
                from = account.chain_id(),
                to = config.chain_id,
                "Network changed, provisioning smart account again"
            );
        }
        *cached = None;
        let account = Arc::new(
            self.provisioner
                .provision(
                    self.signer.clone(),
                    clients.reader.as_ref(),
                    config.chain_id,
                    config.is_testnet,
                )
                .await?,
        );
        *cached = Some(Arc::clone(&account));
        Ok((clients, account))
    }

    /// Provisions the smart account for the configured chain and returns its
    /// address.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Provisioning`] or [`SubmitError::Endpoint`].
    pub async fn smart_account_address(&self) -> Result<Address, SubmitError> {
        let (_, account) = self.open().await?;
        Ok(account.address())
    }

    /// Reads the smart account's fee-token balance on the configured chain.
    ///
    /// # Errors
    ///
    /// Provisioning or chain read failure.
    pub async fn fee_token_balance(&self) -> Result<FeeTokenBalance, SubmitError> {
        let (clients, account) = self.open().await?;
        let sponsor = networks::sponsor_deployment(account.chain_id(), account.is_testnet());
        let balance = clients
            .reader
            .token_balance(sponsor.fee_token, account.address())
            .await?;
        Ok(FeeTokenBalance {
            account: account.address(),
            token: sponsor.fee_token,
            balance,
            has_enough: balance >= MIN_FEE_TOKEN_BALANCE,
        })
    }

    /// Signs a permit for the paymaster and packs the sponsor fields.
    async fn sponsor_fields(
        &self,
        reader: &dyn ChainReader,
        account: &SmartAccountHandle<S>,
        sponsor: SponsorDeployment,
        deployed: bool,
    ) -> Result<PaymasterFields, SubmitError> {
        let amount = self.settings.permit_amount;
        let permit = PermitMessage::build(
            reader,
            account.chain_id(),
            sponsor.fee_token,
            account.address(),
            sponsor.paymaster,
            amount,
        )
        .await?;
        let signature = account
            .sign_typed_data(&permit.typed_data(), deployed)
            .await
            .map_err(SubmitError::PermitSigningFailed)?;
        Ok(PaymasterFields {
            paymaster: sponsor.paymaster,
            data: pack_paymaster_data(sponsor.fee_token, amount, signature)?,
        })
    }

    /// Runs the full pipeline for one transfer.
    ///
    /// # Errors
    ///
    /// [`SubmitError`] on the first failing step; nothing is retried.
    #[tracing::instrument(skip_all, err, fields(to = %transfer.to, chain_id, user_op_hash))]
    pub async fn submit(&self, transfer: TransferRequest) -> Result<TransactionResult, SubmitError> {
        let (clients, account) = self.open().await?;
        let chain_id = account.chain_id();
        tracing::Span::current().record("chain_id", chain_id);
        let reader = clients.reader.as_ref();

        let sponsor = networks::sponsor_deployment(chain_id, account.is_testnet());
        let deployed = account.is_deployed(reader).await?;
        let sponsor_fields = self.sponsor_fields(reader, &account, sponsor, deployed).await?;

        let mut op = UserOperation {
            sender: account.address(),
            nonce: reader.account_nonce(account.address()).await?,
            call_data: account.encode_execute(transfer.to, transfer.value, transfer.data),
            max_fee_per_gas: U256::from(MAX_FEE_PER_GAS),
            max_priority_fee_per_gas: U256::from(MAX_PRIORITY_FEE_PER_GAS),
            signature: Bytes::from(DUMMY_SIGNATURE),
            ..UserOperation::default()
        };
        if !deployed {
            let (factory, factory_data) = account.deployment();
            tracing::info!(account = %account.address(), "Smart account not deployed, deploying with this operation");
            op.factory = Some(factory);
            op.factory_data = Some(factory_data);
        }
        sponsor_fields.apply(&mut op);

        let estimate = clients.bundler.estimate_user_operation_gas(&op).await?;
        op.apply_estimate(&estimate);
        op.signature = account
            .sign_user_operation(&op)
            .await
            .map_err(SubmitError::OperationSigningFailed)?;

        let hash = clients.bundler.send_user_operation(&op).await?;
        tracing::Span::current().record("user_op_hash", tracing::field::display(hash));
        tracing::info!("User operation submitted");

        let receipt = wait_for_receipt(clients.bundler.as_ref(), hash, self.settings.polling).await?;
        let tx_hash = receipt.receipt.transaction_hash;
        if receipt.success {
            tracing::info!(%tx_hash, "User operation mined");
        } else {
            tracing::warn!(
                %tx_hash,
                reason = receipt.reason.as_deref().unwrap_or("no reason given"),
                "User operation mined but its call reverted"
            );
        }
        Ok(TransactionResult {
            user_operation_hash: hash,
            transaction_hash: tx_hash,
        })
    }
}

impl<S: OwnerSigner + Clone + 'static> TransferExecutor for OperationSubmitter<S> {
    type Error = SubmitError;

    async fn execute(&self, transfer: TransferRequest) -> Result<TransactionResult, SubmitError> {
        self.submit(transfer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountFactory, VALIDATION_MODE_ROOT};
    use crate::networks::{BASE_SEPOLIA, CIRCLE_PAYMASTER, USDC_BASE_SEPOLIA, USDC_ETHEREUM};
    use crate::permit::PERMIT_MODE;
    use crate::rpc::{ChainRpcClient, RpcEndpoint};
    use crate::testing::{FakeBundler, FakeReader, TX_HASH, derived_address};
    use alloy_primitives::{Signature, eip191_hash_message, keccak256};
    use alloy_signer_local::PrivateKeySigner;
    use gaspass::RequestRouter;
    use gaspass::config::AccountConfig;
    use gaspass::session::SessionRequest;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct FakeConnector {
        reader: Arc<FakeReader>,
        bundler: Arc<FakeBundler>,
    }

    impl ChainConnector for FakeConnector {
        fn connect(&self, _chain_id: ChainId) -> Result<ChainClients, SubmitError> {
            Ok(ChainClients {
                reader: self.reader.clone(),
                bundler: self.bundler.clone(),
            })
        }
    }

    struct Fixture {
        signer: PrivateKeySigner,
        connector: Arc<FakeConnector>,
        submitter: OperationSubmitter<PrivateKeySigner>,
    }

    impl Fixture {
        fn new(config: AccountConfig) -> Self {
            let signer = PrivateKeySigner::random();
            let connector = Arc::new(FakeConnector::default());
            let config = ConfigHandle::new(config);
            let submitter = OperationSubmitter::new(config, signer.clone(), connector.clone())
                .with_settings(SubmitterSettings {
                    polling: ReceiptPolling {
                        interval: Duration::from_millis(10),
                        attempts: 3,
                    },
                    ..SubmitterSettings::default()
                });
            Self {
                signer,
                connector,
                submitter,
            }
        }

        fn base_sepolia() -> Self {
            Self::new(AccountConfig::default().with_chain_id(BASE_SEPOLIA).with_testnet(true))
        }

        fn account(&self) -> Address {
            let factory = AccountFactory::KERNEL_V3_1;
            derived_address(factory.address, &factory.initializer(self.signer.address()), factory.salt)
        }

        fn reads_of(&self, name: &str) -> usize {
            self.connector
                .reader
                .state()
                .reads
                .iter()
                .filter(|r| **r == name)
                .count()
        }
    }

    fn transfer() -> TransferRequest {
        TransferRequest {
            to: Address::repeat_byte(0xbb),
            value: U256::from(1_000),
            data: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn test_first_operation_deploys_and_is_sponsored() {
        let fixture = Fixture::base_sepolia();

        let result = fixture.submitter.submit(transfer()).await.unwrap();
        assert_eq!(result.transaction_hash, TX_HASH);

        let state = fixture.connector.bundler.state();
        let op = &state.sent[0];
        assert_eq!(op.sender, fixture.account());
        assert_eq!(op.factory, Some(AccountFactory::KERNEL_V3_1.deployer));
        assert_eq!(op.paymaster, Some(CIRCLE_PAYMASTER));
        assert_eq!(op.max_fee_per_gas, U256::from(MAX_FEE_PER_GAS));
        assert_eq!(op.call_gas_limit, U256::from(80_000));
        assert_eq!(op.paymaster_verification_gas_limit, Some(U256::from(200_000)));

        let paymaster_data = op.paymaster_data.clone().unwrap();
        assert_eq!(paymaster_data[0], PERMIT_MODE);
        assert_eq!(&paymaster_data[1..21], USDC_BASE_SEPOLIA.as_slice());
        // Envelope stripped: mode + token + amount + validation mode byte and
        // 65-byte owner signature.
        assert_eq!(paymaster_data.len(), 1 + 20 + 32 + 66);
        assert_eq!(paymaster_data[53], VALIDATION_MODE_ROOT);

        // Estimation ran with the placeholder signature.
        assert_eq!(state.estimated[0].signature.as_ref(), DUMMY_SIGNATURE.as_slice());
    }

    #[tokio::test]
    async fn test_operation_is_signed_by_owner_over_final_hash() {
        let fixture = Fixture::base_sepolia();
        fixture.submitter.submit(transfer()).await.unwrap();

        let op = fixture.connector.bundler.state().sent[0].clone();
        let digest = eip191_hash_message(op.hash(networks::ENTRY_POINT_V07, BASE_SEPOLIA));
        let recovered = Signature::from_raw(&op.signature)
            .unwrap()
            .recover_address_from_prehash(&digest)
            .unwrap();
        assert_eq!(recovered, fixture.signer.address());
    }

    #[tokio::test]
    async fn test_deployed_account_sends_no_factory() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.reader.deploy(fixture.account());

        fixture.submitter.submit(transfer()).await.unwrap();

        let op = fixture.connector.bundler.state().sent[0].clone();
        assert_eq!(op.factory, None);
        assert_eq!(op.factory_data, None);
    }

    #[tokio::test]
    async fn test_permit_nonce_is_read_per_submission() {
        let fixture = Fixture::base_sepolia();
        fixture.submitter.submit(transfer()).await.unwrap();
        fixture.submitter.submit(transfer()).await.unwrap();

        assert_eq!(fixture.reads_of("permit_nonce"), 2);
    }

    #[tokio::test]
    async fn test_account_is_provisioned_once_per_network() {
        let fixture = Fixture::base_sepolia();
        for _ in 0..3 {
            fixture.submitter.submit(transfer()).await.unwrap();
        }
        assert_eq!(fixture.reads_of("counterfactual_address"), 1);
        assert_eq!(fixture.connector.bundler.state().sent.len(), 3);

        fixture.submitter.config().set_network_type(false);
        fixture.submitter.config().set_chain_id(1);
        fixture.submitter.submit(transfer()).await.unwrap();
        assert_eq!(fixture.reads_of("counterfactual_address"), 2);

        // Same chain id, other network type.
        fixture.submitter.config().set_network_type(true);
        fixture.submitter.config().set_chain_id(BASE_SEPOLIA);
        fixture.submitter.submit(transfer()).await.unwrap();
        assert_eq!(fixture.reads_of("counterfactual_address"), 3);
    }

    #[tokio::test]
    async fn test_failed_provisioning_is_not_cached() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.reader.state().unreachable = true;
        assert!(matches!(
            fixture.submitter.submit(transfer()).await,
            Err(SubmitError::Provisioning(ProvisioningError::Unreachable { .. }))
        ));

        fixture.connector.reader.state().unreachable = false;
        fixture.submitter.submit(transfer()).await.unwrap();
        assert_eq!(fixture.reads_of("counterfactual_address"), 1);
    }

    #[tokio::test]
    async fn test_bundler_rejection_is_paymaster_rejected() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.bundler.state().reject_with = Some("AA33 reverted".to_owned());

        let err = fixture.submitter.submit(transfer()).await.unwrap_err();
        assert!(matches!(err, SubmitError::PaymasterRejected { ref message, .. } if message == "AA33 reverted"));
        assert!(err.to_string().contains("AA33 reverted"));
    }

    #[tokio::test]
    async fn test_receipt_timeout_is_surfaced() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.bundler.state().never_mined = true;

        let err = fixture.submitter.submit(transfer()).await.unwrap_err();
        assert!(matches!(err, SubmitError::ReceiptTimeout { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_reverted_operation_still_reports_hashes() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.bundler.state().reverted = true;

        let result = fixture.submitter.submit(transfer()).await.unwrap();
        assert_eq!(result.transaction_hash, TX_HASH);
        let sent = fixture.connector.bundler.state().sent[0].clone();
        assert_eq!(result.user_operation_hash, keccak256(sent.signature.as_ref()));
    }

    #[tokio::test]
    async fn test_router_answers_reverted_transfer_with_tx_hash() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.bundler.state().reverted = true;
        // Never contacted: value transfers bypass chain queries.
        let query = ChainRpcClient::new(RpcEndpoint::Fixed("http://127.0.0.1:9".parse().unwrap()));
        let router = RequestRouter::new(query, fixture.submitter);

        let response = router
            .dispatch(&SessionRequest {
                id: 7,
                topic: "t".to_owned(),
                chain_id: Some("eip155:84532".to_owned()),
                method: "eth_sendTransaction".to_owned(),
                params: json!([{ "to": Address::repeat_byte(0xbb), "value": "0x3e8" }]),
            })
            .await;

        assert_eq!(response.id, 7);
        assert!(response.error.is_none());
        assert_eq!(response.result, Some(json!(TX_HASH.to_string())));
    }

    #[tokio::test]
    async fn test_unsupported_chain_fails_before_reads() {
        let fixture = Fixture::new(AccountConfig::default().with_chain_id(999_999));

        let err = fixture.submitter.submit(transfer()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Provisioning(ProvisioningError::UnsupportedChain { .. })
        ));
        assert!(fixture.connector.reader.state().reads.is_empty());
    }

    #[tokio::test]
    async fn test_reconfiguration_applies_to_next_submission() {
        let fixture = Fixture::base_sepolia();
        fixture.submitter.config().set_network_type(false);
        fixture.submitter.config().set_chain_id(1);

        fixture.submitter.submit(transfer()).await.unwrap();
        let op = fixture.connector.bundler.state().sent[0].clone();
        assert_eq!(&op.paymaster_data.unwrap()[1..21], USDC_ETHEREUM.as_slice());
    }

    #[tokio::test]
    async fn test_fee_token_balance_threshold() {
        let fixture = Fixture::base_sepolia();
        fixture.connector.reader.state().balance = U256::from(999_999);
        let low = fixture.submitter.fee_token_balance().await.unwrap();
        assert!(!low.has_enough);
        assert_eq!(low.token, USDC_BASE_SEPOLIA);

        fixture.connector.reader.state().balance = MIN_FEE_TOKEN_BALANCE;
        assert!(fixture.submitter.fee_token_balance().await.unwrap().has_enough);
    }

    #[test]
    fn test_http_connector_fills_bundler_template() {
        let connector = HttpConnector::new("https://bundler.example/{chain_id}/rpc");
        assert!(connector.connect(BASE_SEPOLIA).is_ok());
        let bad = HttpConnector::new("not a url");
        assert!(matches!(bad.connect(BASE_SEPOLIA), Err(SubmitError::Endpoint { .. })));
    }
}

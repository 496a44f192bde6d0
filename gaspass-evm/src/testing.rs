//! In-memory chain reader and bundler.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_transport::TransportErrorKind;

use crate::bundler::{Bundler, BundlerError};
use crate::reader::{ChainReader, ReadError, TokenDomain};
use crate::user_operation::{GasEstimate, InclusionReceipt, UserOperation, UserOperationReceipt};

pub(crate) const TX_HASH: B256 = B256::repeat_byte(0x22);

/// Deterministic stand-in for a factory's CREATE2 derivation.
pub(crate) fn derived_address(factory: Address, init_data: &[u8], salt: B256) -> Address {
    let digest = keccak256([factory.as_slice(), init_data, salt.as_slice()].concat());
    Address::from_slice(&digest[12..])
}

#[derive(Debug, Default)]
pub(crate) struct ReaderState {
    pub unreachable: bool,
    pub code: HashMap<Address, Bytes>,
    pub account_nonce: U256,
    pub permit_nonce: U256,
    pub balance: U256,
    pub reads: Vec<&'static str>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeReader {
    state: Mutex<ReaderState>,
}

impl FakeReader {
    pub(crate) fn state(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn deploy(&self, address: Address) {
        self.state().code.insert(address, Bytes::from(vec![0x60, 0x80]));
    }

    fn read(&self, what: &'static str) -> Result<MutexGuard<'_, ReaderState>, ReadError> {
        let mut state = self.state();
        if state.unreachable {
            return Err(TransportErrorKind::custom_str("connection refused").into());
        }
        state.reads.push(what);
        Ok(state)
    }
}

#[async_trait::async_trait]
impl ChainReader for FakeReader {
    async fn code(&self, address: Address) -> Result<Bytes, ReadError> {
        Ok(self.read("code")?.code.get(&address).cloned().unwrap_or_default())
    }

    async fn counterfactual_address(
        &self,
        factory: Address,
        init_data: Bytes,
        salt: B256,
    ) -> Result<Address, ReadError> {
        self.read("counterfactual_address")?;
        Ok(derived_address(factory, &init_data, salt))
    }

    async fn account_nonce(&self, _sender: Address) -> Result<U256, ReadError> {
        Ok(self.read("account_nonce")?.account_nonce)
    }

    async fn token_domain(&self, _token: Address) -> Result<TokenDomain, ReadError> {
        self.read("token_domain")?;
        Ok(TokenDomain {
            name: "USDC".to_owned(),
            version: "2".to_owned(),
        })
    }

    async fn permit_nonce(&self, _token: Address, _owner: Address) -> Result<U256, ReadError> {
        Ok(self.read("permit_nonce")?.permit_nonce)
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, ReadError> {
        Ok(self.read("token_balance")?.balance)
    }
}

#[derive(Debug, Default)]
pub(crate) struct BundlerState {
    pub estimated: Vec<UserOperation>,
    pub sent: Vec<UserOperation>,
    pub reject_with: Option<String>,
    pub reverted: bool,
    pub never_mined: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FakeBundler {
    state: Mutex<BundlerState>,
}

impl FakeBundler {
    pub(crate) fn state(&self) -> MutexGuard<'_, BundlerState> {
        self.state.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Bundler for FakeBundler {
    async fn estimate_user_operation_gas(
        &self,
        op: &UserOperation,
    ) -> Result<GasEstimate, BundlerError> {
        self.state().estimated.push(op.clone());
        Ok(GasEstimate {
            pre_verification_gas: U256::from(50_000),
            verification_gas_limit: U256::from(300_000),
            call_gas_limit: U256::from(80_000),
            paymaster_verification_gas_limit: None,
            paymaster_post_op_gas_limit: None,
        })
    }

    async fn send_user_operation(&self, op: &UserOperation) -> Result<B256, BundlerError> {
        let mut state = self.state();
        if let Some(message) = &state.reject_with {
            return Err(BundlerError::Rpc {
                method: "eth_sendUserOperation",
                code: -32500,
                message: message.clone(),
            });
        }
        state.sent.push(op.clone());
        Ok(keccak256(op.signature.as_ref()))
    }

    async fn user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, BundlerError> {
        let state = self.state();
        if state.never_mined {
            return Ok(None);
        }
        Ok(Some(UserOperationReceipt {
            user_op_hash: hash,
            success: !state.reverted,
            reason: state.reverted.then(|| "execution reverted".to_owned()),
            receipt: InclusionReceipt {
                transaction_hash: TX_HASH,
            },
        }))
    }
}

//! RPC node access: submission, confirmation polling, balance queries
//!
//! `ChainClient` is the seam between the orchestrator and the network; the
//! production implementation wraps a single long-lived nonblocking RPC
//! client, tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::TransactionStatus;
use tracing::debug;

use crate::config::RpcConfig;
use crate::error::ChainError;
use crate::types::TxStatus;

/// Raw token-account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalance {
    /// Amount in the mint's smallest unit
    pub amount: u64,
    pub decimals: u8,
}

/// Node operations the swap pipeline depends on.
///
/// `poll_status` is a single round trip with no internal retry; any
/// re-polling policy belongs to the caller. Submission acceptance only
/// means the transaction entered the network's processing queue, never
/// that it will execute.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit a signed transaction, returning its signature on acceptance
    async fn submit(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError>;

    /// One status lookup at confirmed commitment
    async fn poll_status(&self, signature: &Signature) -> Result<TxStatus, ChainError>;

    /// SOL balance of `owner`, in lamports
    async fn sol_balance(&self, owner: &Pubkey) -> Result<u64, ChainError>;

    /// Balance of `owner`'s associated token account for `mint`
    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey)
        -> Result<TokenBalance, ChainError>;
}

/// Production `ChainClient` over a nonblocking RPC connection
pub struct RpcChainClient {
    rpc: RpcClient,
}

impl RpcChainClient {
    pub fn new(config: &RpcConfig) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
            CommitmentConfig::confirmed(),
        );
        Self { rpc }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn submit(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(CommitmentLevel::Finalized),
            ..Default::default()
        };
        let signature = self.rpc.send_transaction_with_config(tx, config).await?;
        debug!(%signature, "transaction submitted");
        Ok(signature)
    }

    async fn poll_status(&self, signature: &Signature) -> Result<TxStatus, ChainError> {
        let response = self.rpc.get_signature_statuses(&[*signature]).await?;
        let status = response.value.into_iter().next().flatten();
        Ok(classify_status(status))
    }

    async fn sol_balance(&self, owner: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.rpc.get_balance(owner).await?)
    }

    async fn token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<TokenBalance, ChainError> {
        let ata = spl_associated_token_account::get_associated_token_address(owner, mint);
        let balance = self.rpc.get_token_account_balance(&ata).await?;
        let amount = balance.amount.parse::<u64>().map_err(|e| {
            ChainError::InvalidAccountData(format!("token amount {:?}: {}", balance.amount, e))
        })?;
        Ok(TokenBalance {
            amount,
            decimals: balance.decimals,
        })
    }
}

/// Map one signature-status record onto the poll result the orchestrator
/// consumes. `None` means the node has not indexed the signature.
fn classify_status(status: Option<TransactionStatus>) -> TxStatus {
    match status {
        None => TxStatus::NotFound,
        Some(status) => {
            if !status.satisfies_commitment(CommitmentConfig::confirmed()) {
                return TxStatus::Pending;
            }
            match status.err {
                Some(err) => TxStatus::ConfirmedWithError(format!("{:?}", err)),
                None => TxStatus::Confirmed,
            }
        }
    }
}

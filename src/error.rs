//! Error taxonomy for the swap pipeline
//!
//! Each external collaborator gets its own error type; `SwapError` is the
//! per-attempt failure the retry orchestrator classifies. Retryability
//! drives the retry decision: a non-retryable error ends the loop early
//! instead of burning the remaining attempt budget.

use solana_sdk::signer::SignerError;
use thiserror::Error;

/// Errors from the routing service (quote and transaction build)
#[derive(Debug, Error)]
pub enum JupiterError {
    /// The router returned no viable route, typically insufficient liquidity
    #[error("no route for pair {0}")]
    NoRoute(String),

    /// Transport or HTTP-status failure talking to the router
    #[error("router request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("malformed router response: {0}")]
    MalformedResponse(String),

    /// The base64 transaction payload could not be decoded
    #[error("transaction payload decode failed: {0}")]
    Decode(String),
}

/// Errors from key loading and signing
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("keypair source unavailable: {0}")]
    Missing(String),

    #[error("invalid keypair: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),
}

/// Errors from the RPC node
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("invalid account data: {0}")]
    InvalidAccountData(String),
}

/// One attempt's failure, as classified by the retry orchestrator
#[derive(Debug, Error)]
pub enum SwapError {
    /// Quote or transaction build failed; a fresh attempt re-quotes
    #[error("build failed: {0}")]
    Build(#[from] JupiterError),

    /// Signing failed; recurs every attempt, so not worth retrying
    #[error("signing failed: {0}")]
    Sign(#[from] WalletError),

    /// The node rejected the submission or the transport failed
    #[error("submission failed: {0}")]
    Submission(ChainError),

    /// The network executed the transaction and recorded an error
    #[error("transaction executed with error: {0}")]
    ConfirmedWithError(String),

    /// No record of the transaction after the confirmation delay
    #[error("transaction not found after confirmation delay")]
    NotFound,

    /// Seen by the node but below confirmed commitment at poll time
    #[error("transaction still pending at poll time")]
    Pending,

    /// The status poll itself failed; confirmation state is unknown
    #[error("status check failed: {0}")]
    StatusUnavailable(ChainError),
}

impl SwapError {
    /// Whether a fresh build/sign/submit cycle might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Build(_) => true,
            Self::Submission(_) => true,
            Self::ConfirmedWithError(_) => true,
            Self::NotFound => true,
            Self::Pending => true,
            Self::StatusUnavailable(_) => true,

            // A missing or invalid key fails identically on every attempt
            Self::Sign(_) => false,
        }
    }

    /// Coarse failure category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Build(_) => "build",
            Self::Sign(_) => "sign",
            Self::Submission(_) => "submit",
            Self::ConfirmedWithError(_) => "execution",
            Self::NotFound => "confirmation",
            Self::Pending => "confirmation",
            Self::StatusUnavailable(_) => "status",
        }
    }
}

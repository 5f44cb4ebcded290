//! Wallet management module

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};

use crate::error::WalletError;

/// Holds the single long-lived signing key.
///
/// The keypair is read-only after construction; signing never mutates it,
/// so a shared reference is safe across concurrent swap operations.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Load a keypair file in either raw 64-byte or JSON array format
    pub fn from_file(path: &str) -> Result<Self, WalletError> {
        let bytes = std::fs::read(path)
            .map_err(|e| WalletError::Missing(format!("failed to read {}: {}", path, e)))?;

        if bytes.len() == 64 {
            Self::from_bytes(&bytes)
        } else {
            let json: Vec<u8> = serde_json::from_slice(&bytes)
                .map_err(|e| WalletError::InvalidKey(format!("keypair JSON: {}", e)))?;
            Self::from_bytes(&json)
        }
    }

    /// Load a keypair from a base64-encoded 64-byte secret
    pub fn from_base64(encoded: &str) -> Result<Self, WalletError> {
        let raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| WalletError::InvalidKey(format!("base64: {}", e)))?;
        Self::from_bytes(&raw)
    }

    /// Load a base64-encoded keypair from an environment variable
    pub fn from_env(var: &str) -> Result<Self, WalletError> {
        let encoded = std::env::var(var)
            .map_err(|_| WalletError::Missing(format!("environment variable {} not set", var)))?;
        Self::from_base64(&encoded)
    }

    fn from_bytes(raw: &[u8]) -> Result<Self, WalletError> {
        if raw.len() != 64 {
            return Err(WalletError::InvalidKey(format!(
                "expected 64 bytes, got {}",
                raw.len()
            )));
        }
        if raw.iter().all(|&b| b == 0) {
            return Err(WalletError::InvalidKey("all-zero key rejected".to_string()));
        }
        let keypair =
            Keypair::try_from(raw).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        Ok(Self { keypair })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Sign an unsigned transaction produced by the routing service.
    ///
    /// The wallet must be a required signer of the message, which the
    /// router guarantees by building the transaction for our public key.
    pub fn sign_transaction(
        &self,
        tx: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        Ok(VersionedTransaction::try_new(tx.message, &[&self.keypair])?)
    }
}

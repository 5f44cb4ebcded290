//! Common types shared across the swap pipeline

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Wrapped SOL mint, the native side of every trading pair
pub const SOL_MINT: Pubkey = spl_token::native_mint::ID;

/// Convert a SOL amount to lamports, truncating sub-lamport dust
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

/// Priority level hint forwarded to the routing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityLevel {
    Medium,
    High,
    VeryHigh,
}

impl Default for PriorityLevel {
    fn default() -> Self {
        Self::VeryHigh
    }
}

/// A single swap order.
///
/// Immutable once constructed; every retry re-quotes and re-builds from the
/// same request, so price movement between attempts is absorbed by the
/// fresh quote rather than by mutating the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,

    /// Amount of `input_mint` to swap, in its smallest unit
    pub amount: u64,

    /// Maximum tolerated slippage in basis points
    pub max_slippage_bps: u16,

    /// Cap on the priority fee, in lamports
    pub max_priority_fee_lamports: u64,

    pub priority_level: PriorityLevel,
}

/// Result of a single confirmation poll against the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// The node has no record of the signature yet
    NotFound,

    /// Seen by the node but not yet at confirmed commitment
    Pending,

    /// Executed and confirmed without error
    Confirmed,

    /// Executed, but the runtime recorded an error (e.g. slippage exceeded)
    ConfirmedWithError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sol_mint_is_wrapped_sol() {
        assert_eq!(
            SOL_MINT.to_string(),
            "So11111111111111111111111111111111111111112"
        );
    }

    #[test]
    fn test_sol_to_lamports() {
        assert_eq!(sol_to_lamports(1.0), LAMPORTS_PER_SOL);
        assert_eq!(sol_to_lamports(0.1), 100_000_000);
        assert_eq!(sol_to_lamports(0.002), 2_000_000);
        assert_eq!(sol_to_lamports(0.0), 0);
    }

    #[test]
    fn test_priority_level_wire_format() {
        assert_eq!(
            serde_json::to_string(&PriorityLevel::VeryHigh).unwrap(),
            "\"veryHigh\""
        );
        assert_eq!(
            serde_json::to_string(&PriorityLevel::Medium).unwrap(),
            "\"medium\""
        );
        assert_eq!(PriorityLevel::default(), PriorityLevel::VeryHigh);
    }
}

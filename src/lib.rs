//! Swap an SPL token against SOL through the Jupiter router, then poll the
//! node for settlement with a bounded retry loop.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod jupiter;
pub mod trader;
pub mod types;
pub mod wallet;

// Re-export the types most callers touch
pub use engine::{RetryPolicy, SwapEngine, SwapOutcome};
pub use error::SwapError;
pub use types::{SwapRequest, TxStatus};

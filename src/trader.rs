//! Buy and sell operations on top of the swap engine
//!
//! Both operations are the same bounded submit/confirm loop; they differ
//! only in which side of the pair is the native coin and how the traded
//! amount is derived.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use tracing::info;

use crate::chain::ChainClient;
use crate::config::TradingConfig;
use crate::engine::{SwapEngine, SwapOutcome, SwapSource};
use crate::error::SwapError;
use crate::jupiter::JupiterClient;
use crate::types::{sol_to_lamports, SwapRequest, SOL_MINT};
use crate::wallet::Wallet;

/// Production `SwapSource`: quote the route, have the router assemble the
/// transaction, sign it locally. Every call re-quotes, so a retry adapts
/// to price movement since the previous attempt.
pub struct JupiterSwapSource {
    jupiter: JupiterClient,
    wallet: Arc<Wallet>,
}

impl JupiterSwapSource {
    pub fn new(jupiter: JupiterClient, wallet: Arc<Wallet>) -> Self {
        Self { jupiter, wallet }
    }
}

#[async_trait]
impl SwapSource for JupiterSwapSource {
    async fn build_signed(
        &self,
        request: &SwapRequest,
    ) -> Result<VersionedTransaction, SwapError> {
        let quote = self.jupiter.quote(request).await?;
        let unsigned = self
            .jupiter
            .swap_transaction(request, &quote, &self.wallet.pubkey())
            .await?;
        Ok(self.wallet.sign_transaction(unsigned)?)
    }
}

/// Caller-facing buy/sell operations
pub struct Trader {
    engine: SwapEngine,
    chain: Arc<dyn ChainClient>,
    owner: Pubkey,
    trading: TradingConfig,
}

impl Trader {
    pub fn new(
        engine: SwapEngine,
        chain: Arc<dyn ChainClient>,
        owner: Pubkey,
        trading: TradingConfig,
    ) -> Self {
        Self {
            engine,
            chain,
            owner,
            trading,
        }
    }

    /// Swap a fixed amount of SOL into `token_mint`
    pub async fn buy(&self, token_mint: Pubkey, sol_amount: f64) -> Result<SwapOutcome> {
        if sol_amount <= 0.0 {
            bail!("buy amount must be positive, got {} SOL", sol_amount);
        }
        let amount = sol_to_lamports(sol_amount);
        info!(%token_mint, sol_amount, lamports = amount, "buying token");

        let request = self.request(SOL_MINT, token_mint, amount);
        Ok(self.engine.execute(&request).await)
    }

    /// Swap a percentage of the wallet's current `token_mint` holding back
    /// into SOL.
    ///
    /// The balance is read immediately before building the request so
    /// consecutive sells observe earlier fills.
    pub async fn sell(&self, token_mint: Pubkey, percentage: f64) -> Result<SwapOutcome> {
        if !(percentage > 0.0 && percentage <= 100.0) {
            bail!("sell percentage must be in (0, 100], got {}", percentage);
        }

        let balance = self
            .chain
            .token_balance(&self.owner, &token_mint)
            .await
            .with_context(|| format!("failed to read balance for {}", token_mint))?;
        if balance.amount == 0 {
            bail!("no {} balance to sell", token_mint);
        }

        let amount = (balance.amount as f64 * percentage / 100.0) as u64;
        if amount == 0 {
            bail!(
                "{}% of balance {} rounds to zero units",
                percentage,
                balance.amount
            );
        }
        info!(
            %token_mint,
            percentage,
            raw_amount = amount,
            decimals = balance.decimals,
            "selling token"
        );

        let request = self.request(token_mint, SOL_MINT, amount);
        Ok(self.engine.execute(&request).await)
    }

    fn request(&self, input_mint: Pubkey, output_mint: Pubkey, amount: u64) -> SwapRequest {
        SwapRequest {
            input_mint,
            output_mint,
            amount,
            max_slippage_bps: self.trading.max_slippage_bps,
            max_priority_fee_lamports: sol_to_lamports(self.trading.max_priority_fee_sol),
            priority_level: self.trading.priority_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::TokenBalance;
    use crate::engine::RetryPolicy;
    use crate::error::ChainError;
    use crate::types::{PriorityLevel, TxStatus};
    use solana_sdk::signature::Signature;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source that records the requests it is asked to build
    #[derive(Default)]
    struct CapturingSource {
        requests: Mutex<Vec<SwapRequest>>,
    }

    #[async_trait]
    impl SwapSource for CapturingSource {
        async fn build_signed(
            &self,
            request: &SwapRequest,
        ) -> Result<VersionedTransaction, SwapError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(VersionedTransaction::default())
        }
    }

    /// Chain with a fixed token balance that always confirms
    struct HappyChain {
        balance: TokenBalance,
    }

    #[async_trait]
    impl ChainClient for HappyChain {
        async fn submit(&self, _tx: &VersionedTransaction) -> Result<Signature, ChainError> {
            Ok(Signature::new_unique())
        }

        async fn poll_status(&self, _signature: &Signature) -> Result<TxStatus, ChainError> {
            Ok(TxStatus::Confirmed)
        }

        async fn sol_balance(&self, _owner: &Pubkey) -> Result<u64, ChainError> {
            Ok(1_000_000_000)
        }

        async fn token_balance(
            &self,
            _owner: &Pubkey,
            _mint: &Pubkey,
        ) -> Result<TokenBalance, ChainError> {
            Ok(self.balance)
        }
    }

    fn trader_with(
        source: Arc<CapturingSource>,
        balance: TokenBalance,
    ) -> Trader {
        let chain = Arc::new(HappyChain { balance });
        let policy = RetryPolicy {
            max_attempts: 5,
            confirmation_delay: Duration::from_millis(1),
        };
        let engine = SwapEngine::new(source, chain.clone(), policy);
        Trader::new(engine, chain, Pubkey::new_unique(), TradingConfig::default())
    }

    fn built_requests(source: &CapturingSource) -> Vec<SwapRequest> {
        source.requests.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_buy_converts_sol_to_lamports() {
        let source = Arc::new(CapturingSource::default());
        let trader = trader_with(source.clone(), TokenBalance { amount: 0, decimals: 6 });
        let token = Pubkey::new_unique();

        let outcome = trader.buy(token, 0.1).await.unwrap();
        assert!(outcome.is_confirmed());

        let requests = built_requests(&source);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].input_mint, SOL_MINT);
        assert_eq!(requests[0].output_mint, token);
        assert_eq!(requests[0].amount, 100_000_000);
        assert_eq!(requests[0].max_slippage_bps, 500);
        assert_eq!(requests[0].max_priority_fee_lamports, 2_000_000);
        assert_eq!(requests[0].priority_level, PriorityLevel::VeryHigh);
    }

    #[tokio::test]
    async fn test_sell_uses_percentage_of_live_balance() {
        let source = Arc::new(CapturingSource::default());
        let trader = trader_with(
            source.clone(),
            TokenBalance { amount: 1_000_000, decimals: 6 },
        );
        let token = Pubkey::new_unique();

        let outcome = trader.sell(token, 50.0).await.unwrap();
        assert!(outcome.is_confirmed());

        let requests = built_requests(&source);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].input_mint, token);
        assert_eq!(requests[0].output_mint, SOL_MINT);
        assert_eq!(requests[0].amount, 500_000);
    }

    #[tokio::test]
    async fn test_sell_everything() {
        let source = Arc::new(CapturingSource::default());
        let trader = trader_with(
            source.clone(),
            TokenBalance { amount: 123_456, decimals: 6 },
        );

        trader.sell(Pubkey::new_unique(), 100.0).await.unwrap();
        assert_eq!(built_requests(&source)[0].amount, 123_456);
    }

    #[tokio::test]
    async fn test_sell_rejects_zero_balance() {
        let source = Arc::new(CapturingSource::default());
        let trader = trader_with(source.clone(), TokenBalance { amount: 0, decimals: 6 });

        let err = trader.sell(Pubkey::new_unique(), 50.0).await.unwrap_err();
        assert!(err.to_string().contains("balance"));
        assert!(built_requests(&source).is_empty());
    }

    #[tokio::test]
    async fn test_sell_rejects_out_of_range_percentage() {
        let source = Arc::new(CapturingSource::default());
        let trader = trader_with(
            source.clone(),
            TokenBalance { amount: 1_000_000, decimals: 6 },
        );

        assert!(trader.sell(Pubkey::new_unique(), 0.0).await.is_err());
        assert!(trader.sell(Pubkey::new_unique(), 150.0).await.is_err());
        assert!(trader.sell(Pubkey::new_unique(), -5.0).await.is_err());
        assert!(built_requests(&source).is_empty());
    }

    #[tokio::test]
    async fn test_buy_rejects_nonpositive_amount() {
        let source = Arc::new(CapturingSource::default());
        let trader = trader_with(source.clone(), TokenBalance { amount: 0, decimals: 6 });

        assert!(trader.buy(Pubkey::new_unique(), 0.0).await.is_err());
        assert!(trader.buy(Pubkey::new_unique(), -0.5).await.is_err());
        assert!(built_requests(&source).is_empty());
    }
}

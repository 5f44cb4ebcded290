//! Jupiter v6 client: quote lookup and swap-transaction assembly
//!
//! Both calls are thin wrappers over the router's HTTP API. Neither
//! retries; a failure here counts as the current attempt's failure and the
//! orchestrator decides what happens next.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, transaction::VersionedTransaction};
use tracing::debug;

use crate::config::JupiterConfig;
use crate::error::JupiterError;
use crate::types::{PriorityLevel, SwapRequest};

/// Quote returned by the router.
///
/// Only the fields we inspect are modeled; everything else is carried in
/// `extra` so the swap-build request can echo the quote back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,

    #[serde(default)]
    pub slippage_bps: u16,

    #[serde(default)]
    pub price_impact_pct: Option<String>,

    /// Route legs; empty means the router found no path for the pair
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub amm_key: String,
    #[serde(default)]
    pub label: Option<String>,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default)]
    pub fee_amount: Option<String>,
    #[serde(default)]
    pub fee_mint: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapBuildRequest<'a> {
    quote_response: &'a QuoteResponse,
    user_public_key: String,
    wrap_and_unwrap_sol: bool,
    dynamic_slippage: DynamicSlippage,
    prioritization_fee_lamports: PrioritizationFee,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DynamicSlippage {
    max_bps: u16,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrioritizationFee {
    priority_level_with_max_lamports: PriorityLevelWithMaxLamports,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriorityLevelWithMaxLamports {
    max_lamports: u64,
    /// Whether the fee estimate considers the whole cluster or just the
    /// accounts this transaction touches
    global: bool,
    priority_level: PriorityLevel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapBuildResponse {
    /// Base64-encoded unsigned transaction
    swap_transaction: String,

    #[serde(default)]
    last_valid_block_height: Option<u64>,
}

/// HTTP client for the routing service
pub struct JupiterClient {
    http: reqwest::Client,
    config: JupiterConfig,
}

impl JupiterClient {
    pub fn new(config: JupiterConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Request a route for the pair and amount.
    ///
    /// An empty route plan is a no-liquidity condition and is reported as
    /// `NoRoute` so callers fail fast without touching the node.
    pub async fn quote(&self, request: &SwapRequest) -> Result<QuoteResponse, JupiterError> {
        let response = self
            .http
            .get(&self.config.quote_api_url)
            .query(&[
                ("inputMint", request.input_mint.to_string()),
                ("outputMint", request.output_mint.to_string()),
                ("amount", request.amount.to_string()),
                ("slippageBps", request.max_slippage_bps.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|e| JupiterError::MalformedResponse(e.to_string()))?;

        if quote.route_plan.is_empty() {
            return Err(JupiterError::NoRoute(format!(
                "{} -> {}",
                request.input_mint, request.output_mint
            )));
        }

        debug!(
            out_amount = %quote.out_amount,
            legs = quote.route_plan.len(),
            "quote received"
        );
        Ok(quote)
    }

    /// Ask the router to assemble the unsigned transaction for a quote
    pub async fn swap_transaction(
        &self,
        request: &SwapRequest,
        quote: &QuoteResponse,
        user: &Pubkey,
    ) -> Result<VersionedTransaction, JupiterError> {
        let body = SwapBuildRequest {
            quote_response: quote,
            user_public_key: user.to_string(),
            wrap_and_unwrap_sol: true,
            dynamic_slippage: DynamicSlippage {
                max_bps: request.max_slippage_bps,
            },
            prioritization_fee_lamports: PrioritizationFee {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    max_lamports: request.max_priority_fee_lamports,
                    global: false,
                    priority_level: request.priority_level,
                },
            },
        };

        let response = self
            .http
            .post(&self.config.swap_api_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let built: SwapBuildResponse = response
            .json()
            .await
            .map_err(|e| JupiterError::MalformedResponse(e.to_string()))?;

        if let Some(height) = built.last_valid_block_height {
            debug!(last_valid_block_height = height, "swap transaction built");
        }
        decode_transaction(&built.swap_transaction)
    }
}

/// Decode the router's base64 payload into an unsigned transaction
fn decode_transaction(encoded: &str) -> Result<VersionedTransaction, JupiterError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| JupiterError::Decode(format!("base64: {}", e)))?;
    bincode::deserialize(&raw).map_err(|e| JupiterError::Decode(format!("transaction: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SOL_MINT;
    use solana_sdk::message::{Message, VersionedMessage};
    use solana_sdk::signature::Signature;
    use solana_sdk::system_instruction;

    fn request() -> SwapRequest {
        SwapRequest {
            input_mint: SOL_MINT,
            output_mint: Pubkey::new_unique(),
            amount: 100_000_000,
            max_slippage_bps: 500,
            max_priority_fee_lamports: 2_000_000,
            priority_level: PriorityLevel::VeryHigh,
        }
    }

    fn quote_json(route_legs: usize) -> String {
        let leg = r#"{
            "swapInfo": {
                "ammKey": "9hE2ZWuLH3FcrqXEbMzZk9pHeBVGVRNs5vs2qqRCT8mF",
                "label": "Raydium",
                "inputMint": "So11111111111111111111111111111111111111112",
                "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "inAmount": "100000000",
                "outAmount": "19000000",
                "feeAmount": "25000",
                "feeMint": "So11111111111111111111111111111111111111112"
            },
            "percent": 100
        }"#;
        let legs: Vec<&str> = std::iter::repeat(leg).take(route_legs).collect();
        format!(
            r#"{{
                "inputMint": "So11111111111111111111111111111111111111112",
                "inAmount": "100000000",
                "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                "outAmount": "19000000",
                "otherAmountThreshold": "18905000",
                "swapMode": "ExactIn",
                "slippageBps": 500,
                "priceImpactPct": "0.01",
                "routePlan": [{}],
                "contextSlot": 277000000
            }}"#,
            legs.join(",")
        )
    }

    fn unsigned_transaction_base64(payer: &Pubkey) -> String {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1);
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(Message::new(&[ix], Some(payer))),
        };
        BASE64.encode(bincode::serialize(&tx).unwrap())
    }

    fn client_for(server: &mockito::Server) -> JupiterClient {
        JupiterClient::new(JupiterConfig {
            quote_api_url: format!("{}/quote", server.url()),
            swap_api_url: format!("{}/swap", server.url()),
        })
    }

    #[tokio::test]
    async fn test_quote_parses_route_plan() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(quote_json(1))
            .create_async()
            .await;

        let client = client_for(&server);
        let quote = client.quote(&request()).await.unwrap();
        assert_eq!(quote.route_plan.len(), 1);
        assert_eq!(quote.out_amount, "19000000");
        assert_eq!(quote.route_plan[0].swap_info.label.as_deref(), Some("Raydium"));
        // Unmodeled fields survive for the swap-build echo
        assert!(quote.extra.contains_key("otherAmountThreshold"));
    }

    #[tokio::test]
    async fn test_quote_empty_route_plan_is_no_route() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(quote_json(0))
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.quote(&request()).await.unwrap_err();
        assert!(matches!(err, JupiterError::NoRoute(_)));
    }

    #[tokio::test]
    async fn test_quote_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.quote(&request()).await.unwrap_err();
        assert!(matches!(err, JupiterError::Http(_)));
    }

    #[tokio::test]
    async fn test_quote_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/quote")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"unexpected\": true}")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.quote(&request()).await.unwrap_err();
        assert!(matches!(err, JupiterError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_swap_transaction_decodes_payload() {
        let user = Pubkey::new_unique();
        let payload = unsigned_transaction_base64(&user);

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/swap")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"wrapAndUnwrapSol": true, "prioritizationFeeLamports": {"priorityLevelWithMaxLamports": {"maxLamports": 2000000, "global": false, "priorityLevel": "veryHigh"}}}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"swapTransaction": "{}", "lastValidBlockHeight": 279000000}}"#,
                payload
            ))
            .create_async()
            .await;

        let client = client_for(&server);
        let quote: QuoteResponse = serde_json::from_str(&quote_json(1)).unwrap();
        let tx = client
            .swap_transaction(&request(), &quote, &user)
            .await
            .unwrap();
        assert_eq!(tx.message.static_account_keys()[0], user);
    }

    #[tokio::test]
    async fn test_swap_transaction_rejects_garbage_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/swap")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"swapTransaction": "not base64!!"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let quote: QuoteResponse = serde_json::from_str(&quote_json(1)).unwrap();
        let err = client
            .swap_transaction(&request(), &quote, &Pubkey::new_unique())
            .await
            .unwrap_err();
        assert!(matches!(err, JupiterError::Decode(_)));
    }
}

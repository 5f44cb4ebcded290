//! Retry orchestrator: build, sign, submit, wait, poll once, retry
//!
//! One swap order moves through a small state machine:
//!
//! ```text
//! Attempting --submit ok--> WaitingForConfirmation --poll Confirmed--> done
//!     ^  |                        |
//!     |  `--build/sign/submit err-+--> retry decision --budget left--> Attempting
//!     |                           |
//!     `---------------------------+--> budget spent / fatal --> exhausted
//! ```
//!
//! Exactly one attempt is live at a time; attempt numbers start at 1 and
//! only ever increase. The loop terminates on the first confirmation or
//! when the attempt budget is spent, whichever comes first. Collaborator
//! failures never escape `execute`: the caller sees either a confirmed
//! signature or an exhausted budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::chain::ChainClient;
use crate::error::SwapError;
use crate::types::{SwapRequest, TxStatus};

/// Produces a signed, transmit-ready transaction for a swap request.
///
/// Build and sign failures both surface here. Implementations perform no
/// retry of their own; retrying is the engine's job, and each call must
/// produce a fresh transaction (fresh quote, fresh blockhash).
#[async_trait]
pub trait SwapSource: Send + Sync {
    async fn build_signed(&self, request: &SwapRequest)
        -> Result<VersionedTransaction, SwapError>;
}

/// Progress notifications emitted by the engine
#[derive(Debug, Clone)]
pub enum SwapEvent {
    AttemptStarted { attempt: u32 },
    AttemptFailed { attempt: u32, category: &'static str, reason: String },
    Confirmed { attempt: u32, signature: Signature },
    Exhausted { attempts: u32 },
}

/// Receives engine progress events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &SwapEvent);
}

/// Default sink: structured log lines via `tracing`
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &SwapEvent) {
        match event {
            SwapEvent::AttemptStarted { attempt } => {
                info!(attempt, "swap attempt started");
            }
            SwapEvent::AttemptFailed { attempt, category, reason } => {
                warn!(attempt, category, %reason, "swap attempt failed");
            }
            SwapEvent::Confirmed { attempt, signature } => {
                info!(attempt, %signature, "swap confirmed");
            }
            SwapEvent::Exhausted { attempts } => {
                warn!(attempts, "swap abandoned, attempt budget exhausted");
            }
        }
    }
}

/// Bounds and timing for the retry loop
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum build/sign/submit cycles per request; must be at least 1
    pub max_attempts: u32,

    /// Fixed wait between submission and the single status poll, giving
    /// the network time to propagate the transaction
    pub confirmation_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            confirmation_delay: Duration::from_secs(10),
        }
    }
}

/// Terminal outcome of one swap order
#[derive(Debug)]
pub enum SwapOutcome {
    Confirmed {
        signature: Signature,
        attempts: u32,
    },
    /// Every attempt failed, or a fatal error cut the budget short. No
    /// signature is reported: an id from a failed attempt proves nothing.
    Exhausted {
        attempts: u32,
        last_error: Option<SwapError>,
    },
}

impl SwapOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Confirmed { signature, .. } => Some(signature),
            Self::Exhausted { .. } => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Attempting,
    WaitingForConfirmation(Signature),
}

/// Drives one swap request through bounded submit/confirm attempts
pub struct SwapEngine {
    source: Arc<dyn SwapSource>,
    chain: Arc<dyn ChainClient>,
    policy: RetryPolicy,
    sink: Arc<dyn EventSink>,
}

impl SwapEngine {
    pub fn new(
        source: Arc<dyn SwapSource>,
        chain: Arc<dyn ChainClient>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            chain,
            policy,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the default tracing sink with a caller-provided observer
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Drive `request` to a terminal outcome.
    ///
    /// Never returns an error: every collaborator failure is consumed by
    /// the retry loop, and the result is either a confirmed signature or
    /// an exhausted attempt budget.
    pub async fn execute(&self, request: &SwapRequest) -> SwapOutcome {
        let mut attempt: u32 = 1;
        let mut phase = Phase::Attempting;
        let mut last_error: Option<SwapError> = None;

        loop {
            match phase {
                Phase::Attempting => {
                    self.sink.on_event(&SwapEvent::AttemptStarted { attempt });
                    match self.build_and_submit(request).await {
                        Ok(signature) => {
                            info!(
                                "transaction sent: https://explorer.solana.com/tx/{}",
                                signature
                            );
                            phase = Phase::WaitingForConfirmation(signature);
                        }
                        Err(error) => {
                            // No transaction id exists, so there is nothing
                            // to poll; go straight to the retry decision.
                            self.report_failure(attempt, &error);
                            let fatal = !error.is_retryable();
                            last_error = Some(error);
                            if fatal || attempt >= self.policy.max_attempts {
                                break;
                            }
                            attempt += 1;
                        }
                    }
                }
                Phase::WaitingForConfirmation(signature) => {
                    sleep(self.policy.confirmation_delay).await;
                    match self.check_confirmation(&signature).await {
                        Ok(()) => {
                            self.sink
                                .on_event(&SwapEvent::Confirmed { attempt, signature });
                            return SwapOutcome::Confirmed {
                                signature,
                                attempts: attempt,
                            };
                        }
                        Err(error) => {
                            self.report_failure(attempt, &error);
                            let fatal = !error.is_retryable();
                            last_error = Some(error);
                            if fatal || attempt >= self.policy.max_attempts {
                                break;
                            }
                            attempt += 1;
                            phase = Phase::Attempting;
                        }
                    }
                }
            }
        }

        self.sink.on_event(&SwapEvent::Exhausted { attempts: attempt });
        SwapOutcome::Exhausted {
            attempts: attempt,
            last_error,
        }
    }

    async fn build_and_submit(&self, request: &SwapRequest) -> Result<Signature, SwapError> {
        let tx = self.source.build_signed(request).await?;
        self.chain.submit(&tx).await.map_err(SwapError::Submission)
    }

    /// Exactly one poll; anything short of a clean confirmation is this
    /// attempt's failure.
    async fn check_confirmation(&self, signature: &Signature) -> Result<(), SwapError> {
        match self.chain.poll_status(signature).await {
            Ok(TxStatus::Confirmed) => Ok(()),
            Ok(TxStatus::ConfirmedWithError(reason)) => Err(SwapError::ConfirmedWithError(reason)),
            Ok(TxStatus::NotFound) => Err(SwapError::NotFound),
            Ok(TxStatus::Pending) => Err(SwapError::Pending),
            Err(error) => Err(SwapError::StatusUnavailable(error)),
        }
    }

    fn report_failure(&self, attempt: u32, error: &SwapError) {
        self.sink.on_event(&SwapEvent::AttemptFailed {
            attempt,
            category: error.category(),
            reason: error.to_string(),
        });
    }
}

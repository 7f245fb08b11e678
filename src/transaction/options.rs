//! Transaction Options
//!
//! Attempt budget, backoff between retries, deadlines and cancellation.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;

/// Default number of attempts before giving up on contention
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// ============================================================================
// Backoff
// ============================================================================

/// Delay between attempts after contention
///
/// The delay before retry `n` (1-based) is
/// `base_delay_ms * 2^(n-1)`, capped at `max_delay_ms`, then scaled by a
/// random factor in `[1 - jitter, 1 + jitter]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub base_delay_ms: u64,
    /// Upper bound before jitter
    pub max_delay_ms: u64,
    /// Fraction of the delay randomised either way, in `[0, 1]`
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 5_000,
            jitter: 0.5,
        }
    }
}

impl BackoffConfig {
    /// Retry immediately
    pub fn none() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: 0.0,
        }
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = sanitize_jitter(jitter);
        self
    }

    /// Capped exponential delay before retry `retry` (1-based), no jitter
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32);
        let multiplier = 1u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Jittered delay before retry `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        let jitter = sanitize_jitter(self.jitter);
        if jitter == 0.0 || base.is_zero() {
            return base;
        }
        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        base.mul_f64(factor)
    }
}

/// Jitter outside `[0, 1]` is clamped; NaN and infinities disable it
fn sanitize_jitter(jitter: f64) -> f64 {
    if jitter.is_finite() {
        jitter.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Caller-held switch that cancels a running transaction.
///
/// Clones share state; cancelling any clone cancels them all.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // The sender lives as long as any clone; unreachable in practice
                std::future::pending::<()>().await;
            }
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// How `run_transaction` behaves
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    /// Attempts before failing with `TransactionAborted` (default: 5)
    pub max_attempts: u32,

    /// Begin a read-only transaction; writes are rejected
    pub read_only: bool,

    pub backoff: BackoffConfig,

    /// Deadline for the whole run, retries included
    pub timeout: Option<Duration>,

    /// Deadline for each attempt
    pub attempt_timeout: Option<Duration>,

    pub cancel: Option<CancelSignal>,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            read_only: false,
            backoff: BackoffConfig::default(),
            timeout: None,
            attempt_timeout: None,
            cancel: None,
        }
    }
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a read-only transaction
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

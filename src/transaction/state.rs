//! Transaction State Machine
//!
//! `Idle -> Active -> Committing -> Committed`, or
//! `Active | Committing -> RollingBack -> RolledBack` on failure.
//! Contention takes `Active | Committing` back to `Active` for the next
//! attempt, or straight to `RolledBack` when no attempts remain (the
//! server has already discarded the transaction).
//!
//! Transitions consume the current state and return the next one, so an
//! illegal transition cannot leave a half-updated state behind.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{FirestoreError, FirestoreResult};
use crate::rest::TransactionId;

/// Where one `run_transaction` call is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// No handle requested yet
    #[default]
    Idle,
    /// Attempt `attempt` is running the caller's function
    Active { attempt: u32 },
    /// Attempt `attempt` has sent its commit
    Committing { attempt: u32 },
    Committed { attempt: u32 },
    /// Releasing the handle after a non-contention failure or cancellation
    RollingBack { attempt: u32 },
    RolledBack { attempt: u32 },
}

fn forbidden(from: TransactionState, to: &str) -> FirestoreError {
    FirestoreError::usage(format!(
        "invalid transaction state transition {} -> {}",
        from.state_name(),
        to
    ))
}

impl TransactionState {
    /// State name for logs
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Active { .. } => "Active",
            Self::Committing { .. } => "Committing",
            Self::Committed { .. } => "Committed",
            Self::RollingBack { .. } => "RollingBack",
            Self::RolledBack { .. } => "RolledBack",
        }
    }

    /// Attempt number; 0 before the first begin
    pub fn attempt(&self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::Active { attempt }
            | Self::Committing { attempt }
            | Self::Committed { attempt }
            | Self::RollingBack { attempt }
            | Self::RolledBack { attempt } => *attempt,
        }
    }

    /// Whether a handle from `attempt` may still read and write
    pub fn is_active_for(&self, attempt: u32) -> bool {
        *self == Self::Active { attempt }
    }

    /// Whether a server-side handle may still be open
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Active { .. } | Self::Committing { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed { .. } | Self::RolledBack { .. })
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Idle -> Active (first handle acquired)
    pub fn begin(self) -> FirestoreResult<Self> {
        match self {
            Self::Idle => Ok(Self::Active { attempt: 1 }),
            _ => Err(forbidden(self, "Active")),
        }
    }

    /// Active -> Committing
    pub fn commit(self) -> FirestoreResult<Self> {
        match self {
            Self::Active { attempt } => Ok(Self::Committing { attempt }),
            _ => Err(forbidden(self, "Committing")),
        }
    }

    /// Committing -> Committed
    pub fn committed(self) -> FirestoreResult<Self> {
        match self {
            Self::Committing { attempt } => Ok(Self::Committed { attempt }),
            _ => Err(forbidden(self, "Committed")),
        }
    }

    /// Active | Committing -> Active (next attempt, after contention)
    pub fn retry(self) -> FirestoreResult<Self> {
        match self {
            Self::Active { attempt } | Self::Committing { attempt } => Ok(Self::Active {
                attempt: attempt + 1,
            }),
            _ => Err(forbidden(self, "Active")),
        }
    }

    /// Active | Committing -> RolledBack (contention with no attempts left)
    pub fn abort(self) -> FirestoreResult<Self> {
        match self {
            Self::Active { attempt } | Self::Committing { attempt } => {
                Ok(Self::RolledBack { attempt })
            }
            _ => Err(forbidden(self, "RolledBack")),
        }
    }

    /// Active | Committing -> RollingBack
    pub fn roll_back(self) -> FirestoreResult<Self> {
        match self {
            Self::Active { attempt } | Self::Committing { attempt } => {
                Ok(Self::RollingBack { attempt })
            }
            _ => Err(forbidden(self, "RollingBack")),
        }
    }

    /// RollingBack -> RolledBack
    pub fn rolled_back(self) -> FirestoreResult<Self> {
        match self {
            Self::RollingBack { attempt } => Ok(Self::RolledBack { attempt }),
            _ => Err(forbidden(self, "RolledBack")),
        }
    }
}

/// State shared between the runner and the handles it hands out
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub state: TransactionState,
    /// Server handle of the current attempt, while one is open
    pub handle: Option<TransactionId>,
}

pub(crate) type SharedEngine = Arc<Mutex<EngineState>>;

impl EngineState {
    /// Apply a transition, leaving the state unchanged if it is illegal
    pub fn advance(
        &mut self,
        transition: fn(TransactionState) -> FirestoreResult<TransactionState>,
    ) -> FirestoreResult<()> {
        let from = self.state;
        let to = transition(from)?;
        tracing::debug!(
            from = from.state_name(),
            to = to.state_name(),
            attempt = to.attempt(),
            "transaction_state"
        );
        self.state = to;
        Ok(())
    }
}

/// Lock ignoring poisoning; the guarded data is plain state
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! # Transaction Runner
//!
//! The retry loop behind `Firestore::run_transaction_with`.
//!
//! Each attempt begins a server transaction, runs the caller's function
//! with a fresh `Transaction`, and commits the buffered writes. Contention
//! (from the commit or from a read) throws the attempt away and starts
//! over after a backoff, up to `max_attempts`. Any other error triggers a
//! best-effort rollback and is returned as is.
//!
//! Cancellation and the overall timeout race the whole loop: when either
//! fires, in-flight calls are dropped, the open handle (if any) is rolled
//! back and `Cancelled` is returned. Once a commit has been acknowledged
//! the result is returned even if an interruption arrives alongside it.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use super::handle::Transaction;
use super::options::{CancelSignal, TransactionOptions};
use super::state::{lock, EngineState, SharedEngine, TransactionState};
use crate::client::Firestore;
use crate::errors::{CancelReason, FirestoreError, FirestoreResult};
use crate::reference::PendingWrite;
use crate::rest::{BeginMode, TransactionId};

pub(crate) async fn run<F, Fut, T>(
    firestore: &Firestore,
    options: TransactionOptions,
    f: F,
) -> FirestoreResult<T>
where
    F: FnMut(Transaction) -> Fut,
    Fut: Future<Output = FirestoreResult<T>>,
{
    if options.max_attempts == 0 {
        return Err(FirestoreError::usage("max_attempts must be at least 1"));
    }

    if options.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
        tracing::warn!(reason = %CancelReason::Signal, "transaction_cancelled");
        return Err(FirestoreError::Cancelled(CancelReason::Signal));
    }

    let engine: SharedEngine = Arc::new(Mutex::new(EngineState::default()));
    let deadline = options.timeout.map(|t| Instant::now() + t);

    // Attempts are polled first: a commit that completes in the same poll
    // as an interruption is reported as committed
    let outcome = {
        let attempts = run_attempts(firestore, &options, f, engine.clone());
        let interrupted = interruption(options.cancel.clone(), deadline);
        tokio::select! {
            biased;
            result = attempts => Ok(result),
            reason = interrupted => Err(reason),
        }
    };

    match outcome {
        Ok(result) => result,
        Err(reason) => {
            tracing::warn!(reason = %reason, "transaction_cancelled");
            release(firestore, &engine).await;
            Err(FirestoreError::Cancelled(reason))
        }
    }
}

async fn run_attempts<F, Fut, T>(
    firestore: &Firestore,
    options: &TransactionOptions,
    mut f: F,
    engine: SharedEngine,
) -> FirestoreResult<T>
where
    F: FnMut(Transaction) -> Fut,
    Fut: Future<Output = FirestoreResult<T>>,
{
    let max_attempts = options.max_attempts;
    let mut retry_of: Option<TransactionId> = None;
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            let delay = options.backoff.delay_for(attempt - 1);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "transaction_backoff");
            tokio::time::sleep(delay).await;
        }

        let mode = if options.read_only {
            BeginMode::ReadOnly
        } else {
            BeginMode::ReadWrite {
                retry: retry_of.take(),
            }
        };
        let id = firestore.rpc().begin_transaction(&mode).await?;

        {
            let mut engine = lock(&engine);
            if engine.state == TransactionState::Idle {
                engine.advance(TransactionState::begin)?;
            }
            engine.handle = Some(id.clone());
        }
        tracing::debug!(attempt, read_only = options.read_only, "transaction_begin");

        let tx = Transaction::new(
            firestore.clone(),
            id.clone(),
            attempt,
            options.read_only,
            engine.clone(),
        );

        let result = match options.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt_once(&tx, &mut f, &engine))
                .await
                .unwrap_or(Err(FirestoreError::Cancelled(CancelReason::Timeout))),
            None => attempt_once(&tx, &mut f, &engine).await,
        };

        match result {
            Ok(value) => {
                lock(&engine).handle = None;
                return Ok(value);
            }
            Err(e) if e.is_contention() => {
                last_error = e.to_string();
                let mut engine = lock(&engine);
                engine.handle = None;
                if attempt < max_attempts {
                    tracing::warn!(attempt, max_attempts, error = %e, "transaction_contention");
                    engine.advance(TransactionState::retry)?;
                    retry_of = Some(id);
                } else {
                    engine.advance(TransactionState::abort)?;
                }
            }
            Err(e) => {
                release(firestore, &engine).await;
                return Err(e);
            }
        }
    }

    tracing::warn!(attempts = max_attempts, error = %last_error, "transaction_aborted");
    Err(FirestoreError::TransactionAborted {
        attempts: max_attempts,
        last_error,
    })
}

/// Run the caller's function once and commit what it buffered
async fn attempt_once<F, Fut, T>(
    tx: &Transaction,
    f: &mut F,
    engine: &SharedEngine,
) -> FirestoreResult<T>
where
    F: FnMut(Transaction) -> Fut,
    Fut: Future<Output = FirestoreResult<T>>,
{
    let value = f(tx.clone()).await?;

    let writes = tx.prepare_commit()?;
    let encoded = writes
        .iter()
        .map(PendingWrite::to_json)
        .collect::<FirestoreResult<Vec<_>>>()?;

    tx.firestore().rpc().commit(encoded, Some(tx.id())).await?;
    lock(engine).advance(TransactionState::committed)?;

    tracing::info!(attempt = tx.attempt(), writes = writes.len(), "transaction_committed");
    Ok(value)
}

/// Roll back the open handle, if any. Rollback failures are logged and
/// dropped so they never hide the error that led here.
async fn release(firestore: &Firestore, engine: &SharedEngine) {
    let handle = {
        let mut engine = lock(engine);
        if !engine.state.is_in_flight() {
            return;
        }
        if let Err(e) = engine.advance(TransactionState::roll_back) {
            tracing::warn!(error = %e, "transaction_state");
            return;
        }
        engine.handle.take()
    };

    if let Some(id) = handle {
        if let Err(e) = firestore.rpc().rollback(&id).await {
            tracing::warn!(error = %e, "rollback_failed");
        }
    }

    if let Err(e) = lock(engine).advance(TransactionState::rolled_back) {
        tracing::warn!(error = %e, "transaction_state");
    }
}

/// Resolves when the caller cancels or the deadline passes
async fn interruption(cancel: Option<CancelSignal>, deadline: Option<Instant>) -> CancelReason {
    let signalled = async {
        match &cancel {
            Some(signal) => signal.cancelled().await,
            None => std::future::pending().await,
        }
    };
    let expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = signalled => CancelReason::Signal,
        _ = expired => CancelReason::Timeout,
    }
}

//! Structured observability hooks for waits and mutation retries.
//!
//! This module provides:
//! - `WaitSpan`, a guard that tags a wait with its handle and operation
//! - Emission functions for key events: wait start/tick/finish, retry
//!   attempt failures and the post-timeout final attempt
//!
//! Lifecycle events are emitted at `info!`, per-tick events at `debug!`
//! (filter with the `CONVERGE_LOG` env var).

use std::time::Instant;

use tracing::{debug, info, warn, Span};

/// Guard for one wait: owns the span its events run under and reports the
/// outcome when finished.
///
/// # Example
///
/// ```ignore
/// let wait = WaitSpan::start("prod/web", "service stable");
/// let result = poll().instrument(wait.span()).await;
/// wait.finish(if result.is_ok() { "succeeded" } else { "failed" });
/// ```
pub struct WaitSpan {
    span: Span,
    started: Instant,
    handle: String,
    operation: String,
}

impl WaitSpan {
    /// Create the span and emit `wait.started`.
    pub fn start(handle: &str, operation: &str) -> Self {
        let span = tracing::info_span!("converge.wait", handle = %handle, operation = %operation);
        span.in_scope(|| {
            info!(event = "wait.started", handle = %handle, operation = %operation);
        });
        Self {
            span,
            started: Instant::now(),
            handle: handle.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Span to instrument the wait's future with.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// Emit `wait.finished` with the elapsed time and outcome.
    pub fn finish(self, outcome: &str) {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        self.span.in_scope(|| {
            info!(
                event = "wait.finished",
                handle = %self.handle,
                operation = %self.operation,
                duration_ms = duration_ms,
                outcome = %outcome,
            );
        });
    }
}

/// Emit event: one poller tick observed a status (or nothing).
pub fn emit_wait_tick(tick: u32, status: Option<&str>) {
    debug!(event = "wait.tick", tick = tick, status = status.unwrap_or("<missing>"));
}

/// Emit event: a retryable mutation attempt failed and will be retried.
pub fn emit_retry_attempt_failed(
    profile: &str,
    attempt: u32,
    error: &dyn std::fmt::Display,
    delay_ms: u64,
) {
    warn!(
        event = "retry.attempt_failed",
        profile = %profile,
        attempt = attempt,
        error = %error,
        delay_ms = delay_ms,
    );
}

/// Emit event: the retry window closed and one final attempt is made.
pub fn emit_retry_final_attempt(profile: &str, attempts: u32) {
    info!(event = "retry.final_attempt", profile = %profile, attempts = attempts);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_span_start_and_finish() {
        let wait = WaitSpan::start("prod/web", "service stable");
        let _entered = wait.span().entered();
        emit_wait_tick(1, Some("DEPLOYING"));
        emit_wait_tick(2, None);
        drop(_entered);
        wait.finish("succeeded");
    }

    #[test]
    fn test_retry_events_do_not_panic() {
        emit_retry_attempt_failed("service_create", 1, &"ClusterNotFound", 500);
        emit_retry_final_attempt("service_create", 4);
    }
}

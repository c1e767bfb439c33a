//! Retry-on-mutate: bounded retries of a mutating call while the control
//! plane catches up with its own recent changes.
//!
//! # Modules
//!
//! - [`profile`]: `RetryProfile` classifiers per kind of mutation
//!
//! The loop is `retry_when`: call, classify a failure, sleep with
//! exponential backoff, repeat while the window is open. `retry_mutation`
//! adds an idempotency token shared by every attempt and, when the policy
//! asks for it, one last attempt after the window closes.

pub mod profile;

pub use profile::{RetryDecision, RetryProfile};

use std::fmt;
use std::future::Future;
use std::time::Duration;

use converge_api::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::ConvergeError;
use crate::obs;
use crate::waiter::cancelled;

/// Bounds of one retried mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Window in which retryable failures are retried (milliseconds).
    pub timeout_ms: u64,
    /// Delay after the first failed attempt; doubles per attempt.
    pub initial_delay_ms: u64,
    /// Cap on the delay between attempts.
    pub max_delay_ms: u64,
    /// Make one more attempt once the window has closed.
    pub final_attempt_on_timeout: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            final_attempt_on_timeout: true,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before attempt `attempt + 1`, `attempt` counting from 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }
}

/// Why a retried mutation gave up.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    #[error("failed permanently after {attempts} attempt(s): {source}")]
    Permanent {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error("retry window of {limit_ms}ms closed after {attempts} attempt(s): {source}")]
    TimedOut {
        attempts: u32,
        limit_ms: u64,
        #[source]
        source: ApiError,
    },

    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl RetryError {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Permanent { attempts, .. }
            | RetryError::TimedOut { attempts, .. }
            | RetryError::Cancelled { attempts } => *attempts,
        }
    }

    /// The last API error, unless the retry was cancelled.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            RetryError::Permanent { source, .. } | RetryError::TimedOut { source, .. } => {
                Some(source)
            }
            RetryError::Cancelled { .. } => None,
        }
    }

    /// Whether the last API error says the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }

    /// Wrap with the handle and operation the mutation was for.
    ///
    /// A closed retry window becomes `Timeout`, keeping the last API error
    /// as its source.
    pub fn into_converge(self, handle: &str, operation: &str) -> ConvergeError {
        match self {
            RetryError::Permanent { source, .. } => ConvergeError::Api {
                handle: handle.to_string(),
                operation: operation.to_string(),
                source,
            },
            RetryError::TimedOut {
                limit_ms, source, ..
            } => ConvergeError::Timeout {
                handle: handle.to_string(),
                operation: operation.to_string(),
                last_status: source.kind().to_string(),
                limit_ms,
                last_error: Some(source),
            },
            RetryError::Cancelled { .. } => ConvergeError::Cancelled {
                handle: handle.to_string(),
                operation: operation.to_string(),
            },
        }
    }
}

/// Idempotency token sent with every attempt of one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Call `operation` until it succeeds, fails permanently according to
/// `classify`, or the policy's window closes.
///
/// `classify` takes each failure and returns the decision together with the
/// error to report for that attempt, so it can replace the error it was
/// given.
pub async fn retry_when<T, F, Fut, C>(
    policy: &RetryPolicy,
    operation: F,
    classify: C,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    C: Fn(ApiError) -> (RetryDecision, ApiError),
{
    retry_loop(policy, None, "custom", operation, classify).await
}

/// [`retry_when`] that also stops when `cancel` fires.
pub async fn retry_when_cancellable<T, F, Fut, C>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: F,
    classify: C,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    C: Fn(ApiError) -> (RetryDecision, ApiError),
{
    retry_loop(policy, Some(cancel), "custom", operation, classify).await
}

/// Retry a mutation under `profile`, passing the same [`ClientToken`] to
/// every attempt.
///
/// When the window closes on a retryable error and
/// `final_attempt_on_timeout` is set, one more attempt is made with the
/// same token, so the control plane can recognise it as a duplicate.
pub async fn retry_mutation<T, F, Fut>(
    policy: &RetryPolicy,
    profile: RetryProfile,
    operation: F,
) -> Result<T, RetryError>
where
    F: FnMut(ClientToken) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    mutation_loop(policy, None, profile, operation).await
}

/// [`retry_mutation`] that also stops when `cancel` fires.
pub async fn retry_mutation_cancellable<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    profile: RetryProfile,
    operation: F,
) -> Result<T, RetryError>
where
    F: FnMut(ClientToken) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    mutation_loop(policy, Some(cancel), profile, operation).await
}

async fn mutation_loop<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: Option<&CancellationToken>,
    profile: RetryProfile,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut(ClientToken) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let token = ClientToken::new();
    let result = retry_loop(
        policy,
        cancel,
        profile.name(),
        || operation(token.clone()),
        |e| (profile.classify(&e), e),
    )
    .await;

    match result {
        Err(RetryError::TimedOut { attempts, .. }) if policy.final_attempt_on_timeout => {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(RetryError::Cancelled { attempts });
            }
            obs::emit_retry_final_attempt(profile.name(), attempts);
            let attempts = attempts + 1;
            match operation(token).await {
                Ok(value) => Ok(value),
                Err(source) => match profile.classify(&source) {
                    RetryDecision::Retry => Err(RetryError::TimedOut {
                        attempts,
                        limit_ms: policy.timeout_ms,
                        source,
                    }),
                    RetryDecision::Fail => Err(RetryError::Permanent { attempts, source }),
                },
            }
        }
        other => other,
    }
}

async fn retry_loop<T, F, Fut, C>(
    policy: &RetryPolicy,
    cancel: Option<&CancellationToken>,
    label: &str,
    mut operation: F,
    classify: C,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    C: Fn(ApiError) -> (RetryDecision, ApiError),
{
    let deadline = Instant::now() + policy.timeout();
    let mut attempts = 0u32;

    loop {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(RetryError::Cancelled { attempts });
        }
        attempts += 1;

        let result = tokio::select! {
            biased;
            _ = cancelled(cancel) => return Err(RetryError::Cancelled { attempts }),
            result = operation() => result,
        };

        let (decision, source) = match result {
            Ok(value) => return Ok(value),
            Err(err) => classify(err),
        };
        if decision == RetryDecision::Fail {
            return Err(RetryError::Permanent { attempts, source });
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(RetryError::TimedOut {
                attempts,
                limit_ms: policy.timeout_ms,
                source,
            });
        }
        let delay = policy.delay_after(attempts);
        obs::emit_retry_attempt_failed(label, attempts, &source, delay.as_millis() as u64);

        let wake = (now + delay).min(deadline);
        tokio::select! {
            biased;
            _ = cancelled(cancel) => return Err(RetryError::Cancelled { attempts }),
            _ = tokio::time::sleep_until(wake) => {}
        }
        if Instant::now() >= deadline {
            return Err(RetryError::TimedOut {
                attempts,
                limit_ms: policy.timeout_ms,
                source,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            timeout_ms: 60_000,
            initial_delay_ms: 500,
            max_delay_ms: 3_000,
            final_attempt_on_timeout: false,
        };
        let delays: Vec<u128> = (1..=5).map(|a| policy.delay_after(a).as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 3000, 3000]);
    }

    #[test]
    fn test_delay_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(200), Duration::from_millis(10_000));
    }

    #[test]
    fn test_client_tokens_are_unique() {
        let a = ClientToken::new();
        let b = ClientToken::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_into_converge_keeps_source() {
        let err = RetryError::Permanent {
            attempts: 1,
            source: ApiError::ClusterNotFound {
                cluster: "prod".to_string(),
            },
        };
        assert!(err.is_not_found());
        match err.into_converge("prod/web", "create service") {
            ConvergeError::Api { source, .. } => {
                assert!(matches!(source, ApiError::ClusterNotFound { .. }))
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_closed_window_becomes_timeout() {
        use std::error::Error;

        let err = RetryError::TimedOut {
            attempts: 3,
            limit_ms: 120_000,
            source: ApiError::UpdateInProgress {
                message: "busy".to_string(),
            },
        };
        assert_eq!(err.attempts(), 3);
        assert!(!err.is_not_found());
        let converted = err.into_converge("prod", "update cluster");
        assert!(converted.source().unwrap().to_string().contains("busy"));
        match converted {
            ConvergeError::Timeout {
                handle,
                last_status,
                limit_ms,
                last_error,
                ..
            } => {
                assert_eq!(handle, "prod");
                assert_eq!(last_status, "update_in_progress");
                assert_eq!(limit_ms, 120_000);
                assert!(matches!(last_error, Some(ApiError::UpdateInProgress { .. })));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }
}

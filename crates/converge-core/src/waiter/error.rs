//! Poller failure modes.

use std::time::Duration;

use converge_api::ApiError;

/// Why a poller stopped without reaching its target.
///
/// Variants that saw the resource keep the last object so callers can report
/// what the remote side looked like.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<T: std::fmt::Debug> {
    #[error("timed out after {elapsed:?} (limit {limit:?}), last status {last_status:?}")]
    Timeout {
        elapsed: Duration,
        limit: Duration,
        last_status: Option<String>,
        last_object: Option<T>,
    },

    #[error("unexpected status {status:?}, expected one of {expected:?}")]
    UnexpectedStatus {
        status: String,
        expected: Vec<String>,
        object: T,
    },

    #[error("resource not found after {checks} consecutive check(s)")]
    NotFound { checks: u32 },

    #[error("refresh failed: {source}")]
    Refresh {
        #[source]
        source: ApiError,
    },

    #[error("wait cancelled, last status {last_status:?}")]
    Cancelled { last_status: Option<String> },
}

impl<T: std::fmt::Debug> WaitError<T> {
    /// Last status seen before the failure, if any.
    pub fn last_status(&self) -> Option<&str> {
        match self {
            WaitError::Timeout { last_status, .. } | WaitError::Cancelled { last_status } => {
                last_status.as_deref()
            }
            WaitError::UnexpectedStatus { status, .. } => Some(status),
            WaitError::NotFound { .. } | WaitError::Refresh { .. } => None,
        }
    }
}

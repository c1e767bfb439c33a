//! Status poller (waiter engine).
//!
//! - [`StateChangeConf`]: pending/target sets, timeout, backoff, tolerances
//! - [`Refresh`] / [`FnRefresh`]: the per-tick status fetch
//! - [`Observation`]: found-with-status or missing
//! - [`WaitError`]: why a wait stopped short

pub mod error;
pub mod poller;
pub mod refresh;

pub use error::WaitError;
pub use poller::{StateChangeConf, DEFAULT_NOT_FOUND_CHECKS};
pub use refresh::{FnRefresh, Observation, Refresh};

use tokio_util::sync::CancellationToken;

/// Resolves when `token` is cancelled; never resolves without a token.
pub(crate) async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

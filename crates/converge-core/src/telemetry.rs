//! Log setup for the `converge` binary and for embedders of the library.
//!
//! Waits and retries report through `tracing` events (see [`crate::obs`]);
//! nothing is printed until a subscriber is installed. [`init_tracing`]
//! installs one that writes to stderr, leaving stdout to command output
//! such as canonical JSON, and that honours `CONVERGE_LOG` directives
//! (e.g. `CONVERGE_LOG=converge_core=debug` to see every poller tick).
//! Only the first call in a process takes effect.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CONVERGE_LOG";

/// Initialise the global tracing subscriber.
///
/// `json` selects newline-delimited JSON lines for log shippers; `level`
/// applies when `CONVERGE_LOG` is unset or unparsable.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

//! Timeouts, poll intervals and retry settings.
//!
//! `ConvergeConfig::default()` carries the control plane's customary values;
//! `from_env()` overrides them from `CONVERGE_*` variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ConvergeError, Result};
use crate::retry::RetryPolicy;
use crate::waiters::WaitOptions;

pub const ENV_PROPAGATION_TIMEOUT_MS: &str = "CONVERGE_PROPAGATION_TIMEOUT_MS";
pub const ENV_MIN_POLL_INTERVAL_MS: &str = "CONVERGE_MIN_POLL_INTERVAL_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "CONVERGE_POLL_INTERVAL_MS";
pub const ENV_FINAL_ATTEMPT_ON_TIMEOUT: &str = "CONVERGE_FINAL_ATTEMPT_ON_TIMEOUT";

const MINUTE_MS: u64 = 60_000;

/// Kind of remote resource an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cluster,
    Service,
    TaskSet,
    GatewayService,
}

/// Mutation an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Per-operation wait timeouts for one resource kind (milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationTimeouts {
    pub create_ms: u64,
    pub update_ms: u64,
    pub delete_ms: u64,
}

impl OperationTimeouts {
    fn uniform(ms: u64) -> Self {
        Self {
            create_ms: ms,
            update_ms: ms,
            delete_ms: ms,
        }
    }

    pub fn get(&self, operation: Operation) -> u64 {
        match operation {
            Operation::Create => self.create_ms,
            Operation::Update => self.update_ms,
            Operation::Delete => self.delete_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceTimeouts {
    pub cluster: OperationTimeouts,
    pub service: OperationTimeouts,
    pub task_set: OperationTimeouts,
    pub gateway_service: OperationTimeouts,
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            cluster: OperationTimeouts::uniform(10 * MINUTE_MS),
            service: OperationTimeouts::uniform(20 * MINUTE_MS),
            task_set: OperationTimeouts::uniform(10 * MINUTE_MS),
            gateway_service: OperationTimeouts::uniform(20 * MINUTE_MS),
        }
    }
}

impl ResourceTimeouts {
    pub fn get(&self, kind: ResourceKind) -> &OperationTimeouts {
        match kind {
            ResourceKind::Cluster => &self.cluster,
            ResourceKind::Service => &self.service,
            ResourceKind::TaskSet => &self.task_set,
            ResourceKind::GatewayService => &self.gateway_service,
        }
    }
}

/// Settings shared by every wait and mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConvergeConfig {
    /// How long eventually-consistent errors are retried after a mutation.
    pub propagation_timeout_ms: u64,
    /// Floor for the sleep between waiter refreshes.
    pub min_poll_interval_ms: u64,
    /// Fixed sleep between refreshes; `None` means exponential backoff.
    pub poll_interval_ms: Option<u64>,
    pub timeouts: ResourceTimeouts,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Make one more mutation attempt after the retry window closes.
    pub final_attempt_on_timeout: bool,
}

impl Default for ConvergeConfig {
    fn default() -> Self {
        Self {
            propagation_timeout_ms: 2 * MINUTE_MS,
            min_poll_interval_ms: 1_000,
            poll_interval_ms: None,
            timeouts: ResourceTimeouts::default(),
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 10_000,
            final_attempt_on_timeout: true,
        }
    }
}

impl ConvergeConfig {
    /// Defaults overridden by `CONVERGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_PROPAGATION_TIMEOUT_MS) {
            config.propagation_timeout_ms = parse_ms(ENV_PROPAGATION_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_MIN_POLL_INTERVAL_MS) {
            config.min_poll_interval_ms = parse_ms(ENV_MIN_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = Some(parse_ms(ENV_POLL_INTERVAL_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_FINAL_ATTEMPT_ON_TIMEOUT) {
            config.final_attempt_on_timeout = parse_bool(ENV_FINAL_ATTEMPT_ON_TIMEOUT, &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.propagation_timeout_ms == 0 {
            return Err(ConvergeError::InvalidConfig(
                "propagation timeout must be positive".to_string(),
            ));
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(ConvergeError::InvalidConfig(format!(
                "retry initial delay {}ms exceeds max delay {}ms",
                self.retry_initial_delay_ms, self.retry_max_delay_ms
            )));
        }
        if self.poll_interval_ms == Some(0) {
            return Err(ConvergeError::InvalidConfig(
                "poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Wait timeout for `operation` on `kind`.
    pub fn timeout(&self, kind: ResourceKind, operation: Operation) -> Duration {
        Duration::from_millis(self.timeouts.get(kind).get(operation))
    }

    /// Waiter options for `operation` on `kind`.
    pub fn wait_options(&self, kind: ResourceKind, operation: Operation) -> WaitOptions {
        WaitOptions::new(self.timeout(kind, operation))
            .with_min_interval(Duration::from_millis(self.min_poll_interval_ms))
            .with_poll_interval(self.poll_interval_ms.map(Duration::from_millis))
    }

    /// Retry policy bounded by the propagation timeout.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout_ms: self.propagation_timeout_ms,
            initial_delay_ms: self.retry_initial_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
            final_attempt_on_timeout: self.final_attempt_on_timeout,
        }
    }

    /// Retry policy bounded by the propagation timeout plus the operation's
    /// own timeout, for mutations that wait on slow eventual consistency.
    pub fn retry_policy_for(&self, kind: ResourceKind, operation: Operation) -> RetryPolicy {
        RetryPolicy {
            timeout_ms: self.propagation_timeout_ms + self.timeouts.get(kind).get(operation),
            ..self.retry_policy()
        }
    }
}

fn parse_ms(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConvergeError::InvalidConfig(format!("{key}={value:?}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConvergeError::InvalidConfig(format!(
            "{key}={value:?}: expected true or false"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ConvergeConfig::default();
        assert_eq!(cfg.propagation_timeout_ms, 120_000);
        assert_eq!(cfg.min_poll_interval_ms, 1_000);
        assert_eq!(cfg.poll_interval_ms, None);
        assert_eq!(
            cfg.timeout(ResourceKind::Service, Operation::Create),
            Duration::from_secs(20 * 60)
        );
        assert_eq!(
            cfg.timeout(ResourceKind::Cluster, Operation::Delete),
            Duration::from_secs(10 * 60)
        );
        assert!(cfg.final_attempt_on_timeout);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let cfg = ConvergeConfig::from_lookup(lookup(&[
            (ENV_PROPAGATION_TIMEOUT_MS, "5000"),
            (ENV_POLL_INTERVAL_MS, "250"),
            (ENV_FINAL_ATTEMPT_ON_TIMEOUT, "false"),
        ]))
        .unwrap();
        assert_eq!(cfg.propagation_timeout_ms, 5000);
        assert_eq!(cfg.poll_interval_ms, Some(250));
        assert!(!cfg.final_attempt_on_timeout);
        assert_eq!(cfg.min_poll_interval_ms, 1_000);
    }

    #[test]
    fn test_bad_values_rejected() {
        for pairs in [
            [(ENV_PROPAGATION_TIMEOUT_MS, "soon")],
            [(ENV_PROPAGATION_TIMEOUT_MS, "0")],
            [(ENV_FINAL_ATTEMPT_ON_TIMEOUT, "maybe")],
            [(ENV_POLL_INTERVAL_MS, "0")],
        ] {
            match ConvergeConfig::from_lookup(lookup(&pairs)) {
                Err(ConvergeError::InvalidConfig(_)) => {}
                other => panic!("expected InvalidConfig for {:?}, got {:?}", pairs, other),
            }
        }
    }

    #[test]
    fn test_retry_policy_for_adds_operation_timeout() {
        let cfg = ConvergeConfig::default();
        let policy = cfg.retry_policy_for(ResourceKind::Service, Operation::Create);
        assert_eq!(policy.timeout_ms, 120_000 + 20 * 60_000);
        assert_eq!(policy.initial_delay_ms, 500);
        assert_eq!(cfg.retry_policy().timeout_ms, 120_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: ConvergeConfig =
            serde_json::from_str(r#"{"propagation_timeout_ms": 1000}"#).unwrap();
        assert_eq!(cfg.propagation_timeout_ms, 1000);
        assert_eq!(cfg.timeouts, ResourceTimeouts::default());
    }

    #[test]
    fn test_wait_options_from_config() {
        let cfg = ConvergeConfig {
            poll_interval_ms: Some(2_000),
            ..ConvergeConfig::default()
        };
        let opts = cfg.wait_options(ResourceKind::TaskSet, Operation::Update);
        assert_eq!(opts.timeout, Duration::from_secs(600));
        assert_eq!(opts.min_interval, Duration::from_secs(1));
        assert_eq!(opts.poll_interval, Some(Duration::from_secs(2)));
    }
}

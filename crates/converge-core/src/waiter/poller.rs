//! The status poller: a bounded refresh loop with pending and target sets.

use std::fmt::Debug;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::cancelled;
use super::error::WaitError;
use super::refresh::{Observation, Refresh};
use crate::domain::{ConvergeError, Result};
use crate::obs;

/// Consecutive not-found observations tolerated by default.
pub const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Configuration of one wait: which statuses mean "keep going", which mean
/// "done", and how long and how often to look.
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    pending: Vec<String>,
    target: Vec<String>,
    timeout: Duration,
    delay: Duration,
    min_timeout: Duration,
    poll_interval: Option<Duration>,
    not_found_checks: u32,
    continuous_target_occurence: u32,
    cancel: Option<CancellationToken>,
}

impl StateChangeConf {
    /// `pending` and `target` must not overlap and `target` must not be empty.
    pub fn new(pending: &[&str], target: &[&str], timeout: Duration) -> Result<Self> {
        if target.is_empty() {
            return Err(ConvergeError::InvalidConfig(
                "waiter needs at least one target status".to_string(),
            ));
        }
        if let Some(both) = pending.iter().find(|p| target.contains(p)) {
            return Err(ConvergeError::InvalidConfig(format!(
                "status {both} is both pending and target"
            )));
        }
        Ok(Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            timeout,
            delay: Duration::ZERO,
            min_timeout: Duration::ZERO,
            poll_interval: None,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            continuous_target_occurence: 1,
            cancel: None,
        })
    }

    /// Wait this long before the first refresh.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Lower bound for the sleep between refreshes.
    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Fixed sleep between refreshes instead of exponential backoff.
    pub fn with_poll_interval(mut self, poll_interval: Option<Duration>) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Consecutive not-found observations tolerated before failing.
    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Consecutive target observations required before succeeding.
    pub fn with_continuous_target_occurence(mut self, count: u32) -> Self {
        self.continuous_target_occurence = count.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn target(&self) -> &[String] {
        &self.target
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    fn next_wait(&self, backoff: &mut Duration) -> Duration {
        let wait = match self.poll_interval {
            Some(interval) => interval,
            None => {
                let wait = *backoff;
                *backoff = (*backoff * 2).min(MAX_BACKOFF);
                wait
            }
        };
        wait.max(self.min_timeout)
    }

    /// Poll `refresh` until its status is in the target set.
    ///
    /// Ticks run strictly one after another. Cancellation is checked at the
    /// top of each tick and raced against both the refresh and the sleep.
    pub async fn wait_for_state<R>(
        &self,
        refresh: &mut R,
    ) -> std::result::Result<R::Object, WaitError<R::Object>>
    where
        R: Refresh,
        R::Object: Debug,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut last_status: Option<String> = None;
        let mut last_object: Option<R::Object> = None;
        let mut not_found = 0u32;
        let mut target_hits = 0u32;
        let mut backoff = INITIAL_BACKOFF;
        let mut tick = 0u32;

        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancelled(self.cancel.as_ref()) => {
                    return Err(WaitError::Cancelled { last_status });
                }
                _ = tokio::time::sleep_until((started + self.delay).min(deadline)) => {}
            }
        }

        loop {
            if self.is_cancelled() {
                return Err(WaitError::Cancelled { last_status });
            }
            if Instant::now() >= deadline {
                return Err(WaitError::Timeout {
                    elapsed: started.elapsed(),
                    limit: self.timeout,
                    last_status,
                    last_object,
                });
            }
            tick += 1;

            let observed = tokio::select! {
                biased;
                _ = cancelled(self.cancel.as_ref()) => {
                    return Err(WaitError::Cancelled { last_status });
                }
                result = tokio::time::timeout_at(deadline, refresh.refresh()) => match result {
                    Ok(observed) => observed,
                    Err(_) => {
                        return Err(WaitError::Timeout {
                            elapsed: started.elapsed(),
                            limit: self.timeout,
                            last_status,
                            last_object,
                        });
                    }
                },
            };

            match observed {
                Err(source) => return Err(WaitError::Refresh { source }),
                Ok(Observation::Missing) => {
                    obs::emit_wait_tick(tick, None);
                    target_hits = 0;
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(WaitError::NotFound { checks: not_found });
                    }
                }
                Ok(Observation::Found { object, status }) => {
                    obs::emit_wait_tick(tick, Some(&status));
                    not_found = 0;
                    if self.target.contains(&status) {
                        target_hits += 1;
                        if target_hits >= self.continuous_target_occurence {
                            return Ok(object);
                        }
                    } else if self.pending.contains(&status) {
                        target_hits = 0;
                    } else {
                        return Err(WaitError::UnexpectedStatus {
                            status,
                            expected: self.target.clone(),
                            object,
                        });
                    }
                    last_status = Some(status);
                    last_object = Some(object);
                }
            }

            let wake = (Instant::now() + self.next_wait(&mut backoff)).min(deadline);
            tokio::select! {
                biased;
                _ = cancelled(self.cancel.as_ref()) => {
                    return Err(WaitError::Cancelled { last_status });
                }
                _ = tokio::time::sleep_until(wake) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use converge_api::ApiError;

    use super::*;
    use crate::waiter::FnRefresh;

    fn scripted(
        statuses: Vec<&'static str>,
        calls: Arc<AtomicU32>,
    ) -> impl Refresh<Object = u32> {
        FnRefresh(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let status = statuses[(n as usize).min(statuses.len() - 1)];
            async move { Ok(Observation::found(n, status)) }
        })
    }

    #[test]
    fn test_overlapping_sets_rejected() {
        match StateChangeConf::new(&["ACTIVE"], &["ACTIVE"], Duration::from_secs(1)) {
            Err(ConvergeError::InvalidConfig(msg)) => assert!(msg.contains("ACTIVE")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
        assert!(StateChangeConf::new(&["A"], &[], Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_backoff_doubles_to_cap() {
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(60)).unwrap();
        let mut backoff = INITIAL_BACKOFF;
        let waits: Vec<u128> = (0..9)
            .map(|_| conf.next_wait(&mut backoff).as_millis())
            .collect();
        assert_eq!(
            waits,
            vec![100, 200, 400, 800, 1600, 3200, 6400, 10000, 10000]
        );
    }

    #[test]
    fn test_min_timeout_floors_wait() {
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(60))
            .unwrap()
            .with_min_timeout(Duration::from_secs(1));
        let mut backoff = INITIAL_BACKOFF;
        assert_eq!(conf.next_wait(&mut backoff), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_pending_ticks() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut refresh = scripted(vec!["P", "P", "P", "T"], calls.clone());
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(60)).unwrap();

        let object = conf.wait_for_state(&mut refresh).await.unwrap();
        assert_eq!(object, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuous_target_occurence() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut refresh = scripted(vec!["T", "P", "T", "T"], calls.clone());
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(60))
            .unwrap()
            .with_continuous_target_occurence(2);

        let object = conf.wait_for_state(&mut refresh).await.unwrap();
        assert_eq!(object, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_status_fails_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut refresh = scripted(vec!["P", "FAILED"], calls.clone());
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(60)).unwrap();

        match conf.wait_for_state(&mut refresh).await {
            Err(WaitError::UnexpectedStatus { status, object, .. }) => {
                assert_eq!(status, "FAILED");
                assert_eq!(object, 1);
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_deadline() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut refresh = scripted(vec!["P"], calls.clone());
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(30)).unwrap();

        let started = Instant::now();
        match conf.wait_for_state(&mut refresh).await {
            Err(WaitError::Timeout {
                limit, last_status, ..
            }) => {
                assert_eq!(limit, Duration::from_secs(30));
                assert_eq!(last_status.as_deref(), Some("P"));
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_tolerance() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut refresh = FnRefresh(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Observation::<u32>::Missing) }
        });
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(600))
            .unwrap()
            .with_not_found_checks(3);

        match conf.wait_for_state(&mut refresh).await {
            Err(WaitError::NotFound { checks }) => assert_eq!(checks, 4),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut refresh = FnRefresh(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<Observation<u32>, _>(ApiError::Server {
                    message: "boom".to_string(),
                })
            }
        });
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(60)).unwrap();

        match conf.wait_for_state(&mut refresh).await {
            Err(WaitError::Refresh { source }) => assert_eq!(source.kind(), "server"),
            other => panic!("expected Refresh, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_promptly() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut refresh = scripted(vec!["P"], calls.clone());
        let token = CancellationToken::new();
        let conf = StateChangeConf::new(&["P"], &["T"], Duration::from_secs(600))
            .unwrap()
            .with_poll_interval(Some(Duration::from_secs(60)))
            .with_cancel(Some(token.clone()));

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            token.cancel();
        });

        let started = Instant::now();
        match conf.wait_for_state(&mut refresh).await {
            Err(WaitError::Cancelled { last_status }) => {
                assert_eq!(last_status.as_deref(), Some("P"))
            }
            other => panic!("expected Cancelled, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(60));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        canceller.await.unwrap();
    }
}

// * Poll Loop Driver
// * Runs one task forever on a fixed interval; a failed iteration is logged, never fatal

use crate::ops::telemetry;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info};

/// One unit of periodic work (capture + persist + follow-ups).
pub trait PollTask {
    /// Label used in logs and metrics
    const NAME: &'static str;

    type Error: Display;

    fn poll_once(&mut self) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Drives a [`PollTask`]: iterate, sleep, repeat.
///
/// The interval is slept in full after each iteration, so a slow iteration
/// stretches the cycle rather than being cut short.
pub struct Poller<T> {
    task: T,
    interval: Duration,
    iterations: u64,
    failures: u64,
}

impl<T: PollTask> Poller<T> {
    pub fn new(task: T, interval: Duration) -> Self {
        Self {
            task,
            interval,
            iterations: 0,
            failures: 0,
        }
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Runs a single iteration and reports whether it succeeded.
    pub async fn tick(&mut self) -> bool {
        let started = Instant::now();
        let result = self.task.poll_once().await;
        self.iterations += 1;

        let ok = match result {
            Ok(()) => {
                debug!(
                    agent = T::NAME,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Iteration complete"
                );
                true
            }
            Err(e) => {
                self.failures += 1;
                error!(agent = T::NAME, error = %e, "Error in poll loop");
                false
            }
        };

        telemetry::record_poll_iteration(T::NAME, ok);
        ok
    }

    /// Runs `count` iterations, sleeping after each one.
    pub async fn run_iterations(&mut self, count: u64) {
        for _ in 0..count {
            self.tick().await;
            sleep(self.interval).await;
        }
    }

    /// Runs until the process is stopped.
    pub async fn run_forever(&mut self) {
        info!(
            agent = T::NAME,
            interval_secs = self.interval.as_secs_f64(),
            "Poll loop started"
        );
        loop {
            self.tick().await;
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // * Fails on every third call
    struct Flaky {
        calls: u32,
    }

    impl PollTask for Flaky {
        const NAME: &'static str = "flaky";
        type Error = String;

        async fn poll_once(&mut self) -> Result<(), String> {
            self.calls += 1;
            if self.calls % 3 == 0 {
                Err(format!("call {} failed", self.calls))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let mut poller = Poller::new(Flaky { calls: 0 }, Duration::ZERO);
        poller.run_iterations(7).await;

        assert_eq!(poller.iterations(), 7);
        assert_eq!(poller.failures(), 2);
        assert_eq!(poller.task().calls, 7);
    }

    #[tokio::test]
    async fn test_tick_reports_outcome() {
        let mut poller = Poller::new(Flaky { calls: 2 }, Duration::ZERO);
        assert!(!poller.tick().await);
        assert!(poller.tick().await);
    }

    #[tokio::test]
    async fn test_run_forever_keeps_going() {
        let mut poller = Poller::new(Flaky { calls: 0 }, Duration::from_millis(5));
        let _ = tokio::time::timeout(Duration::from_millis(100), poller.run_forever()).await;
        assert!(poller.iterations() >= 3);
    }
}

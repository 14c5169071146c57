//! Recurring schedules for the background jobs
//!
//! A [`RecurringSchedule`] is either a single immediate run or a fixed interval whose
//! first run is immediate. Runs never overlap: the next tick is only awaited after the
//! previous job invocation has returned, and ticks missed while a job was running are
//! delayed rather than burst. Cancellation is observed while waiting for every tick.
//!
//! Schedules are built on `tokio::time`, so tests drive them with paused time instead
//! of real wall-clock delays.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// When a background job runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecurringSchedule {
    period: Option<Duration>,
}

impl RecurringSchedule {
    /// Run exactly once, immediately
    pub fn once() -> Self {
        Self { period: None }
    }

    /// Run immediately, then every `period`
    ///
    /// A zero period degrades to [`RecurringSchedule::once`].
    pub fn every(period: Duration) -> Self {
        if period.is_zero() {
            Self::once()
        } else {
            Self {
                period: Some(period),
            }
        }
    }

    /// Build from an optional period, `None` meaning a single run
    pub fn from_period(period: Option<Duration>) -> Self {
        period.map_or_else(Self::once, Self::every)
    }

    /// The repeat period, `None` for a single run
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Whether the schedule repeats
    pub fn is_recurring(&self) -> bool {
        self.period.is_some()
    }

    /// Start a fresh ticker for this schedule
    pub fn ticker(&self) -> Ticker {
        let interval = self.period.map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Ticker {
            interval,
            fired: false,
        }
    }

    /// Invoke `job` on every tick until the schedule is exhausted or cancelled
    ///
    /// Returns the number of completed runs.
    pub async fn run<F, Fut>(&self, cancel: &CancellationToken, mut job: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = self.ticker();
        let mut runs = 0;

        while ticker.tick(cancel).await {
            job().await;
            runs += 1;
        }

        runs
    }
}

/// Stateful tick source created by [`RecurringSchedule::ticker`]
#[derive(Debug)]
pub struct Ticker {
    interval: Option<Interval>,
    fired: bool,
}

impl Ticker {
    /// Wait for the next run
    ///
    /// Returns `false` when the token is cancelled or a single-run schedule has
    /// already fired.
    pub async fn tick(&mut self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        match self.interval.as_mut() {
            None => {
                let first = !self.fired;
                self.fired = true;
                first
            }
            Some(interval) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    _ = interval.tick() => {
                        self.fired = true;
                        true
                    }
                }
            }
        }
    }
}

//! Fixed-interval tick driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{PipelineController, TickOutcome};

/// Counts of tick outcomes over one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub published: u64,
    pub skipped: u64,
    pub detection_failed: u64,
    pub cancelled: u64,
}

impl TickReport {
    pub fn total(&self) -> u64 {
        self.published + self.skipped + self.detection_failed + self.cancelled
    }

    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Published => self.published += 1,
            TickOutcome::Skipped => self.skipped += 1,
            TickOutcome::DetectionFailed => self.detection_failed += 1,
            TickOutcome::Cancelled => self.cancelled += 1,
            TickOutcome::Idle => {}
        }
    }
}

/// Calls [`PipelineController::tick`] at a fixed interval.
///
/// Sleeps go through the global time source, so a stepped clock advances by
/// exactly one interval per tick.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    tick_budget: Option<u64>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tick_budget: None,
        }
    }

    /// Stop after `ticks` ticks.
    pub fn with_tick_budget(mut self, ticks: u64) -> Self {
        self.tick_budget = Some(ticks);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick until `running` clears, the controller leaves `Running`, or the
    /// tick budget is spent.
    pub fn run(&self, controller: &PipelineController, running: &AtomicBool) -> TickReport {
        let mut report = TickReport::default();
        let clock = crate::time_source::global();

        let budget_spent = |report: &TickReport| {
            self.tick_budget
                .is_some_and(|budget| report.total() >= budget)
        };

        while running.load(Ordering::SeqCst) && controller.is_running() && !budget_spent(&report) {
            let outcome = controller.tick();
            report.record(outcome);
            if matches!(outcome, TickOutcome::Idle | TickOutcome::Cancelled) || budget_spent(&report) {
                break;
            }

            clock.sleep(self.interval);
        }

        report
    }
}

//! The bounded pool of running compilers.
//!
//! A single control flow drives everything: the scheduler only ever blocks
//! in `poll(2)` on the live cases' scratch files or in the settle delay
//! between polls. Cancellation is deadline driven; a case past its
//! terminate deadline gets SIGTERM, a case past its kill deadline gets
//! SIGKILL.

use std::thread;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::clock::Stamp;
use crate::config::TimeoutPolicy;
use crate::error::DriverError;
use crate::runner::RunningCase;
use crate::sys;

/// Live compiler invocations keyed by case name, never more than
/// `parallelism` at a time.
#[derive(Debug)]
pub struct Scheduler {
    live: FxHashMap<String, RunningCase>,
    parallelism: usize,
    policy: TimeoutPolicy,
    peak_live: usize,
}

impl Scheduler {
    /// A parallelism of zero is treated as one.
    pub fn new(parallelism: usize, policy: TimeoutPolicy) -> Self {
        Scheduler {
            live: FxHashMap::default(),
            parallelism: parallelism.max(1),
            policy,
            peak_live: 0,
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Highest live count observed so far.
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }

    pub fn is_full(&self) -> bool {
        self.live.len() >= self.parallelism
    }

    /// Block until there is room for one more case. Cases that finished
    /// while waiting are handed back.
    pub fn reserve_slot(&mut self) -> Result<Vec<RunningCase>, DriverError> {
        if self.is_full() {
            self.complete_at_least_one()
        } else {
            Ok(Vec::new())
        }
    }

    /// Add a started case. The caller must have reserved a slot.
    pub fn insert(&mut self, case: RunningCase) -> Result<(), DriverError> {
        if self.is_full() {
            return Err(DriverError::Internal(format!(
                "no free slot for '{}' (parallelism {})",
                case.name(),
                self.parallelism
            )));
        }
        if self.live.contains_key(case.name()) {
            return Err(DriverError::Internal(format!(
                "case '{}' is already running",
                case.name()
            )));
        }
        self.live.insert(case.name().to_string(), case);
        self.peak_live = self.peak_live.max(self.live.len());
        Ok(())
    }

    /// Reserve a slot, then start `case` through `start` and track it.
    pub fn submit<F>(&mut self, start: F) -> Result<Vec<RunningCase>, DriverError>
    where
        F: FnOnce() -> Result<RunningCase, DriverError>,
    {
        let finished = self.reserve_slot()?;
        self.insert(start()?)?;
        Ok(finished)
    }

    /// Wait until at least one live case finishes and return every case
    /// that did. Returns immediately when nothing is live.
    ///
    /// Fails with [`DriverError::SchedulerStall`] once the busy-loop ceiling
    /// passes without progress.
    pub fn complete_at_least_one(&mut self) -> Result<Vec<RunningCase>, DriverError> {
        if self.live.is_empty() {
            return Ok(Vec::new());
        }

        let entered = Instant::now();
        loop {
            let elapsed = entered.elapsed();
            if elapsed > self.policy.busy_loop_ceiling {
                return Err(DriverError::SchedulerStall { elapsed });
            }

            self.wait_for_output();

            let now = Stamp::now();
            let mut done = Vec::new();
            for (name, case) in &mut self.live {
                if case.poll_exit(now)? {
                    done.push(name.clone());
                } else if now.instant() > case.kill_deadline() {
                    case.kill(now)?;
                } else if now.instant() > case.terminate_deadline() {
                    case.terminate(now)?;
                }
            }

            if done.is_empty() {
                thread::sleep(self.policy.settle_delay);
                continue;
            }

            let finished: Vec<RunningCase> =
                done.iter().filter_map(|name| self.live.remove(name)).collect();
            for case in &finished {
                tracing::debug!(case = case.name(), "compiler finished");
            }
            return Ok(finished);
        }
    }

    /// Harvest until nothing is live.
    pub fn drain(&mut self) -> Result<Vec<RunningCase>, DriverError> {
        let mut finished = Vec::new();
        while !self.live.is_empty() {
            finished.extend(self.complete_at_least_one()?);
        }
        Ok(finished)
    }

    /// Block in `poll(2)` on every live scratch file, for at most the
    /// terminate timeout. Regular files are always readable, so this rarely
    /// waits; the settle delay paces the loop instead.
    fn wait_for_output(&self) {
        let fds: Vec<_> = self
            .live
            .values()
            .flat_map(RunningCase::output_fds)
            .collect();
        if let Err(e) = sys::poll_readable(&fds, self.policy.terminate) {
            tracing::trace!(error = %e, "poll on scratch files failed");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for case in self.live.values_mut() {
            tracing::debug!(case = case.name(), "killing abandoned compiler");
            case.abandon();
        }
    }
}

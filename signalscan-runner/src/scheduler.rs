//! Background refresh: re-run a scan job on a fixed period.
//!
//! The job runs on a named worker thread. Each invocation is independent;
//! anything shared between runs (the alert log) must be captured by the job.
//! `stop()` is observed between sleeps in short slices, so shutdown does not
//! wait for a full period.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const STOP_POLL: Duration = Duration::from_millis(50);

pub struct RefreshScheduler {
    stop: Arc<AtomicBool>,
    runs: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Run `job` immediately and then every `interval` until stopped.
    ///
    /// The job receives the 1-based run number and returns whether the
    /// scheduler should keep going.
    pub fn spawn<F>(interval: Duration, mut job: F) -> std::io::Result<Self>
    where
        F: FnMut(usize) -> bool + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let runs = Arc::new(AtomicUsize::new(0));

        let worker_stop = Arc::clone(&stop);
        let worker_runs = Arc::clone(&runs);
        let handle = thread::Builder::new()
            .name("signalscan-refresh".into())
            .spawn(move || {
                while !worker_stop.load(Ordering::Relaxed) {
                    let started = Instant::now();
                    let run = worker_runs.fetch_add(1, Ordering::Relaxed) + 1;
                    if !job(run) {
                        tracing::debug!(run, "refresh job requested stop");
                        break;
                    }

                    let deadline = started + interval;
                    while !worker_stop.load(Ordering::Relaxed) {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        thread::sleep(STOP_POLL.min(deadline - now));
                    }
                }
                worker_stop.store(true, Ordering::Relaxed);
            })?;

        tracing::info!(interval_secs = interval.as_secs_f64(), "refresh scheduler started");
        Ok(Self {
            stop,
            runs,
            handle: Some(handle),
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }

    /// Signal the worker to stop and wait for the current run to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("refresh worker panicked");
            }
            tracing::info!(runs = self.runs(), "refresh scheduler stopped");
        }
    }

    /// Block until the job itself ends the schedule.
    pub fn join(mut self) -> usize {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("refresh worker panicked");
            }
        }
        self.runs()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

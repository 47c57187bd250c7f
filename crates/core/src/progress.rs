//! Shared progress state for in-flight uploads
//!
//! The upload loop mutates atomic byte counters; a periodic observer task
//! reads them. Atomics keep the observer safe against torn reads no matter
//! where the upload loop currently is.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Live counters for one upload run.
///
/// Shared between the upload engine (writer) and the progress observer
/// (reader). Cancellation is cooperative: setting the flag never interrupts
/// an in-flight chunk send; the engine observes it at loop boundaries.
#[derive(Debug)]
pub struct UploadProgress {
    processed: AtomicU64,
    total: AtomicU64,
    ticks: AtomicU64,
    interval: Duration,
    cancelled: AtomicBool,
    done: AtomicBool,
}

impl UploadProgress {
    pub fn new(total: u64, interval: Duration) -> Self {
        Self {
            processed: AtomicU64::new(0),
            total: AtomicU64::new(total),
            ticks: AtomicU64::new(0),
            interval,
            cancelled: AtomicBool::new(false),
            done: AtomicBool::new(false),
        }
    }

    /// Record bytes confirmed by the server. Only ever increases.
    pub fn add_bytes(&self, delta: u64) {
        self.processed.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn processed_bytes(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Ask the engine to stop at the next loop boundary. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_done(&self) {
        self.done.store(true, Ordering::Relaxed);
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    /// Advance the elapsed-interval counter. Called by the observer task.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Completion fraction in [0, 1]. Zero-byte uploads report 0 here and
    /// complete through the non-chunked path instead.
    pub fn fraction(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            return 0.0;
        }
        (self.processed_bytes() as f64 / total as f64).min(1.0)
    }

    /// Average transfer speed in bytes per second.
    ///
    /// Undefined before the first measurement interval has elapsed.
    pub fn speed(&self) -> Option<f64> {
        let ticks = self.ticks.load(Ordering::Relaxed);
        if ticks == 0 {
            return None;
        }
        let elapsed = ticks as f64 * self.interval.as_secs_f64();
        Some(self.processed_bytes() as f64 / elapsed)
    }

    /// Estimated seconds until completion, when a speed is known.
    pub fn eta_secs(&self) -> Option<f64> {
        let speed = self.speed()?;
        if speed <= 0.0 {
            return None;
        }
        let remaining = self.total_bytes().saturating_sub(self.processed_bytes());
        Some(remaining as f64 / speed)
    }

    /// Point-in-time copy for rendering.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed_bytes: self.processed_bytes(),
            total_bytes: self.total_bytes(),
            fraction: self.fraction(),
            speed: self.speed(),
            eta_secs: self.eta_secs(),
            done: self.is_done(),
        }
    }
}

/// A torn-read-free view of the progress counters
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub processed_bytes: u64,
    pub total_bytes: u64,
    pub fraction: f64,
    pub speed: Option<f64>,
    pub eta_secs: Option<f64>,
    pub done: bool,
}

/// Periodic observer task handle.
///
/// Ticks the progress counters on a fixed interval and hands a snapshot to
/// the observer callback. Dropping the guard aborts the task, which is what
/// guarantees the reporter stops on every engine exit path.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: tokio::task::JoinHandle<()>,
}

impl ProgressTicker {
    pub fn spawn<F>(progress: Arc<UploadProgress>, observer: F) -> Self
    where
        F: Fn(ProgressSnapshot) + Send + Sync + 'static,
    {
        let interval = progress.interval;
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // The first tick of tokio's interval fires immediately; skip it
            // so speed accounting starts after one full interval.
            timer.tick().await;
            loop {
                timer.tick().await;
                if progress.is_done() {
                    break;
                }
                progress.tick();
                observer(progress.snapshot());
            }
        });
        Self { handle }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

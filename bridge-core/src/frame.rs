//! One-shot tasks deferred to the next rendering frame boundary.
//!
//! A request returns a [`FrameHandle`]. Dropping the handle before the frame
//! fires cancels the task, so a page that is torn down simply drops its handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle to a task waiting for the next frame.
///
/// Dropping it cancels the task if it has not run yet.
#[derive(Debug)]
pub struct FrameHandle {
    live: Arc<AtomicBool>,
}

impl FrameHandle {
    /// Whether the task is still waiting for its frame.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Cancel the task explicitly.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct Pending<T> {
    live: Arc<AtomicBool>,
    task: T,
}

/// Queue of tasks waiting for the next frame boundary.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    pending: Vec<Pending<T>>,
    frame: u64,
}

impl<T> FrameScheduler<T> {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            frame: 0,
        }
    }

    /// Defer `task` to the next frame boundary.
    #[must_use = "dropping the handle cancels the task"]
    pub fn request(&mut self, task: T) -> FrameHandle {
        let live = Arc::new(AtomicBool::new(true));
        self.pending.push(Pending {
            live: Arc::clone(&live),
            task,
        });
        FrameHandle { live }
    }

    /// Cross a frame boundary, returning every task still live, in request order.
    ///
    /// Tasks requested while handling the returned ones wait for the next frame.
    pub fn advance(&mut self) -> Vec<T> {
        self.frame += 1;
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|p| p.live.swap(false, Ordering::AcqRel))
            .map(|p| p.task)
            .collect()
    }

    /// Number of frame boundaries crossed.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of queued tasks, including cancelled ones not yet swept.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

//! Mutex-guarded tracker handle.
//!
//! A navigation session owns exactly one tracker and feeds it one fix at a
//! time. Hosts that hand the session across threads use [`SharedTracker`],
//! which takes a single lock per call so an update can never interleave with
//! a query.

use std::sync::{Arc, Mutex};

use crate::tracker::RouteTracker;

/// Cloneable, thread-safe handle to one [`RouteTracker`].
#[derive(Debug, Clone)]
pub struct SharedTracker {
    inner: Arc<Mutex<RouteTracker>>,
}

impl SharedTracker {
    pub fn new(tracker: RouteTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Run `f` with exclusive access to the tracker.
    ///
    /// A panic inside a previous call poisons the mutex; the tracker state is
    /// still consistent between calls, so the guard is recovered.
    pub fn with_tracker<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RouteTracker) -> R,
    {
        let mut tracker = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut tracker)
    }
}

impl From<RouteTracker> for SharedTracker {
    fn from(tracker: RouteTracker) -> Self {
        Self::new(tracker)
    }
}

//! # In-flight async job tracker.
//!
//! Records which async jobs are still running so that shutdown can report
//! the stuck ones. An entry lives as long as its [`InFlightGuard`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct State {
    next: AtomicU64,
    jobs: Mutex<BTreeMap<u64, Arc<str>>>,
}

impl State {
    fn jobs(&self) -> MutexGuard<'_, BTreeMap<u64, Arc<str>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Thread-safe set of running async jobs.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    state: Arc<State>,
}

impl InFlight {
    /// Registers a running job; it is removed when the guard drops.
    pub(crate) fn enter(&self, job: Arc<str>) -> InFlightGuard {
        let id = self.state.next.fetch_add(1, Ordering::Relaxed);
        self.state.jobs().insert(id, job);
        InFlightGuard {
            id,
            state: Arc::clone(&self.state),
        }
    }

    /// Returns descriptions of running jobs in start order.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        self.state.jobs().values().map(|j| j.to_string()).collect()
    }
}

/// Removes its job from the tracker on drop.
pub(crate) struct InFlightGuard {
    id: u64,
    state: Arc<State>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.jobs().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_controls_membership() {
        let tracker = InFlight::default();
        let a = tracker.enter("sleep".into());
        let b = tracker.enter("sleep".into());
        let _c = tracker.enter("watch".into());
        assert_eq!(tracker.snapshot(), ["sleep", "sleep", "watch"]);

        drop(a);
        drop(b);
        assert_eq!(tracker.snapshot(), ["watch"]);
    }
}

//! Effect Implementation
//!
//! An Effect is a re-runnable side-effecting job. A mounted component owns a
//! render effect: running it renders the wrapped component against the
//! current store.
//!
//! # How Effects Work
//!
//! 1. `execute` runs the job right away.
//!
//! 2. `invalidate` marks the job as pending without running it. `flush` runs
//!    a pending job exactly once, however many times it was invalidated.
//!    This is how store writes made during a dispatch collapse into a single
//!    render after the dispatch has finished.
//!
//! 3. After `dispose` the job never runs again. Disposal is how an unmounted
//!    component ignores late store writes.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A re-runnable job that can be deferred and disposed.
///
/// Clones share state: disposing one clone disposes them all.
pub struct Effect {
    /// Unique identifier for this effect.
    id: u64,

    run: Arc<dyn Fn() + Send + Sync>,

    /// Set by `invalidate`, cleared when the job runs.
    pending: Arc<AtomicBool>,

    disposed: Arc<AtomicBool>,

    run_count: Arc<AtomicUsize>,
}

impl Effect {
    /// Create an effect without running it.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: next_effect_id(),
            run: Arc::new(run),
            pending: Arc::new(AtomicBool::new(false)),
            disposed: Arc::new(AtomicBool::new(false)),
            run_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run the job now. Returns whether it ran.
    pub fn execute(&self) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.pending.store(false, Ordering::SeqCst);
        (self.run)();
        self.run_count.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Mark the job as needing a run.
    pub fn invalidate(&self) {
        if !self.is_disposed() {
            self.pending.store(true, Ordering::SeqCst);
        }
    }

    /// Run the job if it was invalidated. Returns whether it ran.
    pub fn flush(&self) -> bool {
        if self.pending.swap(false, Ordering::SeqCst) {
            self.execute()
        } else {
            false
        }
    }

    /// Stop the effect for good.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            run: Arc::clone(&self.run),
            pending: Arc::clone(&self.pending),
            disposed: Arc::clone(&self.disposed),
            run_count: Arc::clone(&self.run_count),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

//! Signal Implementation
//!
//! A Signal holds a value and notifies its subscribers whenever the value is
//! replaced. Mounted components keep their store in a `Signal<Value>`: the
//! store cursor writes into it, and the component's subscription decides when
//! to re-render.
//!
//! # How Signals Work
//!
//! 1. `subscribe` registers a listener and returns a [`Subscription`].
//!
//! 2. `set` replaces the value, bumps the version, and calls every listener
//!    with the new value, in subscription order.
//!
//! 3. Dropping the subscription removes the listener.
//!
//! # Locking
//!
//! Listeners are called after every lock has been released. A listener may
//! read the signal, set it again, or drop its own subscription.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::subscriber::{SubscriberId, Subscription};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Listeners<T> = Arc<RwLock<Vec<(SubscriberId, Listener<T>)>>>;

/// A reactive cell holding a value of type `T`.
///
/// Cloning a signal yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use lattice_store::reactive::Signal;
///
/// let count = Signal::new(0);
/// let _subscription = count.subscribe(|value| println!("count is {value}"));
///
/// count.set(5); // prints "count is 5"
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    value: Arc<RwLock<T>>,

    /// Incremented on every `set`.
    version: Arc<AtomicU64>,

    listeners: Listeners<T>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            version: Arc::new(AtomicU64::new(0)),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value for the duration of `f`.
    ///
    /// `f` must not set this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Number of times the value has been replaced.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Replace the value and notify every listener.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            *guard = value.clone();
        }
        self.version.fetch_add(1, Ordering::SeqCst);
        self.notify(&value);
    }

    /// Register a listener called with every new value.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.listeners.write().push((id, Arc::new(listener)));

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(id, move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.write().retain(|(existing, _)| *existing != id);
            }
        })
    }

    /// Get the number of listeners.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn notify(&self, value: &T) {
        // Snapshot so listeners can (un)subscribe while being notified.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            version: Arc::clone(&self.version),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.get())
            .field("version", &self.version())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

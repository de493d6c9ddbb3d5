//! Dispatcher
//!
//! The dispatcher routes events to named handlers. It holds:
//!
//! - the merged handler table, built by `initialize` from handler groups;
//! - an optional observer, called after every successful dispatch;
//! - the current store cursor, handed to handlers;
//! - the render listener, told when the outermost dispatch has finished.
//!
//! # Dispatch Order
//!
//! For one `dispatch` call:
//!
//! 1. the handler for `event.event_type` runs to completion;
//! 2. if it succeeded, the observer runs with the same event;
//! 3. if this was the outermost dispatch, the listener is notified, which is
//!    where a mounted component re-renders. This also happens when the
//!    handler panics.
//!
//! An unknown event type fails with [`DispatchError::HandlerNotFound`]; the
//! observer is not called. A handler error is returned unchanged and the
//! observer is skipped.
//!
//! # Reentrancy
//!
//! No lock is held while a handler, the observer or the listener runs, so a
//! handler may dispatch further events or reconfigure the dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::event::Event;
use crate::error::{DispatchError, DispatchResult};
use crate::store::Cursor;

/// A handler: receives the event and a context exposing the store cursor.
pub type Handler = Arc<dyn Fn(&Event, &HandlerContext<'_>) -> DispatchResult<Value> + Send + Sync>;

/// Called with the original event after every successful dispatch.
pub type Observer = Arc<dyn Fn(&Event) + Send + Sync>;

/// Notified when the outermost dispatch on a dispatcher has returned.
pub trait DispatchListener: Send + Sync {
    fn dispatch_settled(&self);
}

/// An ordered set of named handlers.
///
/// # Example
///
/// ```rust
/// use lattice_store::dispatch::HandlerGroup;
/// use serde_json::Value;
///
/// let group = HandlerGroup::new().on("push", |event, ctx| {
///     ctx.store()?.refine("letters").unshift(event.data.clone())?;
///     Ok(Value::Null)
/// });
/// assert!(group.contains("push"));
/// ```
#[derive(Clone, Default)]
pub struct HandlerGroup {
    handlers: IndexMap<String, Handler>,
}

impl HandlerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler, replacing any handler of the same name in this group.
    pub fn on<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Event, &HandlerContext<'_>) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.insert(name, handler);
        self
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Event, &HandlerContext<'_>) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Handler)> {
        self.handlers.iter().map(|(name, handler)| (name.as_str(), handler))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handlers.keys()).finish()
    }
}

/// What a handler can reach while it runs.
pub struct HandlerContext<'a> {
    store: Option<Cursor>,
    dispatcher: &'a Dispatcher,
}

impl<'a> HandlerContext<'a> {
    /// The cursor over the current store.
    ///
    /// Fails with [`DispatchError::NoStore`] when no component has attached
    /// a store yet (or after `reset`).
    pub fn store(&self) -> DispatchResult<&Cursor> {
        self.store.as_ref().ok_or(DispatchError::NoStore)
    }

    /// The cursor over the current store, if any.
    pub fn try_store(&self) -> Option<&Cursor> {
        self.store.as_ref()
    }

    /// The dispatcher running this handler.
    pub fn dispatcher(&self) -> &'a Dispatcher {
        self.dispatcher
    }

    /// Dispatch another event from inside this handler.
    pub fn dispatch(&self, event: Event) -> DispatchResult<Value> {
        self.dispatcher.dispatch(event)
    }
}

#[derive(Default)]
struct DispatcherState {
    handlers: IndexMap<String, Handler>,
    observer: Option<Observer>,
    store: Option<Cursor>,
    listener: Option<Weak<dyn DispatchListener>>,
}

/// Routes events to handlers and hands them the store.
#[derive(Default)]
pub struct Dispatcher {
    state: RwLock<DispatcherState>,

    /// Number of dispatches currently on the stack.
    depth: AtomicUsize,
}

/// One level of dispatch on a dispatcher.
///
/// Dropping the outermost scope settles the dispatcher, also when a handler
/// or the observer unwinds, so deferred renders are never left behind.
struct DispatchScope<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> DispatchScope<'a> {
    fn enter(dispatcher: &'a Dispatcher) -> Self {
        dispatcher.depth.fetch_add(1, Ordering::SeqCst);
        Self { dispatcher }
    }
}

impl Drop for DispatchScope<'_> {
    fn drop(&mut self) {
        if self.dispatcher.depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            if std::thread::panicking() {
                debug!("settling dispatcher after a panicking handler");
            }
            self.dispatcher.settle();
        }
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the handler table and the observer.
    ///
    /// Groups are merged in order; a later group's handler replaces an
    /// earlier one of the same name. The store cursor is left alone.
    pub fn initialize(&self, handler_groups: &[HandlerGroup], on_dispatch: Option<Observer>) {
        let mut handlers = IndexMap::new();
        for group in handler_groups {
            for (name, handler) in group.iter() {
                handlers.insert(name.to_owned(), Arc::clone(handler));
            }
        }
        debug!(
            handlers = handlers.len(),
            observer = on_dispatch.is_some(),
            "dispatcher initialized"
        );

        let mut state = self.state.write();
        state.handlers = handlers;
        state.observer = on_dispatch;
    }

    /// Route `event` to its handler and return the handler's result.
    pub fn dispatch(&self, event: Event) -> DispatchResult<Value> {
        let (handler, observer, store) = {
            let state = self.state.read();
            let Some(handler) = state.handlers.get(&event.event_type) else {
                warn!(event_type = %event.event_type, "no handler registered for event");
                return Err(DispatchError::HandlerNotFound {
                    event_type: event.event_type,
                });
            };
            (Arc::clone(handler), state.observer.clone(), state.store.clone())
        };

        trace!(event_type = %event.event_type, has_store = store.is_some(), "dispatching");

        let _scope = DispatchScope::enter(self);
        let context = HandlerContext {
            store,
            dispatcher: self,
        };
        let result = handler(&event, &context);
        if result.is_ok() {
            if let Some(observer) = observer {
                observer(&event);
            }
        }
        result
    }

    /// Forget the handlers, the observer, the store cursor and the listener.
    pub fn reset(&self) {
        *self.state.write() = DispatcherState::default();
        debug!("dispatcher reset");
    }

    /// The current store cursor.
    pub fn store(&self) -> Option<Cursor> {
        self.state.read().store.clone()
    }

    pub fn has_store(&self) -> bool {
        self.state.read().store.is_some()
    }

    /// Point handlers at a new store cursor.
    pub fn set_store(&self, cursor: Cursor) {
        self.state.write().store = Some(cursor);
    }

    pub fn clear_store(&self) {
        self.state.write().store = None;
    }

    /// Register the listener told when the outermost dispatch returns.
    pub fn set_listener(&self, listener: Weak<dyn DispatchListener>) {
        self.state.write().listener = Some(listener);
    }

    pub fn clear_listener(&self) {
        self.state.write().listener = None;
    }

    /// Detach `listener` and the store it attached, if it is still the
    /// registered listener. Returns whether it was.
    pub fn detach(&self, listener: &Weak<dyn DispatchListener>) -> bool {
        let mut state = self.state.write();
        let current = state
            .listener
            .as_ref()
            .is_some_and(|registered| Weak::ptr_eq(registered, listener));
        if current {
            state.listener = None;
            state.store = None;
        }
        current
    }

    /// Whether a dispatch is running on this dispatcher.
    pub fn is_dispatching(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    pub fn has_handler(&self, event_type: &str) -> bool {
        self.state.read().handlers.contains_key(event_type)
    }

    /// Names in the merged handler table, in registration order.
    pub fn handler_names(&self) -> Vec<String> {
        self.state.read().handlers.keys().cloned().collect()
    }

    pub fn has_observer(&self) -> bool {
        self.state.read().observer.is_some()
    }

    fn settle(&self) {
        let listener = self.state.read().listener.as_ref().and_then(Weak::upgrade);
        if let Some(listener) = listener {
            listener.dispatch_settled();
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Dispatcher")
            .field("handlers", &state.handlers.keys().collect::<Vec<_>>())
            .field("observer", &state.observer.is_some())
            .field("store", &state.store.is_some())
            .field("depth", &self.depth.load(Ordering::SeqCst))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

//! Event Dispatch
//!
//! The dispatcher and the actions built on top of it.
//!
//! # Concepts
//!
//! ## Events and handlers
//!
//! An [`Event`] names a handler through its `event_type`. Handlers are
//! registered in [`HandlerGroup`]s; the [`Dispatcher`] merges the groups in
//! order into one table, later names replacing earlier ones.
//!
//! A handler is called as `handler(&event, &context)`. The
//! [`HandlerContext`] exposes the store cursor, so a handler never holds the
//! store directly and every write it makes is reported to the component that
//! owns the store.
//!
//! ## Observer
//!
//! An optional observer is called with the original event after each
//! successful dispatch. It is meant for logging and analytics.
//!
//! ## Actions
//!
//! [`Actions`] is a table of named callables. Each handler name gets a
//! forwarding action that dispatches the matching event; explicit
//! [`ActionGroup`]s override forwarders of the same name.

mod actions;
mod dispatcher;
mod event;

pub use actions::{initialize_actions, reset_actions, ActionFn, ActionGroup, ActionKind, Actions};
pub use dispatcher::{
    DispatchListener, Dispatcher, Handler, HandlerContext, HandlerGroup, Observer,
};
pub use event::Event;

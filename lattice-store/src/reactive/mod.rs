//! Reactive Primitives
//!
//! The small reactive core a mounted component is built from.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a container for mutable state. Setting it notifies every
//! subscriber with the new value. A mounted component keeps its store in a
//! signal, and the store cursor writes into that signal.
//!
//! ## Effects
//!
//! An [`Effect`] is a re-runnable side effect that can be deferred
//! (`invalidate` + `flush`) and disposed. A mounted component's render is an
//! effect: store writes during a dispatch invalidate it, and it is flushed
//! once the dispatch is over.
//!
//! ## Subscriptions
//!
//! Subscribing to a signal returns a [`Subscription`]. Dropping it
//! unregisters the listener, which is how an unmounted component stops
//! hearing about the store.

mod effect;
mod signal;
mod subscriber;

pub use effect::Effect;
pub use signal::Signal;
pub use subscriber::{SubscriberId, Subscription};

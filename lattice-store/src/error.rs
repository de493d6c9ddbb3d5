//! Error types for the store and dispatcher.
//!
//! Two families exist:
//!
//! - [`StoreError`] is raised by cursor reads and mutations when a path does
//!   not resolve or the value at the path has the wrong shape.
//! - [`DispatchError`] is raised by [`Dispatcher::dispatch`] and action calls.
//!   Handlers return it too, so a store error inside a handler can be
//!   propagated with `?`.
//!
//! There is no recovery layer. A failing handler's error reaches the caller
//! of `dispatch` unchanged.
//!
//! [`Dispatcher::dispatch`]: crate::dispatch::Dispatcher::dispatch

use std::error::Error as StdError;

use thiserror::Error;

use crate::store::Path;

/// Errors raised while reading or mutating the store through a cursor.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A segment of the cursor's path does not exist in the store.
    #[error("no value at path {path}")]
    PathNotFound { path: Path },

    /// The value at the path is not of the shape the operation needs.
    #[error("expected {expected} at path {path}, found {found}")]
    TypeMismatch {
        path: Path,
        expected: &'static str,
        found: &'static str,
    },

    /// An array index lies past the end of the array.
    #[error("index {index} out of bounds at path {path} (length {len})")]
    IndexOutOfBounds { path: Path, index: usize, len: usize },

    /// Converting between a typed value and the store representation failed.
    #[error("store value conversion failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors raised by the dispatcher, actions and event handlers.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the event type.
    #[error("no handler registered for event type `{event_type}`")]
    HandlerNotFound { event_type: String },

    /// No action is registered under the name.
    #[error("no action named `{name}`")]
    ActionNotFound { name: String },

    /// A handler asked for the store cursor but none is attached.
    #[error("no store is attached to the dispatcher")]
    NoStore,

    /// A cursor operation inside a handler failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A handler failed for its own reasons.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn StdError + Send + Sync>),
}

impl DispatchError {
    /// Wrap an arbitrary error raised by a handler.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Handler(err.into())
    }

    /// Build a handler error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Handler(message.into().into())
    }

    /// Whether this is the "unknown event type" condition.
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type DispatchResult<T> = Result<T, DispatchError>;

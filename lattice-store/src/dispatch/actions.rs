//! Actions
//!
//! Actions are named callables that mirror the dispatcher's handlers, so
//! that `actions.call("push", "c")` reads as a plain function call while
//! doing `dispatcher.dispatch({type: "push", data: "c"})` underneath.
//!
//! An action table is built by [`initialize_actions`] from two sources:
//!
//! 1. one forwarding action per distinct handler name across all handler
//!    groups;
//! 2. explicit override groups, installed afterwards, so an override always
//!    replaces the forwarder of the same name. Between override groups the
//!    later group wins.
//!
//! [`reset_actions`] empties a table.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::dispatcher::{Dispatcher, HandlerGroup};
use super::event::Event;
use crate::error::{DispatchError, DispatchResult};

/// The callable behind an action: `(dispatcher, data, options) -> result`.
pub type ActionFn =
    Arc<dyn Fn(&Dispatcher, Value, Map<String, Value>) -> DispatchResult<Value> + Send + Sync>;

/// Where an action came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Generated from a handler name; dispatches the matching event.
    Forwarding,
    /// Supplied explicitly.
    Override,
}

#[derive(Clone)]
struct Action {
    kind: ActionKind,
    call: ActionFn,
}

/// An ordered set of explicit actions.
#[derive(Clone, Default)]
pub struct ActionGroup {
    actions: IndexMap<String, ActionFn>,
}

impl ActionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action, replacing any action of the same name in this group.
    pub fn on<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Dispatcher, Value, Map<String, Value>) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for ActionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.actions.keys()).finish()
    }
}

/// A table of callable actions bound to one dispatcher.
#[derive(Clone)]
pub struct Actions {
    dispatcher: Arc<Dispatcher>,
    table: IndexMap<String, Action>,
}

impl Actions {
    /// An empty table.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            table: IndexMap::new(),
        }
    }

    /// Call an action with just a payload.
    pub fn call(&self, name: &str, data: impl Into<Value>) -> DispatchResult<Value> {
        self.call_with(name, data, Map::new())
    }

    /// Call an action with a payload and named options.
    ///
    /// For a forwarding action the options become extra fields of the
    /// dispatched event.
    pub fn call_with(
        &self,
        name: &str,
        data: impl Into<Value>,
        options: Map<String, Value>,
    ) -> DispatchResult<Value> {
        let action = self
            .table
            .get(name)
            .ok_or_else(|| DispatchError::ActionNotFound {
                name: name.to_owned(),
            })?;
        trace!(action = name, kind = ?action.kind, "calling action");
        (action.call)(self.dispatcher.as_ref(), data.into(), options)
    }

    /// Install an action under `name`, replacing whatever was there.
    pub fn insert<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: Fn(&Dispatcher, Value, Map<String, Value>) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.table.insert(
            name.into(),
            Action {
                kind: ActionKind::Override,
                call: Arc::new(action),
            },
        );
    }

    /// The callable installed under `name`.
    pub fn get(&self, name: &str) -> Option<&ActionFn> {
        self.table.get(name).map(|action| &action.call)
    }

    pub fn kind(&self, name: &str) -> Option<ActionKind> {
        self.table.get(name).map(|action| action.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The dispatcher these actions call into.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(name, action)| (name, action.kind)))
            .finish()
    }
}

fn forwarder(name: &str) -> ActionFn {
    let event_type = name.to_owned();
    Arc::new(move |dispatcher: &Dispatcher, data: Value, options: Map<String, Value>| {
        dispatcher.dispatch(Event::with_options(event_type.clone(), data, options))
    })
}

/// Build the action table for `dispatcher`.
pub fn initialize_actions(
    dispatcher: &Arc<Dispatcher>,
    handler_groups: &[HandlerGroup],
    overrides: &[ActionGroup],
) -> Actions {
    let mut actions = Actions::new(Arc::clone(dispatcher));

    for name in handler_groups.iter().flat_map(|group| group.names()) {
        if !actions.table.contains_key(name) {
            actions.table.insert(
                name.to_owned(),
                Action {
                    kind: ActionKind::Forwarding,
                    call: forwarder(name),
                },
            );
        }
    }

    for group in overrides {
        for (name, call) in &group.actions {
            actions.table.insert(
                name.clone(),
                Action {
                    kind: ActionKind::Override,
                    call: Arc::clone(call),
                },
            );
        }
    }

    debug!(actions = actions.len(), "actions initialized");
    actions
}

/// Remove every action from `actions`.
pub fn reset_actions(actions: &mut Actions) {
    actions.table.clear();
    debug!("actions reset");
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

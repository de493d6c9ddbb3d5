//! Binding configuration.
//!
//! A [`BindingConfig`] is captured once by [`bind`](super::bind) and reused
//! every time a component mounts or the binding is reset.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::dispatch::{ActionGroup, Event, HandlerGroup, Observer};
use crate::error::StoreResult;

/// Everything a binding needs: the initial store, the handler groups, the
/// action overrides and the optional observer.
///
/// # Example
///
/// ```rust
/// use lattice_store::binding::BindingConfig;
/// use lattice_store::dispatch::HandlerGroup;
/// use serde_json::{json, Value};
///
/// let config = BindingConfig::new()
///     .with_store(json!({"letters": ["a", "b"]}))
///     .handlers(HandlerGroup::new().on("clear", |_, ctx| {
///         ctx.store()?.refine("letters").set(json!([]))?;
///         Ok(Value::Null)
///     }))
///     .on_dispatch(|event| println!("dispatched {}", event.event_type));
///
/// assert_eq!(config.handler_groups().len(), 1);
/// ```
#[derive(Clone)]
pub struct BindingConfig {
    store: Value,
    handler_groups: Vec<HandlerGroup>,
    action_overrides: Vec<ActionGroup>,
    on_dispatch: Option<Observer>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            store: Value::Object(Map::new()),
            handler_groups: Vec::new(),
            action_overrides: Vec::new(),
            on_dispatch: None,
        }
    }
}

impl BindingConfig {
    /// An empty configuration: store `{}`, no handlers, no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `store` as the initial store.
    pub fn with_store(mut self, store: Value) -> Self {
        self.store = store;
        self
    }

    /// Use the serialized form of `store` as the initial store.
    pub fn store_from<T: Serialize>(self, store: &T) -> StoreResult<Self> {
        Ok(self.with_store(serde_json::to_value(store)?))
    }

    /// Append a handler group. Later groups win on name collisions.
    pub fn handlers(mut self, group: HandlerGroup) -> Self {
        self.handler_groups.push(group);
        self
    }

    /// Append an action override group. Later groups win on name collisions.
    pub fn overrides(mut self, group: ActionGroup) -> Self {
        self.action_overrides.push(group);
        self
    }

    /// Observe every successful dispatch.
    pub fn on_dispatch<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.on_dispatch = Some(Arc::new(observer));
        self
    }

    pub fn store(&self) -> &Value {
        &self.store
    }

    pub fn handler_groups(&self) -> &[HandlerGroup] {
        &self.handler_groups
    }

    pub fn action_overrides(&self) -> &[ActionGroup] {
        &self.action_overrides
    }

    pub fn observer(&self) -> Option<&Observer> {
        self.on_dispatch.as_ref()
    }
}

impl fmt::Debug for BindingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingConfig")
            .field("store", &self.store)
            .field("handler_groups", &self.handler_groups)
            .field("action_overrides", &self.action_overrides)
            .field("on_dispatch", &self.on_dispatch.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Todos {
        items: Vec<String>,
        done: usize,
    }

    #[test]
    fn default_store_is_an_empty_object() {
        let config = BindingConfig::new();
        assert_eq!(config.store(), &json!({}));
        assert!(config.handler_groups().is_empty());
        assert!(config.action_overrides().is_empty());
        assert!(config.observer().is_none());
    }

    #[test]
    fn store_from_serializes_typed_state() {
        let config = BindingConfig::new()
            .store_from(&Todos {
                items: vec!["write docs".into()],
                done: 0,
            })
            .unwrap();

        assert_eq!(config.store(), &json!({"items": ["write docs"], "done": 0}));
    }

    #[test]
    fn groups_keep_their_order() {
        let config = BindingConfig::new()
            .handlers(HandlerGroup::new().on("a", |_, _| Ok(Value::Null)))
            .handlers(HandlerGroup::new().on("b", |_, _| Ok(Value::Null)))
            .overrides(ActionGroup::new().on("c", |_, _, _| Ok(Value::Null)));

        let names: Vec<&str> = config
            .handler_groups()
            .iter()
            .flat_map(|group| group.names())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(config.action_overrides().len(), 1);
    }
}

//! Events routed by the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed event: `{ "type": ..., "data": ..., ..options }`.
///
/// `event_type` selects the handler. `data` is the main payload and
/// `options` carries any additional named fields. On the wire the options
/// sit next to `type` and `data`, so an option can never be named `type`
/// or `data`; the constructors drop such keys.
///
/// ```rust
/// use lattice_store::dispatch::Event;
/// use serde_json::json;
///
/// let event: Event = serde_json::from_value(json!({
///     "type": "optionalArgs",
///     "data": 1,
///     "arg2": 2,
/// }))
/// .unwrap();
///
/// assert_eq!(event.event_type, "optionalArgs");
/// assert_eq!(event.option("arg2"), Some(&json!(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub data: Value,

    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// Keys owned by the event itself.
const RESERVED_KEYS: [&str; 2] = ["type", "data"];

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: impl Into<Value>) -> Self {
        Self::with_options(event_type, data, Map::new())
    }

    pub fn with_options(
        event_type: impl Into<String>,
        data: impl Into<Value>,
        mut options: Map<String, Value>,
    ) -> Self {
        options.retain(|key, _| !is_reserved(key));
        Self {
            event_type: event_type.into(),
            data: data.into(),
            options,
        }
    }

    /// Add one named option. A reserved key is ignored.
    pub fn option_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.options.insert(key, value.into());
        }
        self
    }

    /// Look up a named option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

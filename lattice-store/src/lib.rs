//! Lattice Store
//!
//! This crate binds a mutable application store to Lattice components
//! through an event dispatcher. It provides:
//!
//! - A store cursor: a scoped view onto part of the store that reports every
//!   write
//! - A dispatcher routing typed events to named handlers, each handler
//!   receiving the store cursor
//! - Actions: named callables that dispatch the matching event
//! - A binding that mounts a component, re-renders it when the store changes,
//!   and can be reset between test cases
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: signals, effects and subscriptions used by mounted components
//! - `store`: store paths and cursors
//! - `dispatch`: events, the dispatcher and actions
//! - `binding`: configuration, components and the mount lifecycle
//!
//! # Example
//!
//! ```rust
//! use lattice_store::binding::{bind, component_fn, BindingConfig};
//! use lattice_store::dispatch::{Event, HandlerGroup};
//! use serde_json::{json, Value};
//!
//! let handlers = HandlerGroup::new()
//!     .on("push", |event, ctx| {
//!         ctx.store()?.refine("letters").unshift(event.data.clone())?;
//!         Ok(json!(format!("pushed {}", event.data)))
//!     })
//!     .on("remove", |event, ctx| {
//!         let index = event.data.as_u64().unwrap_or_default() as usize;
//!         ctx.store()?.refine("letters").splice(index, 1, vec![])?;
//!         Ok(Value::Null)
//!     });
//!
//! let app = bind(
//!     BindingConfig::new()
//!         .with_store(json!({"letters": ["a", "b"]}))
//!         .handlers(handlers),
//! )
//! .wrap(component_fn(|_: &(), store: &Value| store["letters"].clone()));
//!
//! let mounted = app.mount(());
//!
//! app.dispatcher().dispatch(Event::new("push", "c")).unwrap();
//! assert_eq!(mounted.output(), Some(json!(["c", "a", "b"])));
//!
//! app.actions().call("remove", 0).unwrap();
//! assert_eq!(mounted.output(), Some(json!(["a", "b"])));
//! ```

pub mod binding;
pub mod dispatch;
pub mod error;
pub mod reactive;
pub mod store;

pub use binding::{bind, use_store, Binding, BindingConfig, Component, Connected, Mounted};
pub use dispatch::{Actions, Dispatcher, Event, HandlerGroup};
pub use error::{DispatchError, StoreError};
pub use store::Cursor;

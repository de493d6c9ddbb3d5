//! Store Binding
//!
//! This module ties a store, a dispatcher and a component together.
//!
//! # How a Binding Works
//!
//! 1. [`bind`] captures a [`BindingConfig`] and creates the dispatcher the
//!    binding will use. [`Binding::wrap`] pairs it with a [`Component`].
//!
//! 2. [`Connected::mount`] initializes the dispatcher and the actions from
//!    the configuration, puts the initial store into the new instance, and
//!    renders it.
//!
//! 3. Every render creates a fresh store cursor over the instance's store and
//!    installs it on the dispatcher, so the next handler writes to the latest
//!    store.
//!
//! 4. A write through the cursor updates the instance's store. Outside a
//!    dispatch the component re-renders at once; during a dispatch it
//!    re-renders once, after the handler and the observer have run.
//!
//! 5. [`Connected::reset`] wipes the dispatcher and the actions and
//!    re-initializes them from the same configuration. A live instance
//!    re-renders, which restores the store cursor.
//!
//! # One Live Instance
//!
//! A binding has a single dispatcher. Mounting a second instance of the same
//! binding while the first is still mounted re-initializes the dispatcher and
//! makes the second instance the one whose store handlers see. The first
//! keeps its own store but no longer receives dispatches.

mod component;
mod config;
mod mounted;

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::dispatch::{initialize_actions, reset_actions, Actions, Dispatcher};

pub use component::{component_fn, Component, FnComponent};
pub use config::BindingConfig;
pub use mounted::Mounted;

use mounted::{Instance, LiveInstance};

/// Capture `config` for the components this binding will wrap.
///
/// # Example
///
/// ```rust
/// use lattice_store::binding::{bind, component_fn, BindingConfig};
/// use lattice_store::dispatch::HandlerGroup;
/// use serde_json::{json, Value};
///
/// let config = BindingConfig::new()
///     .with_store(json!({"letters": ["a", "b"]}))
///     .handlers(HandlerGroup::new().on("push", |event, ctx| {
///         ctx.store()?.refine("letters").unshift(event.data.clone())?;
///         Ok(Value::Null)
///     }));
///
/// let app = bind(config).wrap(component_fn(|_: &(), store: &Value| {
///     store["letters"].to_string()
/// }));
/// let mounted = app.mount(());
///
/// app.actions().call("push", "c").unwrap();
/// assert_eq!(mounted.output().unwrap(), r#"["c","a","b"]"#);
/// ```
pub fn bind(config: BindingConfig) -> Binding {
    let dispatcher = Arc::new(Dispatcher::new());
    let actions = Actions::new(Arc::clone(&dispatcher));
    Binding {
        inner: Arc::new(BindingInner {
            config,
            dispatcher,
            actions: RwLock::new(actions),
            live: RwLock::new(None),
        }),
    }
}

/// Bind `component` to a store in one step.
pub fn use_store<C: Component>(component: C, config: BindingConfig) -> Connected<C> {
    bind(config).wrap(component)
}

pub(crate) struct BindingInner {
    pub(crate) config: BindingConfig,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) actions: RwLock<Actions>,
    pub(crate) live: RwLock<Option<Weak<dyn LiveInstance>>>,
}

impl BindingInner {
    /// Initialize the dispatcher and the actions from the configuration.
    pub(crate) fn initialize(&self) {
        let config = &self.config;
        self.dispatcher
            .initialize(config.handler_groups(), config.observer().cloned());
        *self.actions.write() = initialize_actions(
            &self.dispatcher,
            config.handler_groups(),
            config.action_overrides(),
        );
    }

    fn reset(&self) {
        self.dispatcher.reset();
        reset_actions(&mut self.actions.write());
        self.initialize();

        let live = self.live.read().as_ref().and_then(Weak::upgrade);
        debug!(live = live.is_some(), "binding reset");
        if let Some(instance) = live {
            instance.reattach();
        }
    }
}

/// A configuration bound to its own dispatcher, ready to wrap components.
#[derive(Clone)]
pub struct Binding {
    inner: Arc<BindingInner>,
}

impl Binding {
    /// Pair this binding with a component.
    pub fn wrap<C: Component>(&self, component: C) -> Connected<C> {
        Connected {
            binding: self.clone(),
            component: Arc::new(component),
        }
    }

    pub fn config(&self) -> &BindingConfig {
        &self.inner.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    /// A snapshot of the current action table.
    pub fn actions(&self) -> Actions {
        self.inner.actions.read().clone()
    }

    /// Edit the live action table, e.g. to replace one action.
    pub fn edit_actions<R>(&self, f: impl FnOnce(&mut Actions) -> R) -> R {
        f(&mut self.inner.actions.write())
    }

    /// Wipe the dispatcher and the actions, then re-initialize both from the
    /// original configuration.
    pub fn reset(&self) {
        self.inner.reset();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("config", &self.inner.config)
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}

/// A component wrapped by a binding.
pub struct Connected<C: Component> {
    binding: Binding,
    component: Arc<C>,
}

impl<C: Component> Connected<C> {
    /// Mount an instance with `props`.
    pub fn mount(&self, props: C::Props) -> Mounted<C> {
        Mounted::new(Instance::mount(
            Arc::clone(&self.binding.inner),
            Arc::clone(&self.component),
            props,
        ))
    }

    /// See [`Binding::reset`].
    pub fn reset(&self) {
        self.binding.reset();
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn config(&self) -> &BindingConfig {
        self.binding.config()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.binding.dispatcher()
    }

    /// A snapshot of the current action table.
    pub fn actions(&self) -> Actions {
        self.binding.actions()
    }

    pub fn edit_actions<R>(&self, f: impl FnOnce(&mut Actions) -> R) -> R {
        self.binding.edit_actions(f)
    }
}

impl<C: Component> Clone for Connected<C> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            component: Arc::clone(&self.component),
        }
    }
}

impl<C: Component> fmt::Debug for Connected<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connected")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Event, HandlerGroup};
    use serde_json::{json, Value};

    fn counter() -> Connected<impl Component<Props = (), Output = i64>> {
        let config = BindingConfig::new()
            .with_store(json!({"count": 0}))
            .handlers(HandlerGroup::new().on("inc", |_, ctx| {
                let count = ctx.store()?.refine("count");
                count.apply(|v| json!(v.as_i64().unwrap_or_default() + 1))?;
                Ok(Value::Null)
            }));
        use_store(
            component_fn(|_: &(), store: &Value| store["count"].as_i64().unwrap_or_default()),
            config,
        )
    }

    #[test]
    fn mount_renders_once_with_initial_store() {
        let app = counter();
        let mounted = app.mount(());

        assert_eq!(mounted.render_count(), 1);
        assert_eq!(mounted.output(), Some(0));
        assert!(app.dispatcher().has_store());
    }

    #[test]
    fn writes_during_dispatch_render_once() {
        let app = counter();
        let mounted = app.mount(());
        let dispatcher = app.dispatcher().clone();
        dispatcher.initialize(
            &[HandlerGroup::new().on("inc_twice", |_, ctx| {
                let count = ctx.store()?.refine("count");
                count.apply(|v| json!(v.as_i64().unwrap_or_default() + 1))?;
                count.apply(|v| json!(v.as_i64().unwrap_or_default() + 1))?;
                Ok(Value::Null)
            })],
            None,
        );

        dispatcher.dispatch(Event::new("inc_twice", Value::Null)).unwrap();

        assert_eq!(mounted.render_count(), 2);
        assert_eq!(mounted.output(), Some(2));
    }

    #[test]
    fn write_before_a_handler_panic_still_renders() {
        let app = counter();
        let mounted = app.mount(());
        let dispatcher = app.dispatcher().clone();
        dispatcher.initialize(
            &[HandlerGroup::new().on("set_then_panic", |_, ctx| {
                ctx.store()?.refine("count").set(1)?;
                panic!("handler gave up");
            })],
            None,
        );

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            dispatcher.dispatch(Event::new("set_then_panic", Value::Null))
        }));

        assert!(outcome.is_err());
        assert_eq!(mounted.store(), json!({"count": 1}));
        assert_eq!(mounted.output(), Some(1));
        assert_eq!(mounted.render_count(), 2);
    }

    #[test]
    fn unmount_detaches_from_dispatcher() {
        let app = counter();
        let mounted = app.mount(());

        mounted.unmount();

        assert!(!mounted.is_mounted());
        assert!(!app.dispatcher().has_store());
        mounted.unmount();
    }

    #[test]
    fn dropping_the_handle_unmounts() {
        let app = counter();
        {
            let _mounted = app.mount(());
            assert!(app.dispatcher().has_store());
        }
        assert!(!app.dispatcher().has_store());
    }

    #[test]
    fn reset_without_live_instance_leaves_no_store() {
        let app = counter();

        app.reset();

        assert!(!app.dispatcher().has_store());
        assert!(app.dispatcher().has_handler("inc"));
        assert!(app.actions().contains("inc"));
        assert_eq!(app.config().store(), &json!({"count": 0}));
    }
}

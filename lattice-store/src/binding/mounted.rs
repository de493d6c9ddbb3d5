//! Mounted component instances.
//!
//! A mounted instance owns the store for as long as it lives. Its pieces:
//!
//! - a `Signal<Value>` holding the store;
//! - a render [`Effect`] that renders the component and installs a fresh
//!   store cursor on the dispatcher;
//! - a subscription to the store signal that re-renders on every change, or
//!   defers the render while a dispatch is running;
//! - a liveness flag checked by every cursor it hands out, so writes that
//!   arrive after unmount are dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, trace};

use super::component::Component;
use super::BindingInner;
use crate::dispatch::DispatchListener;
use crate::reactive::{Effect, Signal, Subscription};
use crate::store::Cursor;

/// Something the binding can re-attach after a reset.
pub(crate) trait LiveInstance: Send + Sync {
    fn reattach(&self);
}

pub(crate) struct Instance<C: Component> {
    component: Arc<C>,
    props: C::Props,
    store: Signal<Value>,
    output: RwLock<Option<C::Output>>,
    render: Effect,
    alive: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
    binding: Arc<BindingInner>,
    this: Weak<Instance<C>>,
}

impl<C: Component> Instance<C> {
    pub(crate) fn mount(binding: Arc<BindingInner>, component: Arc<C>, props: C::Props) -> Arc<Self> {
        binding.initialize();

        let instance = Arc::new_cyclic(|this: &Weak<Self>| {
            let target = this.clone();
            let render = Effect::new(move || {
                if let Some(instance) = target.upgrade() {
                    instance.render();
                }
            });
            Self {
                component,
                props,
                store: Signal::new(binding.config.store().clone()),
                output: RwLock::new(None),
                render,
                alive: Arc::new(AtomicBool::new(true)),
                subscription: Mutex::new(None),
                binding,
                this: this.clone(),
            }
        });

        let target = Arc::downgrade(&instance);
        let subscription = instance.store.subscribe(move |_| {
            if let Some(instance) = target.upgrade() {
                instance.store_changed();
            }
        });
        *instance.subscription.lock() = Some(subscription);

        instance.attach();
        let live: Weak<dyn LiveInstance> = instance.this.clone();
        *instance.binding.live.write() = Some(live);

        instance.render.execute();
        debug!(render_effect = instance.render.id(), "component mounted");
        instance
    }

    fn listener(&self) -> Weak<dyn DispatchListener> {
        self.this.clone()
    }

    /// Become the dispatcher's render listener.
    fn attach(&self) {
        self.binding.dispatcher.set_listener(self.listener());
    }

    fn render(&self) {
        let signal = self.store.clone();
        let alive = Arc::clone(&self.alive);

        let output = self.store.with(|store| {
            let cursor = Cursor::new(store.clone(), move |root| {
                if alive.load(Ordering::SeqCst) {
                    signal.set(root);
                } else {
                    debug!("store mutation after unmount suppressed");
                }
            });
            self.binding.dispatcher.set_store(cursor);
            self.component.render(&self.props, store)
        });
        *self.output.write() = Some(output);
        trace!(version = self.store.version(), "component rendered");
    }

    fn store_changed(&self) {
        if !self.is_alive() {
            return;
        }
        if self.binding.dispatcher.is_dispatching() {
            self.render.invalidate();
        } else {
            self.render.execute();
        }
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn unmount(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        self.render.dispose();
        if let Some(mut subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
        self.binding.dispatcher.detach(&self.listener());

        let mut live = self.binding.live.write();
        let this: Weak<dyn LiveInstance> = self.this.clone();
        if live.as_ref().is_some_and(|current| Weak::ptr_eq(current, &this)) {
            *live = None;
        }
        debug!(renders = self.render.run_count(), "component unmounted");
    }
}

impl<C: Component> DispatchListener for Instance<C> {
    fn dispatch_settled(&self) {
        if self.is_alive() {
            self.render.flush();
        }
    }
}

impl<C: Component> LiveInstance for Instance<C> {
    fn reattach(&self) {
        if self.is_alive() {
            self.attach();
            self.render.execute();
        }
    }
}

/// A mounted component.
///
/// Dropping the handle unmounts the component.
pub struct Mounted<C: Component> {
    instance: Arc<Instance<C>>,
}

impl<C: Component> Mounted<C> {
    pub(crate) fn new(instance: Arc<Instance<C>>) -> Self {
        Self { instance }
    }

    /// A copy of the store as the component currently holds it.
    pub fn store(&self) -> Value {
        self.instance.store.get()
    }

    /// Inspect the output of the latest render.
    pub fn with_output<R>(&self, f: impl FnOnce(&C::Output) -> R) -> Option<R> {
        self.instance.output.read().as_ref().map(f)
    }

    /// The output of the latest render.
    pub fn output(&self) -> Option<C::Output>
    where
        C::Output: Clone,
    {
        self.instance.output.read().clone()
    }

    /// The props the component was mounted with.
    pub fn props(&self) -> &C::Props {
        &self.instance.props
    }

    /// How many times the component has rendered.
    pub fn render_count(&self) -> usize {
        self.instance.render.run_count()
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.is_alive()
    }

    /// Tear the component down. Later store writes through cursors it handed
    /// out are ignored. Unmounting twice is a no-op.
    pub fn unmount(&self) {
        self.instance.unmount();
    }
}

impl<C: Component> Drop for Mounted<C> {
    fn drop(&mut self) {
        self.instance.unmount();
    }
}

impl<C: Component> fmt::Debug for Mounted<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("store", &self.store())
            .field("render_count", &self.render_count())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

//! Components that can be bound to a store.

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

/// A view rendered from its props and the current store.
///
/// Rendering must not dispatch: it runs while the binding installs a fresh
/// store cursor.
pub trait Component: Send + Sync + 'static {
    /// Inputs supplied by whoever mounts the component.
    type Props: Send + Sync + 'static;

    /// What a render produces.
    type Output: Send + Sync + 'static;

    fn render(&self, props: &Self::Props, store: &Value) -> Self::Output;
}

/// A component defined by a plain function.
pub struct FnComponent<P, O, F> {
    render: F,
    _marker: PhantomData<fn(&P) -> O>,
}

/// Turn a render function into a [`Component`].
///
/// ```rust
/// use lattice_store::binding::{component_fn, Component};
/// use serde_json::json;
///
/// let greeting = component_fn(|name: &String, store: &serde_json::Value| {
///     format!("{} {name}", store["greeting"].as_str().unwrap_or("hello"))
/// });
///
/// let store = json!({"greeting": "hi"});
/// assert_eq!(greeting.render(&"ada".to_string(), &store), "hi ada");
/// ```
pub fn component_fn<P, O, F>(render: F) -> FnComponent<P, O, F>
where
    P: Send + Sync + 'static,
    O: Send + Sync + 'static,
    F: Fn(&P, &Value) -> O + Send + Sync + 'static,
{
    FnComponent {
        render,
        _marker: PhantomData,
    }
}

impl<P, O, F> Component for FnComponent<P, O, F>
where
    P: Send + Sync + 'static,
    O: Send + Sync + 'static,
    F: Fn(&P, &Value) -> O + Send + Sync + 'static,
{
    type Props = P;
    type Output = O;

    fn render(&self, props: &P, store: &Value) -> O {
        (self.render)(props, store)
    }
}

impl<P, O, F> fmt::Debug for FnComponent<P, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponent").finish_non_exhaustive()
    }
}

//! Integration Tests for the Store Binding
//!
//! These tests mount a small letters application and drive it through the
//! dispatcher and the actions, the way an application would.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use lattice_store::binding::{bind, component_fn, BindingConfig, Component, Connected};
use lattice_store::dispatch::{ActionGroup, ActionKind, Dispatcher, Event, HandlerContext, HandlerGroup};
use lattice_store::DispatchError;

struct Props {
    foo: String,
}

/// Renders `"<foo> | 0: a, 1: b"`.
fn application() -> impl Component<Props = Props, Output = String> {
    component_fn(|props: &Props, store: &Value| {
        let letters = store["letters"]
            .as_array()
            .map(|letters| {
                letters
                    .iter()
                    .enumerate()
                    .map(|(i, letter)| format!("{i}: {}", letter.as_str().unwrap_or_default()))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        format!("{} | {letters}", props.foo)
    })
}

/// Spies shared between a test and the handlers it configured.
#[derive(Default)]
struct Spies {
    dispatched: Mutex<Vec<Event>>,
    override_me: AtomicI32,
    options: Mutex<Vec<(Value, Option<Value>, Option<Value>)>>,
}

fn letters_app(spies: &Arc<Spies>) -> Connected<impl Component<Props = Props, Output = String>> {
    let handlers = HandlerGroup::new()
        .on("push", |event, ctx| {
            ctx.store()?.refine("letters").unshift(event.data.clone())?;
            Ok(json!(format!("pushed {}", event.data.as_str().unwrap_or_default())))
        })
        .on("remove", |event, ctx| {
            let index = event.data.as_u64().unwrap_or_default() as usize;
            ctx.store()?.refine("letters").splice(index, 1, vec![])?;
            Ok(Value::Null)
        })
        .on("overrideMe", |_, _| Err(DispatchError::msg("I should not be called")))
        .on("optionalArgs", {
            let spies = spies.clone();
            move |event: &Event, _: &HandlerContext<'_>| {
                spies.options.lock().push((
                    event.data.clone(),
                    event.option("arg2").cloned(),
                    event.option("arg3").cloned(),
                ));
                Ok(Value::Null)
            }
        });

    let actions = ActionGroup::new()
        .on("pop", |dispatcher, _, _| dispatcher.dispatch(Event::new("remove", 0)))
        .on("overrideMe", {
            let spies = spies.clone();
            move |_: &Dispatcher, _: Value, _: Map<String, Value>| {
                spies.override_me.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
        });

    let observer_spies = spies.clone();
    let config = BindingConfig::new()
        .with_store(json!({"letters": ["a", "b"]}))
        .handlers(handlers)
        .overrides(actions)
        .on_dispatch(move |event| observer_spies.dispatched.lock().push(event.clone()));

    bind(config).wrap(application())
}

fn props() -> Props {
    Props { foo: "bar".into() }
}

/// Test that mounting renders the wrapped component with its props.
#[test]
fn renders_the_component_it_is_given() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);

    let mounted = app.mount(props());

    assert!(mounted.output().unwrap().starts_with("bar |"));
    assert_eq!(mounted.props().foo, "bar");
}

/// Test that the component renders from the configured store.
#[test]
fn injects_the_store_into_the_component() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);

    let mounted = app.mount(props());

    assert_eq!(mounted.output().unwrap(), "bar | 0: a, 1: b");
    assert_eq!(mounted.store(), json!({"letters": ["a", "b"]}));
}

/// Test that a dispatch runs its handler and re-renders once.
#[test]
fn dispatch_delegates_to_the_handler_and_rerenders() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());

    app.dispatcher().dispatch(Event::new("push", "c")).unwrap();

    assert_eq!(mounted.output().unwrap(), "bar | 0: c, 1: a, 2: b");
    assert_eq!(mounted.render_count(), 2);
}

/// Test that the remove handler splices the letter out of the store.
#[test]
fn dispatch_remove_splices_the_index() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());

    app.dispatcher().dispatch(Event::new("remove", 0)).unwrap();

    assert_eq!(mounted.store(), json!({"letters": ["b"]}));
    assert_eq!(mounted.output().unwrap(), "bar | 0: b");
}

/// Test that the observer receives every dispatched event.
#[test]
fn on_dispatch_receives_the_event() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());

    app.dispatcher().dispatch(Event::new("push", "c")).unwrap();
    app.dispatcher().dispatch(Event::new("optionalArgs", 1)).unwrap();

    assert_eq!(
        *spies.dispatched.lock(),
        vec![Event::new("push", "c"), Event::new("optionalArgs", 1)]
    );
}

/// Test that the observer runs before the deferred re-render.
#[test]
fn observer_runs_before_the_rerender() {
    let seen_renders = Arc::new(Mutex::new(Vec::new()));

    let renders = Arc::new(AtomicI32::new(0));
    let renders_in_component = renders.clone();
    let renders_in_observer = renders.clone();
    let seen = seen_renders.clone();

    let config = BindingConfig::new()
        .with_store(json!({"n": 0}))
        .handlers(HandlerGroup::new().on("bump", |_, ctx| {
            ctx.store()?.refine("n").set(1)?;
            Ok(Value::Null)
        }))
        .on_dispatch(move |_| seen.lock().push(renders_in_observer.load(Ordering::SeqCst)));
    let app = bind(config).wrap(component_fn(move |_: &(), _: &Value| {
        renders_in_component.fetch_add(1, Ordering::SeqCst);
    }));
    let _mounted = app.mount(());

    app.dispatcher().dispatch(Event::new("bump", Value::Null)).unwrap();

    // The observer saw only the initial render; the update render came after.
    assert_eq!(*seen_renders.lock(), vec![1]);
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

/// Test that an unknown event type fails without calling the observer.
#[test]
fn unknown_event_types_fail() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());

    let err = app
        .dispatcher()
        .dispatch(Event::new("shuffle", Value::Null))
        .unwrap_err();

    assert!(err.is_handler_not_found());
    assert!(spies.dispatched.lock().is_empty());
    assert_eq!(mounted.render_count(), 1);
}

/// Test that a handler error reaches the caller and skips the observer.
#[test]
fn handler_errors_propagate_without_observer() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());

    let err = app
        .dispatcher()
        .dispatch(Event::new("overrideMe", Value::Null))
        .unwrap_err();

    assert_eq!(err.to_string(), "handler failed: I should not be called");
    assert!(spies.dispatched.lock().is_empty());
}

/// Test that explicit actions can dispatch events.
#[test]
fn user_specified_actions_are_hooked_up() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());

    app.actions().call("pop", Value::Null).unwrap();

    assert_eq!(mounted.output().unwrap(), "bar | 0: b");
}

/// Test that every handler gets a forwarding action.
#[test]
fn automatic_actions_are_hooked_up() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());

    app.actions().call("push", "c").unwrap();

    assert_eq!(mounted.output().unwrap(), "bar | 0: c, 1: a, 2: b");
}

/// Test that a forwarding action returns the handler's result.
#[test]
fn actions_return_the_result_of_the_handler() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());

    assert_eq!(app.actions().call("push", "c").unwrap(), json!("pushed c"));
}

/// Test that an explicit action replaces the forwarder of the same name.
#[test]
fn user_actions_override_automatic_actions() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());

    app.actions().call("overrideMe", Value::Null).unwrap();

    assert_eq!(spies.override_me.load(Ordering::SeqCst), 1);
    assert_eq!(app.actions().kind("overrideMe"), Some(ActionKind::Override));
    assert_eq!(app.actions().kind("push"), Some(ActionKind::Forwarding));
}

/// Test that action options reach the handler and the observer.
#[test]
fn actions_take_optional_arguments() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());

    let mut options = Map::new();
    options.insert("arg2".into(), json!(2));
    options.insert("arg3".into(), json!(3));
    app.actions().call_with("optionalArgs", 1, options).unwrap();

    assert_eq!(
        *spies.options.lock(),
        vec![(json!(1), Some(json!(2)), Some(json!(3)))]
    );
    assert_eq!(
        spies.dispatched.lock()[0],
        Event::new("optionalArgs", 1)
            .option_value("arg2", 2)
            .option_value("arg3", 3)
    );
}

/// Test that reset gives the live component a fresh store cursor.
#[test]
fn reset_clears_then_restores_the_store_cursor() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());
    app.actions().call("push", "c").unwrap();
    let before = app.dispatcher().store().unwrap();

    app.reset();

    let after = app.dispatcher().store().unwrap();
    assert!(!after.same_root(&before));
    assert_eq!(after.get(), json!({"letters": ["c", "a", "b"]}));

    app.actions().call("pop", Value::Null).unwrap();
    assert_eq!(mounted.output().unwrap(), "bar | 0: a, 1: b");
}

/// Test that reset undoes a reassigned action.
#[test]
fn reset_restores_reassigned_actions() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());
    app.edit_actions(|actions| actions.insert("pop", |_, _, _| Ok(json!("1234"))));
    assert_eq!(app.actions().call("pop", Value::Null).unwrap(), json!("1234"));

    app.reset();

    assert_ne!(app.actions().call("pop", Value::Null).unwrap(), json!("1234"));
}

/// Test that reset keeps the configured observer.
#[test]
fn reset_keeps_the_observer() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let _mounted = app.mount(props());

    app.reset();
    app.actions().call("push", "c").unwrap();

    assert_eq!(spies.dispatched.lock().len(), 1);
}

/// Test that store writes after unmount do not re-render.
#[test]
fn store_writes_after_unmount_are_ignored() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());
    let stale = app.dispatcher().store().unwrap();

    mounted.unmount();
    stale.refine("letters").push("z").unwrap();

    assert_eq!(mounted.store(), json!({"letters": ["a", "b"]}));
    assert_eq!(mounted.render_count(), 1);
    assert!(!app.dispatcher().has_store());
}

/// Test that handlers see no store once the component is gone.
#[test]
fn dispatch_after_unmount_has_no_store() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let mounted = app.mount(props());
    drop(mounted);

    let err = app.actions().call("push", "c").unwrap_err();

    assert!(matches!(err, DispatchError::NoStore));
}

/// Test that the most recent mount receives dispatches.
#[test]
fn last_mount_wins() {
    let spies = Arc::new(Spies::default());
    let app = letters_app(&spies);
    let first = app.mount(props());
    let second = app.mount(Props { foo: "baz".into() });

    app.actions().call("push", "c").unwrap();

    assert_eq!(first.output().unwrap(), "bar | 0: a, 1: b");
    assert_eq!(second.output().unwrap(), "baz | 0: c, 1: a, 2: b");

    // Unmounting the stale first instance leaves the second attached.
    first.unmount();
    assert!(app.dispatcher().has_store());
}

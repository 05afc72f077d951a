//! Signal/slot behaviour across object lifetimes.

use kestrel_core::{Application, HeadlessPlatform, Object, ObjectId, Signal, Slot};

struct Toggle;

impl Toggle {
    const TOGGLED: Signal<bool> = Signal::new("toggled");
}

impl Object for Toggle {}

#[derive(Default)]
struct Subscriber {
    calls: Vec<bool>,
}

impl Object for Subscriber {}

fn on_toggled() -> Slot<Subscriber, bool> {
    Slot::new("on_toggled", |s: &mut Subscriber, _ctx, checked: &bool| {
        s.calls.push(*checked)
    })
}

fn setup() -> (Application, ObjectId, ObjectId) {
    let mut app = Application::new(HeadlessPlatform::new());
    let emitter = app.create_root(Toggle);
    let subscriber = app.create_root(Subscriber::default());
    (app, emitter, subscriber)
}

#[test]
fn toggled_reaches_subscriber_exactly_once() {
    let (mut app, emitter, subscriber) = setup();
    let graph = app.graph_mut();
    graph.connect(emitter, Toggle::TOGGLED, subscriber, on_toggled());

    assert_eq!(graph.emit(emitter, Toggle::TOGGLED, true), 1);
    assert_eq!(graph.object::<Subscriber>(subscriber).unwrap().calls, vec![true]);
}

#[test]
fn emit_after_subscriber_destroyed_reaches_nobody() {
    let (mut app, emitter, subscriber) = setup();
    let graph = app.graph_mut();
    graph.connect(emitter, Toggle::TOGGLED, subscriber, on_toggled());

    graph.destroy(subscriber);
    assert_eq!(graph.observer_count(emitter), 0);
    assert_eq!(graph.emit(emitter, Toggle::TOGGLED, true), 0);
}

#[test]
fn destroying_emitter_clears_subscriber_bindings() {
    let (mut app, emitter, subscriber) = setup();
    let graph = app.graph_mut();
    graph.connect(emitter, Toggle::TOGGLED, subscriber, on_toggled());
    assert_eq!(graph.bound_objects(subscriber), vec![emitter]);

    graph.destroy(emitter);
    assert!(graph.bound_objects(subscriber).is_empty());
    assert_eq!(graph.emit(emitter, Toggle::TOGGLED, false), 0);
    assert!(graph.object::<Subscriber>(subscriber).unwrap().calls.is_empty());
}

#[test]
fn object_can_be_emitter_and_subscriber() {
    struct Relay;
    impl Relay {
        const FORWARDED: Signal<bool> = Signal::new("forwarded");
    }
    impl Object for Relay {}

    let (mut app, emitter, subscriber) = setup();
    let relay = app.create_root(Relay);
    let graph = app.graph_mut();

    graph.connect(
        emitter,
        Toggle::TOGGLED,
        relay,
        Slot::new("forward", |_: &mut Relay, ctx, v: &bool| {
            ctx.emit(Relay::FORWARDED, !*v);
        }),
    );
    graph.connect(relay, Relay::FORWARDED, subscriber, on_toggled());

    graph.emit(emitter, Toggle::TOGGLED, true);
    assert_eq!(graph.object::<Subscriber>(subscriber).unwrap().calls, vec![false]);

    graph.destroy(relay);
    assert!(graph.bound_objects(subscriber).is_empty());
    assert_eq!(graph.observer_count(emitter), 0);
}

#[test]
fn slot_destroying_its_emitter_mid_emission_is_safe() {
    let (mut app, emitter, subscriber) = setup();
    let second = app.create_root(Subscriber::default());
    let graph = app.graph_mut();

    graph.connect(
        emitter,
        Toggle::TOGGLED,
        subscriber,
        Slot::new("destroy_emitter", move |_: &mut Subscriber, ctx, _: &bool| {
            ctx.destroy(emitter);
        }),
    );
    graph.connect(emitter, Toggle::TOGGLED, second, on_toggled());

    assert_eq!(graph.emit(emitter, Toggle::TOGGLED, true), 1);
    assert!(!graph.contains(emitter));
    assert!(graph.object::<Subscriber>(second).unwrap().calls.is_empty());
    assert!(graph.bound_objects(second).is_empty());
}

#[test]
fn slots_run_in_connection_order() {
    let (mut app, emitter, _) = setup();
    let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let graph = app.graph_mut();
    for label in ["first", "second", "third"] {
        let order = std::rc::Rc::clone(&order);
        graph.connect_fn(emitter, Toggle::TOGGLED, move |_ctx, _: &bool| {
            order.borrow_mut().push(label);
        });
    }
    graph.emit(emitter, Toggle::TOGGLED, true);
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn reentrant_emit_to_busy_subscriber_is_deferred() {
    #[derive(Default)]
    struct Echo {
        values: Vec<bool>,
    }
    impl Echo {
        const PING: Signal<bool> = Signal::new("ping");
    }
    impl Object for Echo {}

    let mut app = Application::new(HeadlessPlatform::new());
    let echo = app.create_root(Echo::default());
    let graph = app.graph_mut();
    // The slot re-emits its own signal once; the nested call lands on a busy
    // subscriber and must be queued.
    graph.connect(
        echo,
        Echo::PING,
        echo,
        Slot::new("pong", |e: &mut Echo, ctx, v: &bool| {
            e.values.push(*v);
            if *v {
                ctx.emit(Echo::PING, false);
            }
        }),
    );

    graph.emit(echo, Echo::PING, true);
    assert_eq!(app.graph().object::<Echo>(echo).unwrap().values, vec![true]);
    app.process_events();
    assert_eq!(app.graph().object::<Echo>(echo).unwrap().values, vec![true, false]);
}

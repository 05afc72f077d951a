//! Destruction, ownership and queue-purge behaviour of the object graph.

use std::sync::Arc;

use kestrel_core::{
    Application, CustomEvent, DESTROYED, Event, HeadlessPlatform, Object, ObjectContext,
    ObjectGraph, ObjectId, Slot, Timer,
};
use parking_lot::Mutex;
use std::time::Duration;

/// Records every drop into a shared list.
struct Tracked {
    label: &'static str,
    drops: Arc<Mutex<Vec<&'static str>>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.lock().push(self.label);
    }
}

impl Object for Tracked {}

fn tracked(drops: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Tracked {
    Tracked {
        label,
        drops: Arc::clone(drops),
    }
}

#[test]
fn destroying_root_destroys_every_descendant_exactly_once() {
    let drops = Arc::new(Mutex::new(Vec::new()));
    let mut graph = ObjectGraph::new();

    let root = graph.create(tracked(&drops, "root"));
    let a = graph.create_child(root, tracked(&drops, "a")).unwrap();
    let b = graph.create_child(root, tracked(&drops, "b")).unwrap();
    graph.create_child(a, tracked(&drops, "a1")).unwrap();
    graph.create_child(a, tracked(&drops, "a2")).unwrap();
    graph.create_child(b, tracked(&drops, "b1")).unwrap();

    graph.destroy(root);
    graph.destroy(root);
    graph.destroy(a);

    let mut dropped = drops.lock().clone();
    dropped.sort_unstable();
    assert_eq!(dropped, vec!["a", "a1", "a2", "b", "b1", "root"]);
    assert_eq!(graph.object_count(), 0);
}

#[test]
fn children_are_torn_down_before_their_parent_is_dropped() {
    let drops = Arc::new(Mutex::new(Vec::new()));
    let mut graph = ObjectGraph::new();
    let root = graph.create(tracked(&drops, "root"));
    let child = graph.create_child(root, tracked(&drops, "child")).unwrap();
    graph.create_child(child, tracked(&drops, "grandchild")).unwrap();

    graph.destroy(root);
    assert_eq!(*drops.lock(), vec!["grandchild", "child", "root"]);
}

/// Destroys its parent when it is itself told it is going away.
struct Saboteur;
impl Object for Saboteur {}

#[test]
fn destroy_tolerates_reentrant_requests_from_slots() {
    let drops = Arc::new(Mutex::new(Vec::new()));
    let mut app = Application::new(HeadlessPlatform::new());
    let root = app.create_root(tracked(&drops, "root"));

    let graph = app.graph_mut();
    let child = graph.create_child(root, tracked(&drops, "child")).unwrap();
    let saboteur = graph.create_child(root, Saboteur).unwrap();

    // When the child goes, try to destroy the root (already dying) and the
    // saboteur (a sibling the loop has not reached yet).
    graph.connect(
        child,
        DESTROYED,
        saboteur,
        Slot::new("on_child_destroyed", move |_: &mut Saboteur, ctx, _: &ObjectId| {
            ctx.destroy(root);
            let me = ctx.id();
            ctx.destroy(me);
        }),
    );

    graph.destroy(root);
    assert_eq!(graph.object_count(), 0);
    assert_eq!(drops.lock().len(), 2);
}

#[test]
fn destroying_a_subtree_purges_the_queue() {
    struct Sink;
    impl Object for Sink {}

    let mut app = Application::new(HeadlessPlatform::new());
    let root = app.create_root(Sink);
    let c1 = app.graph_mut().create_child(root, Sink).unwrap();

    let queue = Arc::clone(app.event_queue());
    assert!(queue.contains_object(root));
    assert!(queue.contains_object(c1));

    queue.post_event(c1, Event::Custom(CustomEvent::new(1, ())));
    queue.post_event(root, Event::Custom(CustomEvent::new(2, ())));
    app.graph().update(c1);
    app.graph().invoke_later(c1, |_| {});
    app.graph_mut()
        .with_object::<Sink, _>(c1, |_, ctx| {
            ctx.start_timer(Duration::from_millis(10), kestrel_core::TimerKind::Repeating)
        })
        .unwrap()
        .unwrap();

    app.graph_mut().destroy(root);

    assert!(!queue.contains_object(root));
    assert!(!queue.contains_object(c1));
    assert_eq!(queue.pending_events(), 0);
    assert_eq!(queue.pending_actions(), 0);
    assert_eq!(queue.active_timers(), 0);
}

#[test]
fn detached_subtree_can_join_an_application_later() {
    struct Panel;
    impl Object for Panel {}

    let mut app = Application::new(HeadlessPlatform::new());
    let graph = app.graph_mut();
    let panel = graph.create(Panel);
    let timer = graph.create_child(panel, Timer::new(Duration::from_millis(5))).unwrap();
    assert!(Timer::start(graph, timer).is_err());

    let queue = Arc::clone(app.event_queue());
    app.graph_mut().set_event_queue(panel, Some(Arc::clone(&queue)));
    assert!(queue.contains_object(timer));
    assert!(Timer::start(app.graph_mut(), timer).is_ok());
}

#[test]
fn object_destroyed_mid_dispatch_gets_no_further_events() {
    #[derive(Default)]
    struct Victim {
        seen: u32,
    }
    impl Object for Victim {}

    struct Killer {
        victim: ObjectId,
    }
    impl Object for Killer {
        fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
            if matches!(event, Event::Custom(_)) {
                ctx.destroy(self.victim);
                return true;
            }
            false
        }
    }

    let mut app = Application::new(HeadlessPlatform::new());
    let victim = app.create_root(Victim::default());
    let killer = app.create_root(Killer { victim });

    let queue = Arc::clone(app.event_queue());
    queue.post_event(killer, Event::Custom(CustomEvent::new(0, ())));
    queue.post_event(victim, Event::Custom(CustomEvent::new(0, ())));

    assert_eq!(app.process_events(), 1);
    assert!(!app.graph().contains(victim));
    assert_eq!(queue.pending_events(), 0);
}

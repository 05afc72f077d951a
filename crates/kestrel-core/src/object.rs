//! Object model for Kestrel.
//!
//! Every object lives in an [`ObjectGraph`] arena and is addressed by an
//! [`ObjectId`]. The graph owns:
//! - the object's handler (the user type implementing [`Object`])
//! - parent-child ownership with cascading destruction
//! - the object's name and concrete type name
//! - the event queue the object is attached to
//! - the signal connections it takes part in
//!
//! Handlers run with an [`ObjectContext`], which gives them mutable access
//! to the rest of the graph while their own handler is checked out. A call
//! that reaches an object whose handler is already running is reported as
//! busy rather than aliased.
//!
//! # Key Types
//!
//! - [`Object`] - Trait implemented by every object type
//! - [`ObjectId`] - Stable identifier for each object
//! - [`ObjectGraph`] - Arena holding all objects and their relationships
//! - [`ObjectContext`] - What a handler sees while it runs

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kestrel_render::Painter;
use slotmap::{SlotMap, new_key_type};

use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::platform::WindowCommand;
use crate::queue::{DeferredAction, EventQueue};
use crate::signal::{ConnectionId, Observer, Signal};
use crate::timer::{TimerId, TimerKind};

new_key_type! {
    /// A unique identifier for an object in the graph.
    ///
    /// `ObjectId`s are stable handles that remain valid even as the object tree changes.
    /// They become invalid when the object is destroyed and are never reused
    /// for another object.
    pub struct ObjectId;
}

impl ObjectId {
    /// Convert the ObjectId to a raw u64 value.
    ///
    /// The raw value can be converted back using [`ObjectId::from_raw`].
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Create an ObjectId from a raw u64 value.
    ///
    /// This does not check that the object exists.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Emitted by every object at the start of its destruction, carrying its id.
pub const DESTROYED: Signal<ObjectId> = Signal::new("destroyed");

/// Base trait for everything stored in an [`ObjectGraph`].
///
/// The only hook is [`Object::event`], which receives every event delivered
/// to the object and returns whether it was handled.
pub trait Object: Any {
    fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
        let _ = (ctx, event);
        false
    }
}

pub(crate) struct ObjectNode {
    name: String,
    type_name: &'static str,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    pub(crate) queue: Option<Arc<EventQueue>>,
    pub(crate) observers: Vec<Observer>,
    pub(crate) bound_objects: Vec<ObjectId>,
    handler: Option<Box<dyn Object>>,
    pub(crate) destroying: bool,
    pub(crate) signals_blocked: bool,
}

impl ObjectNode {
    fn new(handler: Box<dyn Object>, type_name: &'static str) -> Self {
        Self {
            name: String::new(),
            type_name,
            parent: None,
            children: Vec::new(),
            queue: None,
            observers: Vec::new(),
            bound_objects: Vec::new(),
            handler: Some(handler),
            destroying: false,
            signals_blocked: false,
        }
    }
}

/// Outcome of running a closure against an object's handler.
pub(crate) enum Invocation<R> {
    Done(R),
    /// The handler is already running further up the stack.
    Busy,
    /// No such object.
    Gone,
}

/// The arena of all objects owned by one event-loop thread.
///
/// The graph is not `Send`: handlers and slots run on the thread that owns
/// it. Other threads talk to it through its [`EventQueue`].
pub struct ObjectGraph {
    nodes: SlotMap<ObjectId, ObjectNode>,
    pub(crate) connections: HashMap<ConnectionId, ObjectId>,
    pub(crate) next_connection: u64,
}

static_assertions::assert_not_impl_any!(ObjectGraph: Send);

impl Default for ObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGraph")
            .field("objects", &self.nodes.len())
            .field("connections", &self.connections.len())
            .finish()
    }
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            connections: HashMap::new(),
            next_connection: 0,
        }
    }

    pub(crate) fn node(&self, id: ObjectId) -> Option<&ObjectNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: ObjectId) -> Option<&mut ObjectNode> {
        self.nodes.get_mut(id)
    }

    /// Insert a detached root object with no event queue.
    pub fn create<T: Object>(&mut self, object: T) -> ObjectId {
        let type_name = type_name::<T>();
        let id = self.nodes.insert(ObjectNode::new(Box::new(object), type_name));
        tracing::trace!(target: "kestrel_core::object", ?id, type_name, "created object");
        id
    }

    /// Insert an object as the last child of `parent`.
    ///
    /// The child joins the parent's event queue.
    pub fn create_child<T: Object>(&mut self, parent: ObjectId, object: T) -> Result<ObjectId> {
        let parent_node = self.nodes.get(parent).ok_or(CoreError::InvalidObject(parent))?;
        if parent_node.destroying {
            return Err(CoreError::ObjectDestroying(parent));
        }
        let queue = parent_node.queue.clone();

        let id = self.create(object);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(parent);
            node.queue = queue.clone();
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        if let Some(queue) = queue {
            queue.add_object(id);
        }
        Ok(id)
    }

    /// Move `id` under `new_parent`, or make it a root with `None`.
    ///
    /// A re-parented object and its subtree join the new parent's queue.
    pub fn set_parent(&mut self, id: ObjectId, new_parent: Option<ObjectId>) -> Result<()> {
        if !self.nodes.contains_key(id) {
            return Err(CoreError::InvalidObject(id));
        }
        if let Some(parent) = new_parent {
            let parent_node = self.nodes.get(parent).ok_or(CoreError::InvalidObject(parent))?;
            if parent_node.destroying {
                return Err(CoreError::ObjectDestroying(parent));
            }
            if self.is_ancestor_of(id, parent) {
                return Err(CoreError::CircularParentage);
            }
        }

        self.detach_from_parent(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = new_parent;
        }
        if let Some(parent) = new_parent {
            let queue = self.nodes.get_mut(parent).and_then(|p| {
                p.children.push(id);
                p.queue.clone()
            });
            self.set_event_queue(id, queue);
        }
        Ok(())
    }

    fn detach_from_parent(&mut self, id: ObjectId) {
        let parent = self.nodes.get_mut(id).and_then(|node| node.parent.take());
        if let Some(parent) = parent
            && let Some(parent_node) = self.nodes.get_mut(parent)
        {
            parent_node.children.retain(|&child| child != id);
        }
    }

    /// Check if `potential_ancestor` is `id` or one of its ancestors.
    fn is_ancestor_of(&self, potential_ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.nodes.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    /// Attach `id` and its whole subtree to `queue`, or detach it with `None`.
    ///
    /// Leaving a queue discards everything pending there for the object,
    /// including its timers.
    pub fn set_event_queue(&mut self, id: ObjectId, queue: Option<Arc<EventQueue>>) {
        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));
        for object in subtree {
            let Some(node) = self.nodes.get_mut(object) else {
                continue;
            };
            let unchanged = match (&node.queue, &queue) {
                (Some(old), Some(new)) => Arc::ptr_eq(old, new),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                continue;
            }
            if let Some(old) = node.queue.take() {
                old.remove_object(object);
            }
            if let Some(new) = &queue {
                new.add_object(object);
            }
            node.queue = queue.clone();
        }
    }

    /// Destroy `id` and, recursively, its children.
    ///
    /// In order: [`DESTROYED`] is emitted, the object leaves its event queue
    /// (dropping its pending events, deferred calls and timers), every
    /// connection it takes part in is removed from both ends, it is detached
    /// from its parent, its children are destroyed in order, and finally its
    /// handler is dropped. Destroying an unknown or already-dying object does
    /// nothing.
    #[tracing::instrument(skip(self), target = "kestrel_core::object", level = "trace")]
    pub fn destroy(&mut self, id: ObjectId) {
        match self.nodes.get_mut(id) {
            Some(node) if !node.destroying => node.destroying = true,
            _ => return,
        }

        if self.node(id).is_some_and(|node| node.queue.is_some() && !node.signals_blocked) {
            self.dispatch_signal(id, DESTROYED.name(), &id, &|| Box::new(id) as Box<dyn Any + Send>);
        }

        if let Some(queue) = self.nodes.get(id).and_then(|node| node.queue.clone()) {
            queue.remove_object(id);
        }
        self.disconnect_all(id);
        self.detach_from_parent(id);

        let children = self
            .nodes
            .get_mut(id)
            .map(|node| std::mem::take(&mut node.children))
            .unwrap_or_default();
        tracing::trace!(target: "kestrel_core::object", ?id, child_count = children.len(), "destroying object tree");
        for child in children {
            self.destroy(child);
        }

        if let Some(node) = self.nodes.remove(id) {
            tracing::trace!(target: "kestrel_core::object", ?id, type_name = node.type_name, "object destroyed");
        }
    }

    /// Check if an object exists (including one mid-destruction).
    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Exists and is not being destroyed.
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.nodes.get(id).is_some_and(|node| !node.destroying)
    }

    pub fn is_destroying(&self, id: ObjectId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.destroying)
    }

    /// Get the parent of an object.
    pub fn parent(&self, id: ObjectId) -> Result<Option<ObjectId>> {
        self.nodes
            .get(id)
            .map(|d| d.parent)
            .ok_or(CoreError::InvalidObject(id))
    }

    /// Get the children of an object, in creation order.
    pub fn children(&self, id: ObjectId) -> Result<&[ObjectId]> {
        self.nodes
            .get(id)
            .map(|d| d.children.as_slice())
            .ok_or(CoreError::InvalidObject(id))
    }

    /// Get the object's name.
    pub fn name(&self, id: ObjectId) -> Result<&str> {
        self.nodes
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(CoreError::InvalidObject(id))
    }

    /// Set the object's name.
    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) -> Result<()> {
        self.nodes
            .get_mut(id)
            .map(|d| d.name = name.into())
            .ok_or(CoreError::InvalidObject(id))
    }

    /// The Rust type name of the object's handler.
    pub fn type_name(&self, id: ObjectId) -> Result<&'static str> {
        self.nodes
            .get(id)
            .map(|d| d.type_name)
            .ok_or(CoreError::InvalidObject(id))
    }

    /// The queue `id` is attached to, if any.
    pub fn event_queue(&self, id: ObjectId) -> Option<Arc<EventQueue>> {
        self.nodes.get(id).and_then(|node| node.queue.clone())
    }

    pub fn object_count(&self) -> usize {
        self.nodes.len()
    }

    /// All objects without a parent.
    pub fn roots(&self) -> Vec<ObjectId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut result = Vec::new();
        let mut current = self.nodes.get(id).and_then(|d| d.parent);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.nodes.get(ancestor).and_then(|d| d.parent);
        }
        result
    }

    /// Every object below `id`, depth-first in child order.
    pub fn descendants(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut result = Vec::new();
        self.collect_descendants(id, &mut result);
        result
    }

    fn collect_descendants(&self, id: ObjectId, result: &mut Vec<ObjectId>) {
        if let Some(node) = self.nodes.get(id) {
            for &child in &node.children {
                result.push(child);
                self.collect_descendants(child, result);
            }
        }
    }

    /// Find the first direct child of `parent` with the given name.
    pub fn find_child_by_name(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        let node = self.nodes.get(parent)?;
        node.children
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|c| c.name == name))
    }

    /// Emitters that `id` has live connections from.
    pub fn bound_objects(&self, id: ObjectId) -> Vec<ObjectId> {
        self.nodes
            .get(id)
            .map(|node| node.bound_objects.clone())
            .unwrap_or_default()
    }

    /// Number of connections with `id` as emitter.
    pub fn observer_count(&self, id: ObjectId) -> usize {
        self.nodes.get(id).map_or(0, |node| node.observers.len())
    }

    /// Borrow an object's handler as its concrete type.
    ///
    /// Returns `None` if the object is missing, of another type, or busy.
    pub fn object<T: Object>(&self, id: ObjectId) -> Option<&T> {
        let handler = self.nodes.get(id)?.handler.as_deref()?;
        (handler as &dyn Any).downcast_ref::<T>()
    }

    /// Mutably borrow an object's handler as its concrete type.
    pub fn object_mut<T: Object>(&mut self, id: ObjectId) -> Option<&mut T> {
        let handler = self.nodes.get_mut(id)?.handler.as_deref_mut()?;
        (handler as &mut dyn Any).downcast_mut::<T>()
    }

    /// Run `f` against the handler of `id` with a context for it.
    pub fn with_object<T, R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut T, &mut ObjectContext<'_>) -> R,
    ) -> Result<R>
    where
        T: Object,
    {
        let found = self.type_name(id)?;
        let result = self.invoke(id, |object, ctx| {
            let object: &mut dyn Any = object;
            object.downcast_mut::<T>().map(|object| f(object, ctx))
        });
        match result {
            Invocation::Done(Some(value)) => Ok(value),
            Invocation::Done(None) => Err(CoreError::TypeMismatch {
                expected: type_name::<T>(),
                found,
            }),
            Invocation::Busy => Err(CoreError::ObjectBusy(id)),
            Invocation::Gone => Err(CoreError::InvalidObject(id)),
        }
    }

    pub(crate) fn invoke<R>(
        &mut self,
        id: ObjectId,
        f: impl FnOnce(&mut dyn Object, &mut ObjectContext<'_>) -> R,
    ) -> Invocation<R> {
        self.invoke_with_painter(id, None, f)
    }

    /// Check out the handler of `id`, run `f`, and put the handler back.
    ///
    /// If the object was destroyed while `f` ran, the handler is dropped here.
    fn invoke_with_painter<R>(
        &mut self,
        id: ObjectId,
        mut painter: Option<&mut dyn Painter>,
        f: impl FnOnce(&mut dyn Object, &mut ObjectContext<'_>) -> R,
    ) -> Invocation<R> {
        let Some(node) = self.nodes.get_mut(id) else {
            return Invocation::Gone;
        };
        let Some(mut handler) = node.handler.take() else {
            return Invocation::Busy;
        };

        let result = {
            let painter: Option<&mut dyn Painter> = match painter.as_mut() {
                Some(painter) => Some(&mut **painter),
                None => None,
            };
            let mut ctx = ObjectContext::new(self, id, painter);
            f(handler.as_mut(), &mut ctx)
        };

        match self.nodes.get_mut(id) {
            Some(node) if node.handler.is_none() => node.handler = Some(handler),
            _ => tracing::trace!(target: "kestrel_core::object", ?id, "handler dropped after destruction"),
        }
        Invocation::Done(result)
    }

    /// Deliver `event` to `target` synchronously. Returns whether the handler
    /// accepted it.
    ///
    /// A target whose handler is already running, including the caller
    /// itself, cannot take the event: it is dropped and `false` is returned.
    /// Use [`ObjectGraph::post_event`] to reach such an object on the next
    /// loop iteration.
    pub fn send_event(&mut self, target: ObjectId, event: &mut Event) -> bool {
        self.deliver(target, event, None)
    }

    pub(crate) fn deliver(
        &mut self,
        target: ObjectId,
        event: &mut Event,
        painter: Option<&mut dyn Painter>,
    ) -> bool {
        match self.invoke_with_painter(target, painter, |object, ctx| object.event(ctx, event)) {
            Invocation::Done(handled) => handled,
            Invocation::Busy => {
                tracing::debug!(
                    target: "kestrel_core::object",
                    ?target,
                    kind = ?event.kind(),
                    "event for busy object dropped"
                );
                false
            }
            Invocation::Gone => false,
        }
    }

    /// Queue `event` for `target` on its event queue.
    pub fn post_event(&self, target: ObjectId, event: Event) -> bool {
        match self.event_queue(target) {
            Some(queue) => queue.post_event(target, event),
            None => {
                tracing::debug!(target: "kestrel_core::object", ?target, "post to detached object ignored");
                false
            }
        }
    }

    /// Schedule a repaint of `id`. Several requests before the next
    /// iteration collapse into one paint event.
    pub fn update(&self, id: ObjectId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.event_queue(id).is_some_and(|queue| queue.post_paint(id))
    }

    /// Run `call` with a context for `target` on a later loop iteration.
    pub fn invoke_later<F>(&self, target: ObjectId, call: F) -> bool
    where
        F: FnOnce(&mut ObjectContext<'_>) + Send + 'static,
    {
        match self.event_queue(target) {
            Some(queue) => {
                queue.post_action(DeferredAction::Call {
                    target,
                    call: Box::new(call),
                });
                true
            }
            None => false,
        }
    }

    /// Run a deferred action popped from an event queue.
    pub fn run_action(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::Slot {
                emitter,
                connection,
                args,
                ..
            } => {
                self.run_deferred_slot(emitter, connection, args.as_ref());
            }
            DeferredAction::Call { target, call } => {
                if self.is_live(target) {
                    let mut ctx = ObjectContext::new(self, target, None);
                    call(&mut ctx);
                } else {
                    tracing::trace!(target: "kestrel_core::object", ?target, "deferred call for dead object dropped");
                }
            }
        }
    }
}

/// The view a running handler or slot has of the graph.
///
/// It dereferences to the [`ObjectGraph`], so every graph operation is
/// available, and adds shorthands that act on the current object.
pub struct ObjectContext<'a> {
    graph: &'a mut ObjectGraph,
    current: ObjectId,
    painter: Option<&'a mut dyn Painter>,
}

impl<'a> ObjectContext<'a> {
    pub(crate) fn new(
        graph: &'a mut ObjectGraph,
        current: ObjectId,
        painter: Option<&'a mut dyn Painter>,
    ) -> Self {
        Self {
            graph,
            current,
            painter,
        }
    }

    /// The object this context runs for.
    pub fn id(&self) -> ObjectId {
        self.current
    }

    /// Emit `signal` from the current object.
    pub fn emit<A>(&mut self, signal: Signal<A>, args: A) -> usize
    where
        A: Clone + Send + 'static,
    {
        let id = self.current;
        self.graph.emit(id, signal, args)
    }

    /// Emit `signal` from the current object, deferring every slot call.
    pub fn emit_queued<A>(&mut self, signal: Signal<A>, args: A) -> usize
    where
        A: Clone + Send + 'static,
    {
        let id = self.current;
        self.graph.emit_queued(id, signal, args)
    }

    /// Schedule a repaint of the current object.
    pub fn update(&self) -> bool {
        self.graph.update(self.current)
    }

    /// Run `call` for the current object on a later loop iteration.
    pub fn defer<F>(&self, call: F) -> bool
    where
        F: FnOnce(&mut ObjectContext<'_>) + Send + 'static,
    {
        self.graph.invoke_later(self.current, call)
    }

    /// Start a timer owned by the current object.
    pub fn start_timer(&self, interval: Duration, kind: TimerKind) -> Result<TimerId> {
        let queue = self
            .graph
            .event_queue(self.current)
            .ok_or(CoreError::NoEventQueue(self.current))?;
        Ok(queue.start_timer(self.current, interval, kind))
    }

    /// Stop a timer. Returns `false` if it was not running.
    pub fn kill_timer(&self, id: TimerId) -> bool {
        self.graph
            .event_queue(self.current)
            .is_some_and(|queue| queue.stop_timer(id).is_ok())
    }

    /// Current time on the queue's clock.
    pub fn now(&self) -> Instant {
        self.graph
            .event_queue(self.current)
            .map_or_else(Instant::now, |queue| queue.now())
    }

    /// Ask the platform to change the current object's native window.
    pub fn request_window(&self, command: WindowCommand) -> bool {
        match self.graph.event_queue(self.current) {
            Some(queue) => {
                queue.push_command(self.current, command);
                true
            }
            None => false,
        }
    }

    /// Ask the event loop to stop with `code`.
    pub fn request_quit(&self, code: i32) {
        if let Some(queue) = self.graph.event_queue(self.current) {
            queue.request_quit(code);
        }
    }

    /// The painter for the paint event being delivered, if any.
    pub fn painter(&mut self) -> Option<&mut (dyn Painter + 'a)> {
        self.painter.as_deref_mut()
    }

    /// Take the painter out of the context so it can be used alongside it.
    pub fn take_painter(&mut self) -> Option<&'a mut dyn Painter> {
        self.painter.take()
    }
}

impl Deref for ObjectContext<'_> {
    type Target = ObjectGraph;

    fn deref(&self) -> &ObjectGraph {
        self.graph
    }
}

impl DerefMut for ObjectContext<'_> {
    fn deref_mut(&mut self) -> &mut ObjectGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::SystemClock;
    use crate::event::{CustomEvent, Event};
    use crate::signal::Slot;

    struct TestObject {
        value: i32,
    }
    impl Object for TestObject {}

    struct DropFlag(Rc<Cell<u32>>);
    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }
    impl Object for DropFlag {}

    struct Echo {
        received: u32,
    }
    impl Object for Echo {
        fn event(&mut self, _ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
            if matches!(event, Event::Custom(_)) {
                self.received += 1;
                return true;
            }
            false
        }
    }

    fn queue() -> Arc<EventQueue> {
        Arc::new(EventQueue::new(Arc::new(SystemClock)))
    }

    #[test]
    fn test_object_creation() {
        let mut graph = ObjectGraph::new();
        let id = graph.create(TestObject { value: 42 });
        assert!(graph.contains(id));
        assert_eq!(graph.object::<TestObject>(id).unwrap().value, 42);
        assert!(graph.type_name(id).unwrap().ends_with("TestObject"));
        assert_eq!(graph.parent(id).unwrap(), None);
    }

    #[test]
    fn test_parent_child() {
        let mut graph = ObjectGraph::new();
        let parent = graph.create(TestObject { value: 0 });
        let a = graph.create_child(parent, TestObject { value: 1 }).unwrap();
        let b = graph.create_child(parent, TestObject { value: 2 }).unwrap();

        assert_eq!(graph.children(parent).unwrap(), &[a, b]);
        assert_eq!(graph.parent(a).unwrap(), Some(parent));
        assert_eq!(graph.ancestors(a), vec![parent]);
    }

    #[test]
    fn test_circular_parentage_prevention() {
        let mut graph = ObjectGraph::new();
        let a = graph.create(TestObject { value: 0 });
        let b = graph.create_child(a, TestObject { value: 0 }).unwrap();
        let c = graph.create_child(b, TestObject { value: 0 }).unwrap();

        assert!(matches!(graph.set_parent(a, Some(c)), Err(CoreError::CircularParentage)));
        assert!(matches!(graph.set_parent(a, Some(a)), Err(CoreError::CircularParentage)));
    }

    #[test]
    fn test_reparent_moves_between_children_lists() {
        let mut graph = ObjectGraph::new();
        let a = graph.create(TestObject { value: 0 });
        let b = graph.create(TestObject { value: 0 });
        let child = graph.create_child(a, TestObject { value: 0 }).unwrap();

        graph.set_parent(child, Some(b)).unwrap();
        assert!(graph.children(a).unwrap().is_empty());
        assert_eq!(graph.children(b).unwrap(), &[child]);

        graph.set_parent(child, None).unwrap();
        assert!(graph.children(b).unwrap().is_empty());
        assert!(graph.roots().contains(&child));
    }

    #[test]
    fn test_cascade_destroy_drops_handlers() {
        let drops = Rc::new(Cell::new(0));
        let mut graph = ObjectGraph::new();
        let root = graph.create(DropFlag(Rc::clone(&drops)));
        let child = graph.create_child(root, DropFlag(Rc::clone(&drops))).unwrap();
        graph.create_child(child, DropFlag(Rc::clone(&drops))).unwrap();

        graph.destroy(root);
        assert_eq!(drops.get(), 3);
        assert_eq!(graph.object_count(), 0);
        assert!(!graph.contains(child));

        // Destroying again is a no-op.
        graph.destroy(root);
    }

    #[test]
    fn test_destroy_child_detaches_from_parent() {
        let mut graph = ObjectGraph::new();
        let parent = graph.create(TestObject { value: 0 });
        let a = graph.create_child(parent, TestObject { value: 0 }).unwrap();
        let b = graph.create_child(parent, TestObject { value: 0 }).unwrap();
        graph.destroy(a);
        assert_eq!(graph.children(parent).unwrap(), &[b]);
    }

    #[test]
    fn test_create_child_of_dead_parent_fails() {
        let mut graph = ObjectGraph::new();
        let parent = graph.create(TestObject { value: 0 });
        graph.destroy(parent);
        assert!(matches!(
            graph.create_child(parent, TestObject { value: 0 }),
            Err(CoreError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_names_and_lookup() {
        let mut graph = ObjectGraph::new();
        let parent = graph.create(TestObject { value: 0 });
        let child = graph.create_child(parent, TestObject { value: 0 }).unwrap();
        graph.set_name(child, "ok_button").unwrap();

        assert_eq!(graph.name(child).unwrap(), "ok_button");
        assert_eq!(graph.find_child_by_name(parent, "ok_button"), Some(child));
        assert_eq!(graph.find_child_by_name(parent, "missing"), None);
    }

    #[test]
    fn test_with_object_type_mismatch() {
        let mut graph = ObjectGraph::new();
        let id = graph.create(TestObject { value: 0 });
        let err = graph.with_object::<Echo, _>(id, |_, _| ()).unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));

        graph
            .with_object::<TestObject, _>(id, |obj, _| obj.value = 5)
            .unwrap();
        assert_eq!(graph.object::<TestObject>(id).unwrap().value, 5);
    }

    #[test]
    fn test_reentrant_access_is_busy() {
        let mut graph = ObjectGraph::new();
        let id = graph.create(TestObject { value: 0 });
        let inner = graph
            .with_object::<TestObject, _>(id, |_, ctx| {
                assert!(ctx.object::<TestObject>(ctx.id()).is_none());
                ctx.with_object::<TestObject, _>(id, |_, _| ())
            })
            .unwrap();
        assert!(matches!(inner, Err(CoreError::ObjectBusy(_))));
    }

    #[test]
    fn test_send_event_is_synchronous() {
        let mut graph = ObjectGraph::new();
        let id = graph.create(Echo { received: 0 });
        assert!(graph.send_event(id, &mut Event::Custom(CustomEvent::new(1, ()))));
        assert!(!graph.send_event(id, &mut Event::paint()));
        assert_eq!(graph.object::<Echo>(id).unwrap().received, 1);
    }

    #[test]
    fn test_send_event_to_running_handler_is_dropped() {
        let mut graph = ObjectGraph::new();
        let id = graph.create(Echo { received: 0 });
        let accepted = graph
            .with_object::<Echo, _>(id, |_, ctx| {
                let me = ctx.id();
                ctx.send_event(me, &mut Event::Custom(CustomEvent::new(1, ())))
            })
            .unwrap();
        assert!(!accepted);
        assert_eq!(graph.object::<Echo>(id).unwrap().received, 0);
    }

    #[test]
    fn test_queue_follows_tree() {
        let mut graph = ObjectGraph::new();
        let q = queue();
        let root = graph.create(TestObject { value: 0 });
        let child = graph.create_child(root, TestObject { value: 0 }).unwrap();
        assert!(graph.event_queue(child).is_none());

        graph.set_event_queue(root, Some(Arc::clone(&q)));
        assert!(q.contains_object(root));
        assert!(q.contains_object(child));

        let late = graph.create_child(root, TestObject { value: 0 }).unwrap();
        assert!(q.contains_object(late));

        graph.destroy(child);
        assert!(!q.contains_object(child));
    }

    #[test]
    fn test_destroyed_signal_fires_before_teardown() {
        struct Watcher {
            seen: Vec<ObjectId>,
        }
        impl Object for Watcher {}

        let mut graph = ObjectGraph::new();
        let q = queue();
        let watched = graph.create(TestObject { value: 0 });
        let watcher = graph.create(Watcher { seen: Vec::new() });
        graph.set_event_queue(watched, Some(Arc::clone(&q)));
        graph.set_event_queue(watcher, Some(q));

        graph.connect(
            watched,
            DESTROYED,
            watcher,
            Slot::new("on_destroyed", |w: &mut Watcher, ctx, id: &ObjectId| {
                assert!(ctx.contains(*id));
                w.seen.push(*id);
            }),
        );
        graph.destroy(watched);

        assert_eq!(graph.object::<Watcher>(watcher).unwrap().seen, vec![watched]);
        assert!(graph.bound_objects(watcher).is_empty());
    }
}

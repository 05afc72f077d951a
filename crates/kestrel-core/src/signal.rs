//! Signal/slot connections between objects in an [`ObjectGraph`].
//!
//! A [`Signal`] is a typed name declared as an associated constant on the
//! emitting type. Connecting a signal binds it to a [`Slot`] on a subscriber
//! object; emitting it calls every bound slot synchronously, in connection
//! order, on the thread that owns the graph.
//!
//! Connections are bidirectional bookkeeping: the emitter keeps its list of
//! observers and the subscriber keeps the list of emitters it is bound to.
//! Destroying either endpoint removes the connection from both sides, so a
//! slot is never called on an object that no longer exists.
//!
//! # Example
//!
//! ```
//! use kestrel_core::{Application, HeadlessPlatform, Object, Signal, Slot};
//!
//! struct Switch;
//! impl Switch {
//!     const TOGGLED: Signal<bool> = Signal::new("toggled");
//! }
//! impl Object for Switch {}
//!
//! struct Lamp {
//!     lit: bool,
//! }
//! impl Object for Lamp {}
//!
//! let mut app = Application::new(HeadlessPlatform::new());
//! let switch = app.create_root(Switch);
//! let lamp = app.create_root(Lamp { lit: false });
//!
//! let graph = app.graph_mut();
//! graph.connect(
//!     switch,
//!     Switch::TOGGLED,
//!     lamp,
//!     Slot::new("set_lit", |lamp: &mut Lamp, _ctx, on: &bool| lamp.lit = *on),
//! );
//! assert_eq!(graph.emit(switch, Switch::TOGGLED, true), 1);
//! assert!(graph.object::<Lamp>(lamp).unwrap().lit);
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::object::{Invocation, Object, ObjectContext, ObjectGraph, ObjectId};
use crate::queue::DeferredAction;

/// A typed signal name.
///
/// Signals carry no state; they identify which observers an emission reaches.
/// `A` is the argument type passed by reference to every slot.
pub struct Signal<A> {
    name: &'static str,
    _args: PhantomData<fn(A)>,
}

impl<A> Signal<A> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _args: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<A> Clone for Signal<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for Signal<A> {}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.name).finish()
    }
}

/// Unique identifier for a signal-slot connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// A named method on subscriber type `S` accepting arguments of type `A`.
///
/// The name identifies the slot for duplicate detection: connecting the same
/// signal to the same slot of the same subscriber twice yields one connection.
pub struct Slot<S, A> {
    name: &'static str,
    func: Rc<dyn Fn(&mut S, &mut ObjectContext<'_>, &A)>,
}

impl<S, A> Slot<S, A> {
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&mut S, &mut ObjectContext<'_>, &A) + 'static,
    {
        Self {
            name,
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<S, A> Clone for Slot<S, A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            func: Rc::clone(&self.func),
        }
    }
}

impl<S, A> fmt::Debug for Slot<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.name).finish()
    }
}

type MethodFn = dyn Fn(&mut dyn Object, &mut ObjectContext<'_>, &dyn Any);
type FreeFn = dyn Fn(&mut ObjectContext<'_>, &dyn Any);

/// Type-erased slot body stored in an emitter's observer list.
#[derive(Clone)]
pub(crate) enum SlotFn {
    /// Runs against the subscriber's handler.
    Method(Rc<MethodFn>),
    /// A free function with no subscriber; runs in the emitter's context.
    Free(Rc<FreeFn>),
}

fn method_slot<F>(f: F) -> SlotFn
where
    F: Fn(&mut dyn Object, &mut ObjectContext<'_>, &dyn Any) + 'static,
{
    SlotFn::Method(Rc::new(f))
}

fn free_slot<F>(f: F) -> SlotFn
where
    F: Fn(&mut ObjectContext<'_>, &dyn Any) + 'static,
{
    SlotFn::Free(Rc::new(f))
}

/// One entry in an emitter's observer list.
pub(crate) struct Observer {
    pub(crate) id: ConnectionId,
    pub(crate) signal: &'static str,
    pub(crate) subscriber: Option<ObjectId>,
    pub(crate) slot_name: Option<&'static str>,
    pub(crate) slot: SlotFn,
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("signal", &self.signal)
            .field("subscriber", &self.subscriber)
            .field("slot", &self.slot_name)
            .finish()
    }
}

struct Target {
    connection: ConnectionId,
    subscriber: Option<ObjectId>,
    slot: SlotFn,
}

impl ObjectGraph {
    /// Connect `signal` on `emitter` to `slot` on `subscriber`.
    ///
    /// Returns `None` if either endpoint is missing or being destroyed. A
    /// repeated connection of the same signal, subscriber and slot returns the
    /// existing id instead of adding a second one.
    pub fn connect<S, A>(
        &mut self,
        emitter: ObjectId,
        signal: Signal<A>,
        subscriber: ObjectId,
        slot: Slot<S, A>,
    ) -> Option<ConnectionId>
    where
        S: Object,
        A: 'static,
    {
        if !self.is_live(emitter) || !self.is_live(subscriber) {
            tracing::debug!(
                target: "kestrel_core::signal",
                ?emitter,
                ?subscriber,
                signal = signal.name(),
                "connect with a dead endpoint ignored"
            );
            return None;
        }

        let existing = self.node(emitter).and_then(|node| {
            node.observers
                .iter()
                .find(|o| {
                    o.signal == signal.name()
                        && o.subscriber == Some(subscriber)
                        && o.slot_name == Some(slot.name)
                })
                .map(|o| o.id)
        });
        if let Some(id) = existing {
            tracing::trace!(target: "kestrel_core::signal", ?id, "duplicate connection reused");
            return Some(id);
        }

        let slot_name = slot.name;
        let func = slot.func;
        let erased = method_slot(move |object, ctx, args| {
            let object: &mut dyn Any = object;
            match (object.downcast_mut::<S>(), args.downcast_ref::<A>()) {
                (Some(target), Some(args)) => func(target, ctx, args),
                _ => tracing::warn!(
                    target: "kestrel_core::signal",
                    slot = slot_name,
                    "slot type mismatch, call dropped"
                ),
            }
        });

        let id = self.register_observer(emitter, signal.name(), Some(subscriber), Some(slot_name), erased);
        if let Some(node) = self.node_mut(subscriber)
            && !node.bound_objects.contains(&emitter)
        {
            node.bound_objects.push(emitter);
        }
        tracing::trace!(
            target: "kestrel_core::signal",
            ?id,
            ?emitter,
            ?subscriber,
            signal = signal.name(),
            slot = slot_name,
            "connected"
        );
        id
    }

    /// Connect `signal` on `emitter` to a closure with no subscriber object.
    ///
    /// The closure runs with a context for the emitter and lives until it is
    /// disconnected or the emitter is destroyed.
    pub fn connect_fn<A, F>(
        &mut self,
        emitter: ObjectId,
        signal: Signal<A>,
        f: F,
    ) -> Option<ConnectionId>
    where
        A: 'static,
        F: Fn(&mut ObjectContext<'_>, &A) + 'static,
    {
        if !self.is_live(emitter) {
            tracing::debug!(
                target: "kestrel_core::signal",
                ?emitter,
                signal = signal.name(),
                "connect on a dead emitter ignored"
            );
            return None;
        }
        let erased = free_slot(move |ctx, args| {
            if let Some(args) = args.downcast_ref::<A>() {
                f(ctx, args);
            }
        });
        self.register_observer(emitter, signal.name(), None, None, erased)
    }

    fn register_observer(
        &mut self,
        emitter: ObjectId,
        signal: &'static str,
        subscriber: Option<ObjectId>,
        slot_name: Option<&'static str>,
        slot: SlotFn,
    ) -> Option<ConnectionId> {
        let id = self.next_connection_id();
        let node = self.node_mut(emitter)?;
        node.observers.push(Observer {
            id,
            signal,
            subscriber,
            slot_name,
            slot,
        });
        self.connections.insert(id, emitter);
        Some(id)
    }

    fn next_connection_id(&mut self) -> ConnectionId {
        self.next_connection += 1;
        ConnectionId(self.next_connection)
    }

    /// Remove a single connection. Returns `false` if it no longer exists.
    pub fn disconnect(&mut self, connection: ConnectionId) -> bool {
        let Some(emitter) = self.connections.remove(&connection) else {
            return false;
        };
        let Some(node) = self.node_mut(emitter) else {
            return false;
        };
        let Some(index) = node.observers.iter().position(|o| o.id == connection) else {
            return false;
        };
        let observer = node.observers.remove(index);

        // Drop the back-reference once the last connection to this emitter goes.
        if let Some(subscriber) = observer.subscriber {
            let still_bound = node
                .observers
                .iter()
                .any(|o| o.subscriber == Some(subscriber));
            if !still_bound && let Some(sub) = self.node_mut(subscriber) {
                sub.bound_objects.retain(|e| *e != emitter);
            }
        }
        tracing::trace!(target: "kestrel_core::signal", ?connection, "disconnected");
        true
    }

    /// Remove every connection in which `id` takes part, as emitter or as
    /// subscriber.
    pub fn disconnect_all(&mut self, id: ObjectId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let bound = std::mem::take(&mut node.bound_objects);
        let observers = std::mem::take(&mut node.observers);

        let mut removed = Vec::new();
        for emitter in bound {
            if let Some(emitter_node) = self.node_mut(emitter) {
                emitter_node.observers.retain(|o| {
                    let ours = o.subscriber == Some(id);
                    if ours {
                        removed.push(o.id);
                    }
                    !ours
                });
            }
        }

        for observer in &observers {
            removed.push(observer.id);
            if let Some(subscriber) = observer.subscriber
                && subscriber != id
                && let Some(sub) = self.node_mut(subscriber)
            {
                sub.bound_objects.retain(|e| *e != id);
            }
        }

        for connection in &removed {
            self.connections.remove(connection);
        }
        if !removed.is_empty() {
            tracing::trace!(target: "kestrel_core::signal", ?id, count = removed.len(), "disconnected all");
        }
    }

    /// Whether `connection` is still in place.
    pub fn is_connected(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    /// Suppress or re-enable every emission from `id`.
    pub fn block_signals(&mut self, id: ObjectId, blocked: bool) {
        if let Some(node) = self.node_mut(id) {
            node.signals_blocked = blocked;
        }
    }

    pub fn signals_blocked(&self, id: ObjectId) -> bool {
        self.node(id).is_some_and(|node| node.signals_blocked)
    }

    /// Emit `signal` from `emitter`, calling every connected slot in
    /// connection order. Returns the number of slots reached.
    ///
    /// Nothing happens if the emitter is unknown, destroyed, detached from
    /// its event queue, or has its signals blocked. A slot whose subscriber is
    /// already running further up the stack is queued instead of being
    /// re-entered.
    pub fn emit<A>(&mut self, emitter: ObjectId, signal: Signal<A>, args: A) -> usize
    where
        A: Clone + Send + 'static,
    {
        if !self.can_emit(emitter, signal.name()) {
            return 0;
        }
        self.dispatch_signal(emitter, signal.name(), &args, &|| Box::new(args.clone()) as Box<dyn Any + Send>)
    }

    /// Emit `signal` with every slot call deferred to the event loop.
    pub fn emit_queued<A>(&mut self, emitter: ObjectId, signal: Signal<A>, args: A) -> usize
    where
        A: Clone + Send + 'static,
    {
        if !self.can_emit(emitter, signal.name()) {
            return 0;
        }
        let Some(queue) = self.event_queue(emitter) else {
            return 0;
        };
        let targets = self.targets(emitter, signal.name());
        for target in &targets {
            queue.post_action(DeferredAction::Slot {
                emitter,
                subscriber: target.subscriber,
                connection: target.connection,
                args: Box::new(args.clone()),
            });
        }
        targets.len()
    }

    fn can_emit(&self, emitter: ObjectId, signal: &'static str) -> bool {
        let Some(node) = self.node(emitter) else {
            tracing::debug!(target: "kestrel_core::signal", ?emitter, signal, "emit from unknown object ignored");
            return false;
        };
        if node.destroying {
            tracing::debug!(target: "kestrel_core::signal", ?emitter, signal, "emit from destroyed object ignored");
            return false;
        }
        if node.queue.is_none() {
            tracing::debug!(target: "kestrel_core::signal", ?emitter, signal, "emit from detached object ignored");
            return false;
        }
        if node.signals_blocked {
            tracing::trace!(target: "kestrel_core::signal", ?emitter, signal, "signals blocked, skipping emit");
            return false;
        }
        true
    }

    fn targets(&self, emitter: ObjectId, signal: &'static str) -> Vec<Target> {
        self.node(emitter)
            .map(|node| {
                node.observers
                    .iter()
                    .filter(|o| o.signal == signal)
                    .map(|o| Target {
                        connection: o.id,
                        subscriber: o.subscriber,
                        slot: o.slot.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Call every slot bound to `signal` on `emitter`.
    ///
    /// The observer list is snapshotted first; a connection removed by an
    /// earlier slot is skipped when its turn comes.
    #[tracing::instrument(skip(self, args, boxed), target = "kestrel_core::signal", level = "trace")]
    pub(crate) fn dispatch_signal(
        &mut self,
        emitter: ObjectId,
        signal: &'static str,
        args: &dyn Any,
        boxed: &dyn Fn() -> Box<dyn Any + Send>,
    ) -> usize {
        let targets = self.targets(emitter, signal);
        tracing::trace!(target: "kestrel_core::signal", count = targets.len(), "emitting signal");

        let mut reached = 0;
        for target in targets {
            if !self.connections.contains_key(&target.connection) {
                continue;
            }
            reached += 1;
            match (target.subscriber, target.slot) {
                (Some(subscriber), SlotFn::Method(func)) => {
                    match self.invoke(subscriber, |object, ctx| func(object, ctx, args)) {
                        Invocation::Done(()) => {}
                        Invocation::Busy => {
                            tracing::trace!(
                                target: "kestrel_core::signal",
                                ?subscriber,
                                "subscriber busy, slot call queued"
                            );
                            if let Some(queue) = self.event_queue(emitter) {
                                queue.post_action(DeferredAction::Slot {
                                    emitter,
                                    subscriber: Some(subscriber),
                                    connection: target.connection,
                                    args: boxed(),
                                });
                            }
                        }
                        Invocation::Gone => reached -= 1,
                    }
                }
                (_, SlotFn::Free(func)) => {
                    let mut ctx = ObjectContext::new(self, emitter, None);
                    func(&mut ctx, args);
                }
                (None, SlotFn::Method(_)) => reached -= 1,
            }
        }
        reached
    }

    /// Run a slot call that was deferred by [`ObjectGraph::emit_queued`] or
    /// by a busy subscriber.
    pub(crate) fn run_deferred_slot(
        &mut self,
        emitter: ObjectId,
        connection: ConnectionId,
        args: &dyn Any,
    ) -> bool {
        if self.connections.get(&connection) != Some(&emitter) {
            tracing::trace!(target: "kestrel_core::signal", ?connection, "deferred slot for removed connection dropped");
            return false;
        }
        let Some(target) = self.node(emitter).and_then(|node| {
            node.observers
                .iter()
                .find(|o| o.id == connection)
                .map(|o| Target {
                    connection: o.id,
                    subscriber: o.subscriber,
                    slot: o.slot.clone(),
                })
        }) else {
            return false;
        };

        match (target.subscriber, target.slot) {
            (Some(subscriber), SlotFn::Method(func)) => {
                match self.invoke(subscriber, |object, ctx| func(object, ctx, args)) {
                    Invocation::Done(()) => true,
                    Invocation::Busy => {
                        tracing::warn!(
                            target: "kestrel_core::signal",
                            ?subscriber,
                            connection = ?target.connection,
                            "subscriber busy during deferred slot call, dropped"
                        );
                        false
                    }
                    Invocation::Gone => false,
                }
            }
            (_, SlotFn::Free(func)) => {
                let mut ctx = ObjectContext::new(self, emitter, None);
                func(&mut ctx, args);
                true
            }
            (None, SlotFn::Method(_)) => false,
        }
    }
}

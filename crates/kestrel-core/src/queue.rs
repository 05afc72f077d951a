//! The per-thread event queue.
//!
//! An [`EventQueue`] belongs to one event loop. Objects attached to it are
//! registered as live; events, deferred slot calls, paint requests, window
//! commands and timers addressed to them are held here until the loop
//! drains them. The queue is `Send + Sync` so other threads can post to it
//! and wake the loop; everything it holds is plain data, never a reference
//! into the object graph.

use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::error::Result;
use crate::event::{Event, PaintEvent, TimerEvent};
use crate::object::{ObjectContext, ObjectId};
use crate::platform::WindowCommand;
use crate::signal::ConnectionId;
use crate::timer::{TimerId, TimerKind, TimerManager};

/// An event waiting for delivery.
#[derive(Debug)]
pub struct QueuedEvent {
    pub target: ObjectId,
    pub event: Event,
}

/// Work deferred to a later loop iteration.
pub enum DeferredAction {
    /// A slot call that could not run synchronously.
    Slot {
        emitter: ObjectId,
        /// `None` for a free-function connection.
        subscriber: Option<ObjectId>,
        connection: ConnectionId,
        args: Box<dyn Any + Send>,
    },
    /// A closure to run with a context for `target`.
    Call {
        target: ObjectId,
        call: Box<dyn FnOnce(&mut ObjectContext<'_>) + Send>,
    },
}

impl DeferredAction {
    /// Objects whose destruction makes this action pointless.
    fn involves(&self, id: ObjectId) -> bool {
        match self {
            Self::Slot {
                emitter, subscriber, ..
            } => *emitter == id || *subscriber == Some(id),
            Self::Call { target, .. } => *target == id,
        }
    }
}

impl fmt::Debug for DeferredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot {
                emitter,
                subscriber,
                connection,
                ..
            } => f
                .debug_struct("Slot")
                .field("emitter", emitter)
                .field("subscriber", subscriber)
                .field("connection", connection)
                .finish_non_exhaustive(),
            Self::Call { target, .. } => f
                .debug_struct("Call")
                .field("target", target)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Default)]
struct QueueState {
    objects: HashSet<ObjectId>,
    events: VecDeque<QueuedEvent>,
    actions: VecDeque<DeferredAction>,
    pending_paint: HashSet<ObjectId>,
    timers: TimerManager,
    commands: VecDeque<(ObjectId, WindowCommand)>,
    quit: Option<i32>,
}

/// FIFO event queue shared between an event loop and the threads posting
/// to it.
pub struct EventQueue {
    state: Mutex<QueueState>,
    clock: Arc<dyn Clock>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

static_assertions::assert_impl_all!(EventQueue: Send, Sync);
static_assertions::assert_impl_all!(DeferredAction: Send);

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventQueue")
            .field("objects", &state.objects.len())
            .field("events", &state.events.len())
            .field("actions", &state.actions.len())
            .field("timers", &state.timers.active_count())
            .finish_non_exhaustive()
    }
}

impl EventQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            state: Mutex::new(QueueState::default()),
            clock,
            wake_tx,
            wake_rx,
        }
    }

    /// Current time on this queue's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Register `id` as a live object of this queue.
    pub fn add_object(&self, id: ObjectId) {
        self.state.lock().objects.insert(id);
    }

    /// Deregister `id` and discard everything pending for it.
    pub fn remove_object(&self, id: ObjectId) {
        let mut state = self.state.lock();
        if !state.objects.remove(&id) {
            return;
        }
        let events_before = state.events.len();
        state.events.retain(|e| e.target != id);
        let dropped_events = events_before - state.events.len();
        state.actions.retain(|a| !a.involves(id));
        state.pending_paint.remove(&id);
        state.commands.retain(|(target, _)| *target != id);
        let dropped_timers = state.timers.stop_owned_by(id);
        tracing::trace!(
            target: "kestrel_core::queue",
            ?id,
            dropped_events,
            dropped_timers,
            "object removed from queue"
        );
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.state.lock().objects.contains(&id)
    }

    /// Append `event` for `target`. Returns `false` if `target` is not a live
    /// object of this queue.
    pub fn post_event(&self, target: ObjectId, event: Event) -> bool {
        {
            let mut state = self.state.lock();
            if !state.objects.contains(&target) {
                tracing::debug!(target: "kestrel_core::queue", ?target, "post to unregistered object ignored");
                return false;
            }
            state.events.push_back(QueuedEvent { target, event });
        }
        self.wake();
        true
    }

    /// Queue a paint event for `target` unless one is already pending.
    pub fn post_paint(&self, target: ObjectId) -> bool {
        {
            let mut state = self.state.lock();
            if !state.objects.contains(&target) {
                return false;
            }
            if !state.pending_paint.insert(target) {
                tracing::trace!(target: "kestrel_core::queue", ?target, "paint already pending");
                return true;
            }
            state.events.push_back(QueuedEvent {
                target,
                event: Event::Paint(PaintEvent::full()),
            });
        }
        self.wake();
        true
    }

    pub fn post_action(&self, action: DeferredAction) {
        self.state.lock().actions.push_back(action);
        self.wake();
    }

    /// Take the oldest event whose target is still live.
    pub fn pop_event(&self) -> Option<QueuedEvent> {
        let mut state = self.state.lock();
        while let Some(queued) = state.events.pop_front() {
            if !state.objects.contains(&queued.target) {
                continue;
            }
            if matches!(queued.event, Event::Paint(_)) {
                state.pending_paint.remove(&queued.target);
            }
            return Some(queued);
        }
        None
    }

    pub fn pop_action(&self) -> Option<DeferredAction> {
        self.state.lock().actions.pop_front()
    }

    /// Move up to `max` of the oldest live events out of the queue in one
    /// step. Paints taken here may be requested again right away.
    pub fn take_events(&self, max: usize) -> VecDeque<QueuedEvent> {
        let mut state = self.state.lock();
        let mut batch = VecDeque::new();
        while batch.len() < max {
            let Some(queued) = state.events.pop_front() else {
                break;
            };
            if !state.objects.contains(&queued.target) {
                continue;
            }
            if matches!(queued.event, Event::Paint(_)) {
                state.pending_paint.remove(&queued.target);
            }
            batch.push_back(queued);
        }
        batch
    }

    /// Move up to `max` of the oldest deferred actions out of the queue.
    pub fn take_actions(&self, max: usize) -> VecDeque<DeferredAction> {
        let mut state = self.state.lock();
        let count = max.min(state.actions.len());
        state.actions.drain(..count).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn pending_actions(&self) -> usize {
        self.state.lock().actions.len()
    }

    /// Discard every pending event addressed to `id`.
    pub fn clear_object_events(&self, id: ObjectId) -> usize {
        let mut state = self.state.lock();
        let before = state.events.len();
        state.events.retain(|e| e.target != id);
        state.pending_paint.remove(&id);
        before - state.events.len()
    }

    /// Discard every deferred action for `id`.
    pub fn clear_object_actions(&self, id: ObjectId) -> usize {
        let mut state = self.state.lock();
        let before = state.actions.len();
        state.actions.retain(|a| !a.involves(id));
        before - state.actions.len()
    }

    /// Start a timer owned by `owner`.
    pub fn start_timer(&self, owner: ObjectId, interval: Duration, kind: TimerKind) -> TimerId {
        let now = self.now();
        let id = self.state.lock().timers.start(owner, interval, kind, now);
        self.wake();
        id
    }

    pub fn stop_timer(&self, id: TimerId) -> Result<()> {
        self.state.lock().timers.stop(id)
    }

    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.state.lock().timers.is_active(id)
    }

    pub fn active_timers(&self) -> usize {
        self.state.lock().timers.active_count()
    }

    /// Turn every expired timer into a queued [`Event::Timer`]. Returns the
    /// number of events queued.
    pub fn process_timers(&self) -> usize {
        let now = self.now();
        let mut state = self.state.lock();
        let fired = state.timers.process_expired(now);
        let mut queued = 0;
        for (owner, id) in fired {
            if state.objects.contains(&owner) {
                state.events.push_back(QueuedEvent {
                    target: owner,
                    event: Event::Timer(TimerEvent { id }),
                });
                queued += 1;
            }
        }
        queued
    }

    pub fn time_until_next_timer(&self) -> Option<Duration> {
        let now = self.now();
        self.state.lock().timers.time_until_next(now)
    }

    /// Queue a native window change for `target`.
    pub fn push_command(&self, target: ObjectId, command: WindowCommand) {
        self.state.lock().commands.push_back((target, command));
        self.wake();
    }

    pub fn take_commands(&self) -> Vec<(ObjectId, WindowCommand)> {
        self.state.lock().commands.drain(..).collect()
    }

    /// Ask the loop to stop with `code`. The first request wins.
    pub fn request_quit(&self, code: i32) {
        {
            let mut state = self.state.lock();
            if state.quit.is_none() {
                state.quit = Some(code);
            }
        }
        self.wake();
    }

    pub fn take_quit(&self) -> Option<i32> {
        self.state.lock().quit.take()
    }

    /// Whether anything is ready to be processed right now.
    pub fn has_pending(&self) -> bool {
        let state = self.state.lock();
        !state.events.is_empty()
            || !state.actions.is_empty()
            || !state.commands.is_empty()
            || state.quit.is_some()
    }

    /// Block for up to `timeout` or until something is posted.
    pub fn wait(&self, timeout: Duration) {
        if self.has_pending() {
            return;
        }
        let _ = self.wake_rx.recv_timeout(timeout);
    }

    fn wake(&self) {
        // A full channel already holds a pending wake-up.
        let _ = self.wake_tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use slotmap::SlotMap;

    use super::*;
    use crate::clock::ManualClock;
    use crate::event::CustomEvent;

    fn ids(n: usize) -> Vec<ObjectId> {
        let mut map: SlotMap<ObjectId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn queue() -> (EventQueue, ManualClock) {
        let clock = ManualClock::new();
        (EventQueue::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn events_are_fifo() {
        let (queue, _) = queue();
        let ids = ids(2);
        for id in &ids {
            queue.add_object(*id);
        }
        queue.post_event(ids[0], Event::Custom(CustomEvent::new(1, ())));
        queue.post_event(ids[1], Event::Custom(CustomEvent::new(2, ())));
        queue.post_event(ids[0], Event::Custom(CustomEvent::new(3, ())));

        let kinds: Vec<u32> = std::iter::from_fn(|| queue.pop_event())
            .map(|q| match q.event {
                Event::Custom(c) => c.kind,
                _ => 0,
            })
            .collect();
        assert_eq!(kinds, vec![1, 2, 3]);
    }

    #[test]
    fn post_to_unregistered_object_is_rejected() {
        let (queue, _) = queue();
        let id = ids(1)[0];
        assert!(!queue.post_event(id, Event::paint()));
        assert_eq!(queue.pending_events(), 0);
    }

    #[test]
    fn paint_requests_are_deduplicated() {
        let (queue, _) = queue();
        let id = ids(1)[0];
        queue.add_object(id);
        assert!(queue.post_paint(id));
        assert!(queue.post_paint(id));
        assert_eq!(queue.pending_events(), 1);

        queue.pop_event();
        assert!(queue.post_paint(id));
        assert_eq!(queue.pending_events(), 1);
    }

    #[test]
    fn remove_object_purges_everything() {
        let (queue, _) = queue();
        let ids = ids(2);
        queue.add_object(ids[0]);
        queue.add_object(ids[1]);
        queue.post_event(ids[0], Event::paint());
        queue.post_event(ids[1], Event::paint());
        queue.push_command(ids[0], WindowCommand::Show);
        queue.start_timer(ids[0], Duration::from_millis(10), TimerKind::Repeating);
        queue.post_action(DeferredAction::Call {
            target: ids[0],
            call: Box::new(|_| {}),
        });

        queue.remove_object(ids[0]);
        assert_eq!(queue.pending_events(), 1);
        assert_eq!(queue.pending_actions(), 0);
        assert_eq!(queue.active_timers(), 0);
        assert!(queue.take_commands().is_empty());
        assert_eq!(queue.pop_event().map(|q| q.target), Some(ids[1]));
    }

    #[test]
    fn timers_enqueue_events_on_the_queue_clock() {
        let (queue, clock) = queue();
        let id = ids(1)[0];
        queue.add_object(id);
        let timer = queue.start_timer(id, Duration::from_millis(800), TimerKind::Repeating);

        assert_eq!(queue.process_timers(), 0);
        clock.advance(Duration::from_millis(800));
        assert_eq!(queue.process_timers(), 1);
        let queued = queue.pop_event().unwrap();
        assert!(matches!(queued.event, Event::Timer(TimerEvent { id: t }) if t == timer));
        assert_eq!(queue.time_until_next_timer(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn take_events_snapshots_and_rearms_paint() {
        let (queue, _) = queue();
        let ids = ids(2);
        queue.add_object(ids[0]);
        queue.add_object(ids[1]);
        queue.post_paint(ids[0]);
        queue.post_event(ids[1], Event::Custom(CustomEvent::new(1, ())));
        queue.post_event(ids[0], Event::Custom(CustomEvent::new(2, ())));

        let batch = queue.take_events(2);
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch[0].event, Event::Paint(_)));
        assert_eq!(batch[1].target, ids[1]);
        assert_eq!(queue.pending_events(), 1);

        // The paint left the queue, so a fresh request is queued again.
        assert!(queue.post_paint(ids[0]));
        assert_eq!(queue.pending_events(), 2);
        assert_eq!(queue.take_events(usize::MAX).len(), 2);
    }

    #[test]
    fn take_events_skips_removed_targets() {
        let (queue, _) = queue();
        let ids = ids(2);
        queue.add_object(ids[0]);
        queue.add_object(ids[1]);
        queue.post_event(ids[0], Event::paint());
        queue.post_event(ids[1], Event::paint());
        queue.state.lock().objects.remove(&ids[0]);

        let batch = queue.take_events(usize::MAX);
        assert_eq!(batch.iter().map(|q| q.target).collect::<Vec<_>>(), vec![ids[1]]);
    }

    #[test]
    fn removing_a_subscriber_purges_its_slot_calls() {
        let (queue, _) = queue();
        let ids = ids(3);
        for id in &ids {
            queue.add_object(*id);
        }
        for subscriber in [Some(ids[1]), Some(ids[2]), None] {
            queue.post_action(DeferredAction::Slot {
                emitter: ids[0],
                subscriber,
                connection: ConnectionId::from_raw(1),
                args: Box::new(()),
            });
        }

        queue.remove_object(ids[1]);
        assert_eq!(queue.pending_actions(), 2);
        assert_eq!(queue.clear_object_actions(ids[2]), 1);
        assert_eq!(queue.take_actions(usize::MAX).len(), 1);
    }

    #[test]
    fn first_quit_request_wins() {
        let (queue, _) = queue();
        queue.request_quit(3);
        queue.request_quit(7);
        assert_eq!(queue.take_quit(), Some(3));
        assert_eq!(queue.take_quit(), None);
    }

    #[test]
    fn post_from_another_thread_wakes_waiter() {
        let (queue, _) = queue();
        let queue = Arc::new(queue);
        let id = ids(1)[0];
        queue.add_object(id);

        let poster = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            poster.post_event(id, Event::paint());
        });
        handle.join().unwrap();

        queue.wait(Duration::from_secs(5));
        assert_eq!(queue.pending_events(), 1);
    }
}

//! Timer system for Kestrel.
//!
//! The [`TimerManager`] lives inside the [`EventQueue`](crate::EventQueue).
//! Each timer belongs to an owner object; when it expires the queue enqueues
//! an [`Event::Timer`] addressed to that owner. The [`Timer`] object wraps
//! this in the usual signal form: it re-emits its own timer events as
//! [`Timer::TIMEOUT`] so other objects can connect slots to it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};
use crate::event::Event;
use crate::object::{Object, ObjectContext, ObjectGraph, ObjectId};
use crate::signal::Signal;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

#[derive(Debug)]
struct TimerData {
    owner: ObjectId,
    next_fire: Instant,
    interval: Duration,
    kind: TimerKind,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Tracks every timer registered with one event queue.
#[derive(Debug, Default)]
pub struct TimerManager {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer for `owner`. The first expiry is `interval` after `now`.
    pub fn start(
        &mut self,
        owner: ObjectId,
        interval: Duration,
        kind: TimerKind,
        now: Instant,
    ) -> TimerId {
        let next_fire = now + interval;
        let id = self.timers.insert(TimerData {
            owner,
            next_fire,
            interval,
            kind,
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: next_fire,
        });
        tracing::trace!(target: "kestrel_core::timer", ?id, ?owner, ?interval, ?kind, "timer started");
        id
    }

    /// Stop and remove a timer.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        match self.timers.remove(id) {
            Some(_) => {
                tracing::trace!(target: "kestrel_core::timer", ?id, "timer stopped");
                Ok(())
            }
            None => Err(TimerError::InvalidTimer.into()),
        }
    }

    /// Remove every timer owned by `owner`, returning how many were removed.
    pub fn stop_owned_by(&mut self, owner: ObjectId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| timer.owner != owner);
        before - self.timers.len()
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub fn owner(&self, id: TimerId) -> Option<ObjectId> {
        self.timers.get(id).map(|t| t.owner)
    }

    /// Get the duration until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(now))
    }

    /// Collect every expiry up to `now`.
    ///
    /// A repeating timer that fell behind yields one expiry per elapsed
    /// interval, and its schedule stays anchored to its start time.
    #[tracing::instrument(skip(self), target = "kestrel_core::timer", level = "trace")]
    pub fn process_expired(&mut self, now: Instant) -> Vec<(ObjectId, TimerId)> {
        let mut fired = Vec::new();
        let mut rescheduled = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get_mut(entry.id) else {
                continue;
            };
            if timer.next_fire != entry.fire_time {
                continue;
            }

            match timer.kind {
                TimerKind::OneShot => {
                    fired.push((timer.owner, entry.id));
                    self.timers.remove(entry.id);
                }
                TimerKind::Repeating if timer.interval.is_zero() => {
                    fired.push((timer.owner, entry.id));
                    timer.next_fire = now + Duration::from_nanos(1);
                    rescheduled.push(TimerQueueEntry {
                        id: entry.id,
                        fire_time: timer.next_fire,
                    });
                }
                TimerKind::Repeating => {
                    while timer.next_fire <= now {
                        fired.push((timer.owner, entry.id));
                        timer.next_fire += timer.interval;
                    }
                    rescheduled.push(TimerQueueEntry {
                        id: entry.id,
                        fire_time: timer.next_fire,
                    });
                }
            }
        }

        self.queue.extend(rescheduled);
        if !fired.is_empty() {
            tracing::trace!(target: "kestrel_core::timer", count = fired.len(), "timers fired");
        }
        fired
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            let live = self
                .timers
                .get(entry.id)
                .is_some_and(|t| t.next_fire == entry.fire_time);
            if live {
                break;
            }
            self.queue.pop();
        }
    }
}

/// A timer object that emits [`Timer::TIMEOUT`] on every expiry.
///
/// Create it as a child of the object that uses it so it is torn down with
/// its owner.
///
/// ```
/// use std::time::Duration;
/// use kestrel_core::{Application, HeadlessPlatform, Object, Slot, Timer};
///
/// struct Blinker {
///     ticks: u32,
/// }
/// impl Object for Blinker {}
///
/// let mut app = Application::new(HeadlessPlatform::new());
/// let blinker = app.create_root(Blinker { ticks: 0 });
/// let graph = app.graph_mut();
/// let timer = graph.create_child(blinker, Timer::new(Duration::from_millis(800))).unwrap();
/// graph.connect(timer, Timer::TIMEOUT, blinker, Slot::new("tick", |b: &mut Blinker, _ctx, _: &()| b.ticks += 1));
/// Timer::start(graph, timer).unwrap();
/// assert!(Timer::is_active(graph, timer));
/// ```
#[derive(Debug)]
pub struct Timer {
    interval: Duration,
    single_shot: bool,
    active: Option<TimerId>,
}

impl Timer {
    /// Emitted once per expiry.
    pub const TIMEOUT: Signal<()> = Signal::new("timeout");

    /// Create a stopped, repeating timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            single_shot: false,
            active: None,
        }
    }

    /// Create a stopped timer that fires only once per start.
    pub fn single_shot(interval: Duration) -> Self {
        Self {
            single_shot: true,
            ..Self::new(interval)
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval. Takes effect at the next start.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_single_shot(&self) -> bool {
        self.single_shot
    }

    /// Start (or restart) the timer object `id`.
    pub fn start(graph: &mut ObjectGraph, id: ObjectId) -> Result<()> {
        graph.with_object::<Timer, _>(id, |timer, ctx| timer.start_in(ctx))?
    }

    /// Stop the timer object `id`. Stopping a stopped timer is a no-op.
    pub fn stop(graph: &mut ObjectGraph, id: ObjectId) -> Result<()> {
        graph.with_object::<Timer, _>(id, |timer, ctx| timer.stop_in(ctx))
    }

    /// Whether the timer object `id` exists and is running.
    pub fn is_active(graph: &ObjectGraph, id: ObjectId) -> bool {
        graph
            .object::<Timer>(id)
            .is_some_and(|timer| timer.active.is_some())
    }

    fn start_in(&mut self, ctx: &mut ObjectContext<'_>) -> Result<()> {
        self.stop_in(ctx);
        let kind = if self.single_shot {
            TimerKind::OneShot
        } else {
            TimerKind::Repeating
        };
        self.active = Some(ctx.start_timer(self.interval, kind)?);
        Ok(())
    }

    fn stop_in(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(id) = self.active.take() {
            ctx.kill_timer(id);
        }
    }
}

impl Object for Timer {
    fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
        let Event::Timer(timer_event) = event else {
            return false;
        };
        if self.active != Some(timer_event.id) {
            return false;
        }
        if self.single_shot {
            self.active = None;
        }
        ctx.emit(Self::TIMEOUT, ());
        true
    }
}

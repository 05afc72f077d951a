//! The Application struct and event loop.
//!
//! An [`Application`] owns one [`ObjectGraph`], the [`EventQueue`] its
//! objects are attached to, and the [`Platform`] that provides native
//! windows. [`Application::exec`] runs the dispatch loop until the top-level
//! window accepts a close event or a quit is requested.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::ApplicationConfig;
use crate::event::Event;
use crate::object::{Object, ObjectGraph, ObjectId};
use crate::platform::Platform;
use crate::queue::{EventQueue, QueuedEvent};

/// The application entry point.
///
/// # Example
///
/// ```
/// use kestrel_core::{Application, Event, HeadlessPlatform, Object};
///
/// struct Window;
/// impl Object for Window {}
///
/// let platform = HeadlessPlatform::new();
/// let input = platform.handle();
/// let mut app = Application::new(platform);
/// let window = app.create_root(Window);
/// assert!(app.set_top_level_window(window));
///
/// input.inject(Event::close());
/// assert_eq!(app.exec(), 0);
/// ```
pub struct Application {
    config: ApplicationConfig,
    queue: Arc<EventQueue>,
    graph: ObjectGraph,
    platform: Box<dyn Platform>,
    top_level: Option<ObjectId>,
    exit_code: Option<i32>,
}

impl Application {
    /// Create an application with default configuration and the system clock.
    pub fn new(platform: impl Platform + 'static) -> Self {
        Self::with_options(platform, ApplicationConfig::default(), Arc::new(SystemClock))
    }

    /// Create an application with explicit configuration and time source.
    pub fn with_options(
        platform: impl Platform + 'static,
        config: ApplicationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        tracing::debug!(target: "kestrel_core::event_loop", ?config, "application created");
        Self {
            config,
            queue: Arc::new(EventQueue::new(clock)),
            graph: ObjectGraph::new(),
            platform: Box::new(platform),
            top_level: None,
            exit_code: None,
        }
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// The queue every object created through this application joins.
    ///
    /// Clone the `Arc` to post events from other threads.
    pub fn event_queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    /// Create a root object attached to this application's queue.
    pub fn create_root<T: Object>(&mut self, object: T) -> ObjectId {
        let id = self.graph.create(object);
        self.graph.set_event_queue(id, Some(Arc::clone(&self.queue)));
        id
    }

    /// Make `id` the top-level window and create its native window.
    ///
    /// Returns `false` if `id` is not a live object of this application or the
    /// platform could not create the window.
    pub fn set_top_level_window(&mut self, id: ObjectId) -> bool {
        if !self.graph.is_live(id) || !self.queue.contains_object(id) {
            tracing::warn!(target: "kestrel_core::event_loop", ?id, "top-level window must be a live object of this application");
            return false;
        }
        let request = self.config.window_request();
        match self.platform.create_window(id, &request) {
            Ok(()) => {
                if let Some(previous) = self.top_level.replace(id)
                    && previous != id
                {
                    self.platform.destroy_window(previous);
                }
                true
            }
            Err(error) => {
                tracing::error!(target: "kestrel_core::platform", ?id, %error, "cannot create top-level window");
                false
            }
        }
    }

    pub fn top_level_window(&self) -> Option<ObjectId> {
        self.top_level
    }

    /// Ask the loop to stop with `code` after the current iteration.
    pub fn quit(&self, code: i32) {
        tracing::info!(target: "kestrel_core::event_loop", code, "quit requested");
        self.queue.request_quit(code);
    }

    /// Run one dispatch iteration. Returns the number of events delivered.
    ///
    /// Only the events queued when delivery starts are delivered; anything
    /// posted by their handlers waits for the next iteration. Deferred calls
    /// run after the events, and calls queued by those calls wait too.
    #[tracing::instrument(skip(self), target = "kestrel_core::event_loop", level = "trace")]
    pub fn process_events(&mut self) -> usize {
        self.platform.pump_events(&self.queue);

        for (target, command) in self.queue.take_commands() {
            self.platform.apply(target, command);
        }

        let fired = self.queue.process_timers();
        if fired > 0 {
            tracing::trace!(target: "kestrel_core::event_loop", count = fired, "processing timer events");
        }

        let max = match self.config.max_events_per_iteration {
            0 => usize::MAX,
            max => max,
        };
        let mut delivered = 0;
        for queued in self.queue.take_events(max) {
            // The target may have been destroyed by an earlier event of this batch.
            if !self.queue.contains_object(queued.target) {
                continue;
            }
            if self.dispatch(queued) {
                delivered += 1;
            }
        }

        for action in self.queue.take_actions(usize::MAX) {
            self.graph.run_action(action);
        }

        if let Some(code) = self.queue.take_quit() {
            self.finish(code);
        }
        if let Some(top) = self.top_level
            && !self.graph.is_live(top)
        {
            tracing::debug!(target: "kestrel_core::event_loop", ?top, "top-level window destroyed");
            self.top_level = None;
            self.platform.destroy_window(top);
            self.finish(0);
        }
        delivered
    }

    fn finish(&mut self, code: i32) {
        if self.exit_code.is_none() {
            self.exit_code = Some(code);
        }
    }

    /// Deliver one queued event. Returns `false` if it was dropped.
    fn dispatch(&mut self, queued: QueuedEvent) -> bool {
        let QueuedEvent { target, mut event } = queued;
        if let Err(reason) = event.validate() {
            tracing::warn!(
                target: "kestrel_core::event_loop",
                ?target,
                kind = ?event.kind(),
                %reason,
                "malformed event dropped"
            );
            return false;
        }

        let paint_region = match &event {
            Event::Paint(paint) => Some(paint.region),
            _ => None,
        };
        match paint_region {
            Some(region) => {
                let painter = self.platform.begin_paint(target, region);
                self.graph.deliver(target, &mut event, painter);
                self.platform.end_paint(target);
            }
            None => {
                self.graph.deliver(target, &mut event, None);
            }
        }

        if let Event::Close(close) = &event
            && Some(target) == self.top_level
            && close.is_accepted()
        {
            tracing::debug!(target: "kestrel_core::event_loop", ?target, "top-level window closed");
            self.finish(0);
        }
        true
    }

    /// Run the event loop until the top-level window closes or a quit is
    /// requested, returning the exit code.
    ///
    /// Returns 1 immediately if no top-level window was established.
    #[tracing::instrument(skip(self), target = "kestrel_core::event_loop", level = "debug")]
    pub fn exec(&mut self) -> i32 {
        let Some(top) = self.top_level else {
            tracing::error!(target: "kestrel_core::event_loop", "no top-level window, not starting event loop");
            return 1;
        };
        tracing::info!(target: "kestrel_core::event_loop", ?top, "starting event loop");
        self.exit_code = None;

        let idle = self.config.idle_wait();
        loop {
            self.process_events();
            if let Some(code) = self.exit_code.take() {
                if let Some(top) = self.top_level.take() {
                    self.platform.destroy_window(top);
                }
                tracing::info!(target: "kestrel_core::event_loop", code, "event loop finished");
                return code;
            }
            let timeout = self
                .queue
                .time_until_next_timer()
                .map_or(idle, |next| next.min(idle));
            self.platform.wait_events(&self.queue, timeout);
        }
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if let Some(top) = self.top_level.take() {
            self.platform.destroy_window(top);
        }
        for root in self.graph.roots() {
            self.graph.destroy(root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CustomEvent, Event};
    use crate::object::ObjectContext;
    use crate::platform::HeadlessPlatform;

    #[derive(Default)]
    struct Counter {
        events: u32,
    }

    impl Object for Counter {
        fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
            if let Event::Custom(custom) = event {
                self.events += 1;
                if custom.kind == 1 {
                    // Posted during the drain: must wait for the next iteration.
                    let id = ctx.id();
                    ctx.post_event(id, Event::Custom(CustomEvent::new(2, ())));
                }
                return true;
            }
            false
        }
    }

    #[test]
    fn exec_without_window_returns_one() {
        let mut app = Application::new(HeadlessPlatform::new());
        assert_eq!(app.exec(), 1);
    }

    #[test]
    fn failed_window_creation_is_reported() {
        let mut app = Application::new(HeadlessPlatform::unavailable());
        let root = app.create_root(Counter::default());
        assert!(!app.set_top_level_window(root));
        assert_eq!(app.exec(), 1);
    }

    #[test]
    fn events_posted_during_drain_wait_for_next_iteration() {
        let mut app = Application::new(HeadlessPlatform::new());
        let root = app.create_root(Counter::default());
        app.graph()
            .post_event(root, Event::Custom(CustomEvent::new(1, ())));

        assert_eq!(app.process_events(), 1);
        assert_eq!(app.graph().object::<Counter>(root).unwrap().events, 1);
        assert_eq!(app.process_events(), 1);
        assert_eq!(app.graph().object::<Counter>(root).unwrap().events, 2);
    }

    #[test]
    fn quit_code_is_returned() {
        let mut app = Application::new(HeadlessPlatform::new());
        let root = app.create_root(Counter::default());
        assert!(app.set_top_level_window(root));
        app.quit(42);
        assert_eq!(app.exec(), 42);
    }

    #[test]
    fn event_budget_is_respected() {
        let config = ApplicationConfig {
            max_events_per_iteration: 2,
            ..Default::default()
        };
        let mut app = Application::with_options(HeadlessPlatform::new(), config, Arc::new(SystemClock));
        let root = app.create_root(Counter::default());
        for _ in 0..3 {
            app.graph()
                .post_event(root, Event::Custom(CustomEvent::new(5, ())));
        }
        assert_eq!(app.process_events(), 2);
        assert_eq!(app.process_events(), 1);
    }
}

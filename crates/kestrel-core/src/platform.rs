//! The seam between the event loop and a native windowing system.
//!
//! A [`Platform`] creates native windows for top-level objects, feeds native
//! input into the [`EventQueue`] as [`Event`]s, applies [`WindowCommand`]s
//! and supplies a [`Painter`] for each paint event.
//!
//! [`HeadlessPlatform`] is the built-in implementation. It keeps windows as
//! plain records, paints into a [`RecordingPainter`], and exposes a
//! [`HeadlessHandle`] through which tests and tools inject input and inspect
//! what was drawn.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kestrel_render::{Color, DrawCommand, Painter, Point, Rect, RecordingPainter, Size};
use parking_lot::Mutex;

use crate::error::PlatformError;
use crate::event::Event;
use crate::object::ObjectId;
use crate::queue::EventQueue;

/// A change to a native window, requested by the object that owns it.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    SetTitle(String),
    Resize(Size),
    Move(Point),
    Show,
    Hide,
    SetBackground(Color),
}

/// Parameters for creating a native window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRequest {
    pub title: String,
    pub size: Size,
    pub position: Option<Point>,
}

impl Default for WindowRequest {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: Size::new(250.0, 250.0),
            position: None,
        }
    }
}

/// Native windowing backend driven by the [`Application`](crate::Application).
pub trait Platform {
    /// Create the native window for top-level object `target`.
    fn create_window(&mut self, target: ObjectId, request: &WindowRequest) -> Result<(), PlatformError>;

    /// Tear down the native window for `target`, if any.
    fn destroy_window(&mut self, target: ObjectId);

    /// Translate pending native input into queued events.
    fn pump_events(&mut self, queue: &EventQueue);

    /// Apply a window change.
    fn apply(&mut self, target: ObjectId, command: WindowCommand);

    /// Prepare to paint `target`. Returning `None` delivers the paint event
    /// without a painter.
    fn begin_paint(&mut self, target: ObjectId, region: Option<Rect>) -> Option<&mut dyn Painter>;

    /// Finish the paint started by [`Platform::begin_paint`].
    fn end_paint(&mut self, target: ObjectId);

    /// Block until native input or queued work arrives, or `timeout` passes.
    fn wait_events(&mut self, queue: &EventQueue, timeout: Duration) {
        queue.wait(timeout);
    }
}

/// A window known to the headless platform.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    pub title: String,
    pub size: Size,
    pub position: Point,
    pub visible: bool,
    pub background: Color,
}

/// The draw commands issued during one paint event.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintFrame {
    pub target: ObjectId,
    pub region: Option<Rect>,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Default)]
struct HeadlessState {
    windows: HashMap<ObjectId, HeadlessWindow>,
    top_level: Option<ObjectId>,
    injected: Vec<(Option<ObjectId>, Event)>,
    applied: Vec<(ObjectId, WindowCommand)>,
    frames: Vec<PaintFrame>,
    fail_window_creation: bool,
}

/// A platform with no display.
#[derive(Debug)]
pub struct HeadlessPlatform {
    shared: Arc<Mutex<HeadlessState>>,
    painter: RecordingPainter,
    painting: Option<(ObjectId, Option<Rect>)>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(HeadlessState::default())),
            painter: RecordingPainter::new(),
            painting: None,
        }
    }

    /// A platform on which every window creation fails, as on a machine
    /// without a display.
    pub fn unavailable() -> Self {
        let platform = Self::new();
        platform.shared.lock().fail_window_creation = true;
        platform
    }

    /// A handle that stays usable after the platform moves into the
    /// application.
    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    fn create_window(&mut self, target: ObjectId, request: &WindowRequest) -> Result<(), PlatformError> {
        let mut state = self.shared.lock();
        if state.fail_window_creation {
            return Err(PlatformError::DisplayUnavailable("headless platform has no display".into()));
        }
        state.windows.insert(
            target,
            HeadlessWindow {
                title: request.title.clone(),
                size: request.size,
                position: request.position.unwrap_or(Point::ZERO),
                visible: false,
                background: Color::LIGHT_GRAY,
            },
        );
        state.top_level = Some(target);
        tracing::debug!(target: "kestrel_core::platform", ?target, title = %request.title, "window created");
        Ok(())
    }

    fn destroy_window(&mut self, target: ObjectId) {
        let mut state = self.shared.lock();
        state.windows.remove(&target);
        if state.top_level == Some(target) {
            state.top_level = None;
        }
    }

    fn pump_events(&mut self, queue: &EventQueue) {
        let (injected, top_level) = {
            let mut state = self.shared.lock();
            (std::mem::take(&mut state.injected), state.top_level)
        };
        for (target, event) in injected {
            let Some(target) = target.or(top_level) else {
                tracing::debug!(target: "kestrel_core::platform", "input without a window dropped");
                continue;
            };
            queue.post_event(target, event);
        }
    }

    fn apply(&mut self, target: ObjectId, command: WindowCommand) {
        let mut state = self.shared.lock();
        if let Some(window) = state.windows.get_mut(&target) {
            match &command {
                WindowCommand::SetTitle(title) => window.title = title.clone(),
                WindowCommand::Resize(size) => window.size = *size,
                WindowCommand::Move(position) => window.position = *position,
                WindowCommand::Show => window.visible = true,
                WindowCommand::Hide => window.visible = false,
                WindowCommand::SetBackground(color) => window.background = *color,
            }
        }
        state.applied.push((target, command));
    }

    fn begin_paint(&mut self, target: ObjectId, region: Option<Rect>) -> Option<&mut dyn Painter> {
        self.painter.clear();
        self.painting = Some((target, region));
        Some(&mut self.painter)
    }

    fn end_paint(&mut self, target: ObjectId) {
        let region = match self.painting.take() {
            Some((painting, region)) if painting == target => region,
            _ => None,
        };
        let commands = self.painter.take_commands();
        self.shared.lock().frames.push(PaintFrame {
            target,
            region,
            commands,
        });
    }
}

/// Test-side view of a [`HeadlessPlatform`].
#[derive(Debug, Clone)]
pub struct HeadlessHandle {
    shared: Arc<Mutex<HeadlessState>>,
}

impl HeadlessHandle {
    /// Inject input for the top-level window, picked up on the next
    /// iteration.
    pub fn inject(&self, event: Event) {
        self.shared.lock().injected.push((None, event));
    }

    /// Inject input for a specific object.
    pub fn inject_to(&self, target: ObjectId, event: Event) {
        self.shared.lock().injected.push((Some(target), event));
    }

    /// Make later window creation fail.
    pub fn set_fail_window_creation(&self, fail: bool) {
        self.shared.lock().fail_window_creation = fail;
    }

    pub fn window(&self, target: ObjectId) -> Option<HeadlessWindow> {
        self.shared.lock().windows.get(&target).cloned()
    }

    pub fn window_count(&self) -> usize {
        self.shared.lock().windows.len()
    }

    /// Every window command applied so far, in order.
    pub fn applied_commands(&self) -> Vec<(ObjectId, WindowCommand)> {
        self.shared.lock().applied.clone()
    }

    /// Every paint so far, in order.
    pub fn paint_frames(&self) -> Vec<PaintFrame> {
        self.shared.lock().frames.clone()
    }

    /// Paints of `target` so far, in order.
    pub fn frames_for(&self, target: ObjectId) -> Vec<PaintFrame> {
        self.shared
            .lock()
            .frames
            .iter()
            .filter(|frame| frame.target == target)
            .cloned()
            .collect()
    }

    pub fn clear_frames(&self) {
        self.shared.lock().frames.clear();
    }
}

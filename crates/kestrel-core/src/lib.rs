//! Core systems for Kestrel.
//!
//! This crate provides the foundational components of the Kestrel GUI toolkit:
//!
//! - **Object Model**: An arena of objects with parent-child ownership,
//!   naming, and cascading destruction
//! - **Signal/Slot System**: Typed connections between objects that are torn
//!   down from both ends when either side is destroyed
//! - **Events**: Paint, input, timer, resize, close and custom events
//! - **Event Queue**: A FIFO per event-loop thread, shared with producers on
//!   other threads
//! - **Timers**: One-shot and repeating timers driven by the queue's clock
//! - **Application**: The dispatch loop and its native [`Platform`]
//!
//! # Example
//!
//! ```
//! use kestrel_core::{Application, Event, HeadlessPlatform, Object, ObjectContext, Signal, Slot};
//!
//! struct Window {
//!     closes: u32,
//! }
//!
//! impl Window {
//!     const CLOSING: Signal<()> = Signal::new("closing");
//! }
//!
//! impl Object for Window {
//!     fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
//!         if let Event::Close(_) = event {
//!             self.closes += 1;
//!             ctx.emit(Self::CLOSING, ());
//!             return true;
//!         }
//!         false
//!     }
//! }
//!
//! struct Log {
//!     lines: Vec<&'static str>,
//! }
//! impl Object for Log {}
//!
//! let platform = HeadlessPlatform::new();
//! let input = platform.handle();
//! let mut app = Application::new(platform);
//!
//! let window = app.create_root(Window { closes: 0 });
//! let log = app.create_root(Log { lines: Vec::new() });
//! app.graph_mut().connect(
//!     window,
//!     Window::CLOSING,
//!     log,
//!     Slot::new("record", |log: &mut Log, _ctx, _: &()| log.lines.push("closing")),
//! );
//!
//! assert!(app.set_top_level_window(window));
//! input.inject(Event::close());
//! assert_eq!(app.exec(), 0);
//! assert_eq!(app.graph().object::<Log>(log).unwrap().lines, ["closing"]);
//! ```

mod application;
mod clock;
mod config;
mod error;
mod event;
pub mod logging;
mod object;
mod platform;
mod queue;
mod signal;
mod timer;

pub use application::Application;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApplicationConfig, WindowConfig};
pub use error::{ConfigError, CoreError, PlatformError, Result, TimerError};
pub use event::{
    CloseEvent, CustomEvent, Event, EventKind, FocusEvent, HoverEvent, Key, KeyEvent,
    KeyboardModifiers, MalformedEvent, MouseButton, MouseButtonAction, MouseButtonEvent,
    MouseMoveEvent, PaintEvent, ResizeEvent, TimerEvent,
};
pub use logging::{ObjectTreeDebug, TreeFormatOptions, TreeStyle};
pub use object::{DESTROYED, Object, ObjectContext, ObjectGraph, ObjectId};
pub use platform::{
    HeadlessHandle, HeadlessPlatform, HeadlessWindow, PaintFrame, Platform, WindowCommand,
    WindowRequest,
};
pub use queue::{DeferredAction, EventQueue, QueuedEvent};
pub use signal::{ConnectionId, Signal, Slot};
pub use timer::{Timer, TimerId, TimerKind, TimerManager};

// Re-export the drawing types widgets need
pub use kestrel_render::{Color, Image, Painter, Point, Rect, Size};

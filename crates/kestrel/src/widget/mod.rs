//! Widget system for Kestrel.
//!
//! A widget is an [`Object`](kestrel_core::Object) with geometry and a set
//! of event hooks:
//!
//! - [`Widget`] trait: the hooks (paint, mouse, key, hover, focus, resize,
//!   close, timer, custom)
//! - [`WidgetBase`]: geometry, title, visibility, enabled, hover and focus
//!   state, background color
//! - [`route_event`]: maps a core event onto the hooks
//!
//! # Overview
//!
//! Widgets do not paint when their state changes. They call
//! [`WidgetBase::update`] (or `ctx.update()`), which queues a paint event;
//! any number of requests before the next loop iteration produce one paint.
//! The hooks run inside the dispatch loop, and a signal emitted from a hook
//! reaches its slots before the hook returns.
//!
//! # Creating a Widget
//!
//! 1. Define a struct with a `WidgetBase` field
//! 2. Implement [`Object`](kestrel_core::Object) by forwarding to [`route_event`]
//! 3. Implement [`Widget`] and override the hooks you need

mod base;
mod traits;
pub mod widgets;

pub use base::{DEFAULT_SIZE, WidgetBase};
pub use traits::{Widget, route_event};
pub use widgets::{Button, ButtonImage, ButtonType, EditBuffer, LineEdit};

//! Prelude module for Kestrel.
//!
//! ```
//! use kestrel::prelude::*;
//! ```
//!
//! This provides access to:
//! - Application lifecycle (`Application`, `HeadlessPlatform`)
//! - Object graph and signals (`Object`, `ObjectContext`, `Signal`, `Slot`)
//! - Events (`Event` and its payloads)
//! - Widget foundation and widgets (`Widget`, `WidgetBase`, `Button`, `LineEdit`)
//! - Geometry and drawing types (`Point`, `Size`, `Rect`, `Color`, `Painter`)

// ============================================================================
// Core Application
// ============================================================================

pub use crate::{Application, ApplicationConfig, HeadlessPlatform};

// ============================================================================
// Object System and Signals
// ============================================================================

pub use crate::{DESTROYED, Object, ObjectContext, ObjectGraph, ObjectId, Signal, Slot, Timer};

// ============================================================================
// Events
// ============================================================================

pub use crate::{
    CloseEvent, CustomEvent, Event, FocusEvent, HoverEvent, Key, KeyEvent, KeyboardModifiers,
    MouseButton, MouseButtonEvent, MouseMoveEvent, PaintEvent, ResizeEvent, TimerEvent,
};

// ============================================================================
// Widgets
// ============================================================================

pub use crate::widget::{Button, ButtonImage, ButtonType, LineEdit, Widget, WidgetBase, route_event};

// ============================================================================
// Geometry and Drawing
// ============================================================================

pub use crate::render::{Color, Font, Image, Painter, Pen, Point, Rect, Size};

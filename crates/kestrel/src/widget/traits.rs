//! Core widget trait definitions.
//!
//! This module defines the [`Widget`] trait, a set of event hooks layered on
//! top of [`Object`], and [`route_event`], which maps a core [`Event`] onto
//! those hooks.
//!
//! A widget implements [`Object::event`] by forwarding to [`route_event`]:
//!
//! ```
//! use kestrel::widget::{Widget, WidgetBase, route_event};
//! use kestrel::{Event, Object, ObjectContext, PaintEvent, Painter, Color};
//!
//! struct Swatch {
//!     base: WidgetBase,
//! }
//!
//! impl Object for Swatch {
//!     fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
//!         route_event(self, ctx, event)
//!     }
//! }
//!
//! impl Widget for Swatch {
//!     fn widget_base(&self) -> &WidgetBase {
//!         &self.base
//!     }
//!
//!     fn widget_base_mut(&mut self) -> &mut WidgetBase {
//!         &mut self.base
//!     }
//!
//!     fn paint_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &PaintEvent, painter: &mut dyn Painter) {
//!         painter.fill_rect(self.base.rect(), Color::RED);
//!     }
//! }
//! ```

use kestrel_core::{
    CloseEvent, CustomEvent, Event, EventKind, FocusEvent, HoverEvent, KeyEvent, MouseButtonAction,
    MouseButtonEvent, MouseMoveEvent, Object, ObjectContext, PaintEvent, Rect, ResizeEvent, Size,
    TimerEvent,
};
use kestrel_render::{NullPainter, Painter};

use super::base::WidgetBase;

/// The hook interface of a UI element.
///
/// Every hook has an empty default, so a widget only overrides what it
/// needs. Hooks run inside the dispatch loop with the widget checked out of
/// the graph; signals emitted from a hook reach their slots before the hook
/// returns.
pub trait Widget: Object {
    /// Get a reference to the widget's base.
    fn widget_base(&self) -> &WidgetBase;

    /// Get a mutable reference to the widget's base.
    fn widget_base_mut(&mut self) -> &mut WidgetBase;

    // =========================================================================
    // Event Hooks
    // =========================================================================

    /// Draw the widget.
    ///
    /// `painter` draws into the native window. When the platform has no
    /// surface for this widget the calls are discarded.
    fn paint_event(
        &mut self,
        _ctx: &mut ObjectContext<'_>,
        _event: &PaintEvent,
        _painter: &mut dyn Painter,
    ) {
    }

    fn mouse_button_press_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &MouseButtonEvent) {}

    fn mouse_button_release_event(
        &mut self,
        _ctx: &mut ObjectContext<'_>,
        _event: &MouseButtonEvent,
    ) {
    }

    fn mouse_double_click_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &MouseButtonEvent) {}

    fn mouse_move_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &MouseMoveEvent) {}

    /// The pointer entered or left the widget.
    fn hover_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &HoverEvent) {}

    fn key_press_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &KeyEvent) {}

    fn key_release_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &KeyEvent) {}

    /// The widget gained or lost keyboard focus.
    fn focus_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &FocusEvent) {}

    /// The widget's size changed. The base already holds the new size.
    fn resize_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &ResizeEvent) {}

    /// The window is asked to close. Call [`CloseEvent::ignore`] to refuse.
    fn close_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &mut CloseEvent) {}

    fn timer_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &TimerEvent) {}

    /// Handle an application-defined event. Returns whether it was consumed.
    fn custom_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &mut CustomEvent) -> bool {
        false
    }

    // =========================================================================
    // Convenience Methods (delegating to WidgetBase)
    // =========================================================================

    fn geometry(&self) -> Rect {
        self.widget_base().geometry()
    }

    fn size(&self) -> Size {
        self.widget_base().size()
    }

    /// The local rectangle, with its origin at (0, 0).
    fn rect(&self) -> Rect {
        self.widget_base().rect()
    }

    fn is_visible(&self) -> bool {
        self.widget_base().is_visible()
    }

    fn is_enabled(&self) -> bool {
        self.widget_base().is_enabled()
    }

    fn is_hovered(&self) -> bool {
        self.widget_base().is_hovered()
    }

    fn has_focus(&self) -> bool {
        self.widget_base().has_focus()
    }
}

/// Route `event` to the matching [`Widget`] hook.
///
/// The base is updated before the hook runs: resize events set the size,
/// hover and focus events set the hover and focus flags. Input events
/// (mouse, key, hover, focus gain) are not delivered to disabled widgets.
///
/// Returns whether the event was handled.
pub fn route_event<W: Widget>(widget: &mut W, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
    let enabled = widget.widget_base().is_enabled();
    let kind = event.kind();
    match event {
        Event::Paint(paint) => {
            let mut discard = NullPainter;
            let painter: &mut dyn Painter = match ctx.take_painter() {
                Some(painter) => painter,
                None => &mut discard,
            };
            widget.paint_event(ctx, paint, painter);
            true
        }
        Event::MouseButton(mouse) => {
            if !enabled {
                return ignore_disabled(ctx, kind);
            }
            match mouse.action {
                MouseButtonAction::Press => widget.mouse_button_press_event(ctx, mouse),
                MouseButtonAction::Release => widget.mouse_button_release_event(ctx, mouse),
                MouseButtonAction::DoubleClick => widget.mouse_double_click_event(ctx, mouse),
            }
            true
        }
        Event::MouseMove(motion) => {
            if !enabled {
                return ignore_disabled(ctx, kind);
            }
            widget.mouse_move_event(ctx, motion);
            true
        }
        Event::Key(key) => {
            if !enabled {
                return ignore_disabled(ctx, kind);
            }
            if key.pressed {
                widget.key_press_event(ctx, key);
            } else {
                widget.key_release_event(ctx, key);
            }
            true
        }
        Event::Hover(hover) => {
            if !enabled && hover.entered {
                return ignore_disabled(ctx, kind);
            }
            widget.widget_base_mut().set_hovered(hover.entered);
            widget.hover_event(ctx, hover);
            true
        }
        Event::Focus(focus) => {
            if !enabled && focus.focused {
                return ignore_disabled(ctx, kind);
            }
            widget.widget_base_mut().set_focused(focus.focused);
            widget.focus_event(ctx, focus);
            true
        }
        Event::Resize(resize) => {
            widget.widget_base_mut().set_reported_size(resize.size);
            widget.resize_event(ctx, resize);
            true
        }
        Event::Close(close) => {
            widget.close_event(ctx, close);
            true
        }
        Event::Timer(timer) => {
            widget.timer_event(ctx, timer);
            true
        }
        Event::Custom(custom) => widget.custom_event(ctx, custom),
    }
}

fn ignore_disabled(ctx: &ObjectContext<'_>, kind: EventKind) -> bool {
    tracing::trace!(target: "kestrel::widget", id = ?ctx.id(), ?kind, "input ignored by disabled widget");
    false
}

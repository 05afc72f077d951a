//! Base widget implementation.
//!
//! This module provides [`WidgetBase`], the state every widget embeds: its
//! geometry, window title, visibility, enabled state, hover and focus state,
//! and background color.
//!
//! Setters that change something visible take the widget's
//! [`ObjectContext`]. They forward the change to the native window as a
//! [`WindowCommand`] and schedule a repaint through the event queue, so the
//! change is drawn on the next loop iteration rather than immediately.

use kestrel_core::{Color, Event, ObjectContext, Point, Rect, Size, WindowCommand};

/// Default edge length of a new widget, matching the native window default.
pub const DEFAULT_SIZE: Size = Size::new(250.0, 250.0);

/// Common state shared by all widgets.
///
/// `WidgetBase` holds:
/// - Geometry (position relative to the parent, and size)
/// - The native window title
/// - Visibility and enabled state
/// - Hover and focus state, kept current by [`route_event`](super::route_event)
/// - Background color
///
/// Widgets embed a `WidgetBase` and expose it through
/// [`Widget::widget_base`](super::Widget::widget_base).
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetBase {
    geometry: Rect,
    title: String,
    visible: bool,
    enabled: bool,
    hovered: bool,
    focused: bool,
    background: Color,
}

impl WidgetBase {
    /// Create a hidden, enabled widget base at the origin with the default size.
    pub fn new() -> Self {
        Self {
            geometry: Rect::from_size(DEFAULT_SIZE),
            title: String::new(),
            visible: false,
            enabled: true,
            hovered: false,
            focused: false,
            background: Color::WHITE,
        }
    }

    /// Set the initial size (builder pattern). Invalid sizes are ignored.
    pub fn with_size(mut self, size: Size) -> Self {
        if size.is_valid() {
            self.geometry.size = size;
        }
        self
    }

    /// Set the initial background color (builder pattern).
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Position and size relative to the parent.
    #[inline]
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    #[inline]
    pub fn pos(&self) -> Point {
        self.geometry.origin
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.geometry.size
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.geometry.size.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.geometry.size.height
    }

    /// The widget's local rectangle, with its origin at (0, 0).
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// Whether `point`, in widget-local coordinates, lies inside the widget.
    pub fn contains_point(&self, point: Point) -> bool {
        self.rect().contains(point)
    }

    /// Move the widget and its native window.
    pub fn move_to(&mut self, ctx: &ObjectContext<'_>, pos: Point) {
        if !pos.is_finite() || pos == self.pos() {
            return;
        }
        self.geometry.origin = pos;
        ctx.request_window(WindowCommand::Move(pos));
    }

    /// Resize the widget and its native window.
    ///
    /// A resize event is queued for the widget, followed by a repaint.
    pub fn resize(&mut self, ctx: &ObjectContext<'_>, size: Size) {
        if !size.is_valid() {
            tracing::debug!(target: "kestrel::widget", id = ?ctx.id(), ?size, "invalid size ignored");
            return;
        }
        if size == self.size() {
            return;
        }
        self.geometry.size = size;
        ctx.request_window(WindowCommand::Resize(size));
        ctx.post_event(ctx.id(), Event::resize(size));
        ctx.update();
    }

    /// Record a size reported by the platform, without echoing it back.
    pub(crate) fn set_reported_size(&mut self, size: Size) {
        if size.is_valid() {
            self.geometry.size = size;
        }
    }

    // =========================================================================
    // Title
    // =========================================================================

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the native window title.
    pub fn set_title(&mut self, ctx: &ObjectContext<'_>, title: impl Into<String>) {
        let title = title.into();
        if title == self.title {
            return;
        }
        self.title.clone_from(&title);
        ctx.request_window(WindowCommand::SetTitle(title));
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, ctx: &ObjectContext<'_>, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            ctx.request_window(WindowCommand::Show);
            ctx.update();
        } else {
            ctx.request_window(WindowCommand::Hide);
        }
    }

    /// Show the widget. Equivalent to `set_visible(ctx, true)`.
    pub fn show(&mut self, ctx: &ObjectContext<'_>) {
        self.set_visible(ctx, true);
    }

    /// Hide the widget. Equivalent to `set_visible(ctx, false)`.
    pub fn hide(&mut self, ctx: &ObjectContext<'_>) {
        self.set_visible(ctx, false);
    }

    // =========================================================================
    // Enabled State
    // =========================================================================

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the widget. Disabled widgets ignore input.
    pub fn set_enabled(&mut self, ctx: &ObjectContext<'_>, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.hovered = false;
        }
        ctx.update();
    }

    // =========================================================================
    // Hover and Focus
    // =========================================================================

    /// Whether the pointer is over the widget.
    #[inline]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    #[inline]
    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub(crate) fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    // =========================================================================
    // Background
    // =========================================================================

    #[inline]
    pub fn background(&self) -> Color {
        self.background
    }

    /// Set the background color of the native window.
    pub fn set_background(&mut self, ctx: &ObjectContext<'_>, color: Color) {
        if self.background == color {
            return;
        }
        self.background = color;
        ctx.request_window(WindowCommand::SetBackground(color));
        ctx.update();
    }

    /// Schedule a repaint.
    ///
    /// Repeated calls before the next loop iteration produce one paint event.
    pub fn update(&self, ctx: &ObjectContext<'_>) -> bool {
        ctx.update()
    }
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let base = WidgetBase::new();
        assert_eq!(base.size(), DEFAULT_SIZE);
        assert_eq!(base.pos(), Point::ZERO);
        assert!(base.is_enabled());
        assert!(!base.is_visible());
        assert!(!base.is_hovered());
        assert!(!base.has_focus());
        assert_eq!(base.title(), "");
    }

    #[test]
    fn test_builder_rejects_invalid_size() {
        let base = WidgetBase::new().with_size(Size::new(-1.0, 10.0));
        assert_eq!(base.size(), DEFAULT_SIZE);

        let base = WidgetBase::new().with_size(Size::new(80.0, 24.0));
        assert_eq!(base.rect(), Rect::new(0.0, 0.0, 80.0, 24.0));
    }

    #[test]
    fn test_contains_point_is_local() {
        let base = WidgetBase::new().with_size(Size::new(10.0, 10.0));
        assert!(base.contains_point(Point::new(5.0, 5.0)));
        assert!(!base.contains_point(Point::new(15.0, 5.0)));
    }
}

//! Image button widget.
//!
//! A [`Button`] draws one of four images depending on whether it is pressed
//! and whether the pointer is over it, and reports interaction through
//! [`Button::TOGGLED`] and [`Button::CLICKED`].
//!
//! # Button Types
//!
//! - [`ButtonType::Uncheckable`]: shows the pressed image while held and
//!   emits `CLICKED` when released over the button
//! - [`ButtonType::Checkable`]: each press flips the pressed state and emits
//!   `TOGGLED` with the new state
//! - [`ButtonType::Push`]: emits `TOGGLED(true)` on press and
//!   `TOGGLED(false)` on release
//!
//! # Example
//!
//! ```
//! use kestrel::widget::{Button, ButtonType};
//! use kestrel::{Application, Event, HeadlessPlatform, MouseButton, MouseButtonEvent, Object, Point, Slot};
//!
//! #[derive(Default)]
//! struct Lamp {
//!     on: bool,
//! }
//! impl Object for Lamp {}
//!
//! let mut app = Application::new(HeadlessPlatform::new());
//! let button = app.create_root(Button::new().with_type(ButtonType::Checkable));
//! let lamp = app.create_root(Lamp::default());
//! app.graph_mut().connect(
//!     button,
//!     Button::TOGGLED,
//!     lamp,
//!     Slot::new("switch", |lamp: &mut Lamp, _ctx, on: &bool| lamp.on = *on),
//! );
//!
//! let press = MouseButtonEvent::press(MouseButton::Left, Point::new(5.0, 5.0));
//! app.graph_mut().send_event(button, &mut Event::MouseButton(press));
//! assert!(app.graph().object::<Lamp>(lamp).unwrap().on);
//! ```

use kestrel_core::{
    Color, Event, HoverEvent, Image, MouseButton, MouseButtonEvent, Object, ObjectContext,
    PaintEvent, Point, Signal,
};
use kestrel_render::{Painter, Pen};

use crate::widget::{Widget, WidgetBase, route_event};

/// How a [`Button`] reacts to presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonType {
    #[default]
    Uncheckable,
    Checkable,
    Push,
}

/// The image slots of a [`Button`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonImage {
    Unpressed = 0,
    UnpressedHover = 1,
    Pressed = 2,
    PressedHover = 3,
}

/// A button drawn from up to four images.
pub struct Button {
    base: WidgetBase,
    button_type: ButtonType,
    pressed: bool,
    images: [Option<Image>; 4],
}

impl Button {
    /// Emitted with the new pressed state by checkable and push buttons.
    pub const TOGGLED: Signal<bool> = Signal::new("toggled");

    /// Emitted when an uncheckable button is released over itself.
    pub const CLICKED: Signal<()> = Signal::new("clicked");

    /// Create an unpressed, uncheckable button without images.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(),
            button_type: ButtonType::default(),
            pressed: false,
            images: Default::default(),
        }
    }

    /// Set the button type (builder pattern).
    pub fn with_type(mut self, button_type: ButtonType) -> Self {
        self.button_type = button_type;
        self
    }

    /// Set an image (builder pattern).
    pub fn with_image(mut self, image: Image, slot: ButtonImage) -> Self {
        self.set_image(image, slot);
        self
    }

    /// Set the widget base (builder pattern).
    pub fn with_base(mut self, base: WidgetBase) -> Self {
        self.base = base;
        self
    }

    pub fn button_type(&self) -> ButtonType {
        self.button_type
    }

    pub fn set_type(&mut self, button_type: ButtonType) {
        self.button_type = button_type;
    }

    pub fn set_image(&mut self, image: Image, slot: ButtonImage) {
        self.images[slot as usize] = Some(image);
    }

    pub fn image(&self, slot: ButtonImage) -> Option<&Image> {
        self.images[slot as usize].as_ref()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Change the pressed state without emitting signals.
    pub fn set_pressed(&mut self, ctx: &ObjectContext<'_>, pressed: bool) {
        if self.pressed != pressed {
            self.pressed = pressed;
            ctx.update();
        }
    }

    /// The image slot matching the current pressed and hover state.
    pub fn image_state(&self) -> ButtonImage {
        match (self.pressed, self.base.is_hovered()) {
            (false, false) => ButtonImage::Unpressed,
            (false, true) => ButtonImage::UnpressedHover,
            (true, false) => ButtonImage::Pressed,
            (true, true) => ButtonImage::PressedHover,
        }
    }

    /// The image that will be drawn.
    ///
    /// A missing hover image falls back to the plain image for the same
    /// pressed state. A pressed button without pressed images falls back to
    /// the unpressed image.
    pub fn current_image(&self) -> Option<&Image> {
        let fallback: &[ButtonImage] = if self.pressed {
            &[ButtonImage::Pressed, ButtonImage::Unpressed]
        } else {
            &[ButtonImage::Unpressed]
        };
        std::iter::once(self.image_state())
            .chain(fallback.iter().copied())
            .find_map(|slot| self.image(slot))
    }

    fn on_press(&mut self, ctx: &mut ObjectContext<'_>) {
        match self.button_type {
            ButtonType::Checkable => {
                self.pressed = !self.pressed;
                ctx.update();
                ctx.emit(Self::TOGGLED, self.pressed);
            }
            ButtonType::Push => {
                self.pressed = true;
                ctx.update();
                ctx.emit(Self::TOGGLED, true);
            }
            ButtonType::Uncheckable => {
                self.pressed = true;
                ctx.update();
            }
        }
    }

    fn on_release(&mut self, ctx: &mut ObjectContext<'_>, position: Point) {
        match self.button_type {
            ButtonType::Checkable => {}
            ButtonType::Push => {
                self.pressed = false;
                ctx.update();
                ctx.emit(Self::TOGGLED, false);
            }
            ButtonType::Uncheckable => {
                if !self.pressed {
                    return;
                }
                self.pressed = false;
                ctx.update();
                if self.base.contains_point(position) {
                    ctx.emit(Self::CLICKED, ());
                }
            }
        }
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new()
    }
}

impl Object for Button {
    fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
        route_event(self, ctx, event)
    }
}

impl Widget for Button {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn paint_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &PaintEvent, painter: &mut dyn Painter) {
        if let Some(image) = self.current_image() {
            painter.draw_image(image, Point::ZERO);
            return;
        }
        let fill = if self.pressed {
            Color::GRAY
        } else {
            Color::LIGHT_GRAY
        };
        let rect = self.base.rect();
        painter.fill_rect(rect, fill);
        if self.base.is_hovered() {
            painter.draw_rect(rect.inset(0.5), Pen::new(Color::BLACK, 1.0));
        }
    }

    fn mouse_button_press_event(&mut self, ctx: &mut ObjectContext<'_>, event: &MouseButtonEvent) {
        if event.button == MouseButton::Left {
            self.on_press(ctx);
        }
    }

    fn mouse_button_release_event(&mut self, ctx: &mut ObjectContext<'_>, event: &MouseButtonEvent) {
        if event.button == MouseButton::Left {
            self.on_release(ctx, event.position);
        }
    }

    fn hover_event(&mut self, ctx: &mut ObjectContext<'_>, _event: &HoverEvent) {
        ctx.update();
    }
}

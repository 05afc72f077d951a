//! The drawing contract used by widget paint handlers.
//!
//! A [`Painter`] is handed to a widget for the duration of one paint event.
//! Backends implement it on top of a native surface. [`RecordingPainter`]
//! keeps every call as a [`DrawCommand`] so paint output can be inspected in
//! tests, and [`NullPainter`] discards everything.

use crate::image::Image;
use crate::types::{Color, Point, Rect};

/// Outline style for shape and line drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    /// Line color.
    pub color: Color,
    /// Line width in pixels.
    pub width: f32,
}

impl Pen {
    /// Create a pen with the given color and width.
    pub const fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Self::new(Color::BLACK, 1.0)
    }
}

impl From<Color> for Pen {
    fn from(color: Color) -> Self {
        Self::new(color, 1.0)
    }
}

/// Font selection for text drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Family name, empty for the backend default.
    pub family: String,
    /// Pixel size.
    pub size: f32,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("", 12.0)
    }
}

/// Drawing primitives available to a paint handler.
///
/// All coordinates are widget-local.
pub trait Painter {
    /// Fill a rectangle with a solid color.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Stroke the outline of a rectangle.
    fn draw_rect(&mut self, rect: Rect, pen: Pen);

    /// Draw a straight line.
    fn draw_line(&mut self, from: Point, to: Point, pen: Pen);

    /// Stroke a circle.
    fn draw_circle(&mut self, center: Point, radius: f32, pen: Pen);

    /// Stroke an axis-aligned ellipse inscribed in `rect`.
    fn draw_ellipse(&mut self, rect: Rect, pen: Pen);

    /// Draw a single line of text with its top-left corner at `position`.
    fn draw_text(&mut self, text: &str, position: Point, font: &Font, color: Color);

    /// Draw an image with its top-left corner at `position`.
    fn draw_image(&mut self, image: &Image, position: Point);

    /// Width of `text` when drawn with `font`.
    ///
    /// The default assumes a fixed advance of 0.6 em per character, which is
    /// what headless backends use.
    fn text_width(&self, text: &str, font: &Font) -> f32 {
        text.chars().count() as f32 * font.size * 0.6
    }
}

/// A recorded painter call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color },
    Rect { rect: Rect, pen: Pen },
    Line { from: Point, to: Point, pen: Pen },
    Circle { center: Point, radius: f32, pen: Pen },
    Ellipse { rect: Rect, pen: Pen },
    Text { text: String, position: Point, font: Font, color: Color },
    Image { image: Image, position: Point },
}

/// A painter that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    commands: Vec<DrawCommand>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, in call order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the painter empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Painter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_rect(&mut self, rect: Rect, pen: Pen) {
        self.commands.push(DrawCommand::Rect { rect, pen });
    }

    fn draw_line(&mut self, from: Point, to: Point, pen: Pen) {
        self.commands.push(DrawCommand::Line { from, to, pen });
    }

    fn draw_circle(&mut self, center: Point, radius: f32, pen: Pen) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            pen,
        });
    }

    fn draw_ellipse(&mut self, rect: Rect, pen: Pen) {
        self.commands.push(DrawCommand::Ellipse { rect, pen });
    }

    fn draw_text(&mut self, text: &str, position: Point, font: &Font, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            position,
            font: font.clone(),
            color,
        });
    }

    fn draw_image(&mut self, image: &Image, position: Point) {
        self.commands.push(DrawCommand::Image {
            image: image.clone(),
            position,
        });
    }
}

/// A painter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPainter;

impl Painter for NullPainter {
    fn fill_rect(&mut self, _rect: Rect, _color: Color) {}
    fn draw_rect(&mut self, _rect: Rect, _pen: Pen) {}
    fn draw_line(&mut self, _from: Point, _to: Point, _pen: Pen) {}
    fn draw_circle(&mut self, _center: Point, _radius: f32, _pen: Pen) {}
    fn draw_ellipse(&mut self, _rect: Rect, _pen: Pen) {}
    fn draw_text(&mut self, _text: &str, _position: Point, _font: &Font, _color: Color) {}
    fn draw_image(&mut self, _image: &Image, _position: Point) {}
}

//! Drawing primitives for Kestrel.
//!
//! This crate holds the geometry and color types shared by the whole toolkit
//! and the [`Painter`] contract that widget paint handlers draw through.
//! Pixel-level backends live outside the toolkit; the in-process
//! [`RecordingPainter`] and [`NullPainter`] are enough for headless runs and
//! tests.
//!
//! ```
//! use kestrel_render::{Color, DrawCommand, Painter, Point, Rect, RecordingPainter};
//!
//! let mut painter = RecordingPainter::new();
//! painter.fill_rect(Rect::new(0.0, 0.0, 50.0, 20.0), Color::LIGHT_GRAY);
//! painter.draw_circle(Point::new(25.0, 10.0), 5.0, Color::BLACK.into());
//! assert!(matches!(painter.commands()[0], DrawCommand::FillRect { .. }));
//! ```

mod error;
mod image;
mod painter;
mod types;

pub use error::{RenderError, RenderResult};
pub use image::Image;
pub use painter::{DrawCommand, Font, NullPainter, Painter, Pen, RecordingPainter};
pub use types::{Color, Point, Rect, Size};

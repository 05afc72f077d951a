//! CPU-side RGBA images.
//!
//! An [`Image`] is an immutable, cheaply clonable RGBA8 pixel buffer. Widgets
//! hold images (for example the four button states) and hand them to a
//! [`Painter`](crate::Painter) during paint.

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};
use crate::types::{Color, Size};

/// An immutable RGBA8 image.
///
/// Cloning an image shares its pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Image {
    /// Create an image from tightly packed RGBA8 pixel data.
    pub fn from_rgba8(width: u32, height: u32, pixels: impl Into<Vec<u8>>) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let pixels = pixels.into();
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::InvalidImageData {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Create an image filled with a single color.
    pub fn filled(width: u32, height: u32, color: Color) -> RenderResult<Self> {
        let rgba = color.to_rgba8();
        let count = width as usize * height as usize;
        let pixels: Vec<u8> = std::iter::repeat_n(rgba, count).flatten().collect();
        Self::from_rgba8(width, height, pixels)
    }

    /// Get the width of the image in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height of the image in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the size of the image.
    #[inline]
    pub fn size(&self) -> Size {
        Size::from((self.width, self.height))
    }

    /// Raw RGBA8 pixel data, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Read a single pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let err = Image::from_rgba8(2, 2, vec![0u8; 15]).unwrap_err();
        assert_eq!(
            err,
            RenderError::InvalidImageData {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = Image::from_rgba8(0, 4, Vec::new()).unwrap_err();
        assert_eq!(err, RenderError::InvalidDimensions { width: 0, height: 4 });
    }

    #[test]
    fn filled_image_pixels() {
        let image = Image::filled(3, 2, Color::RED).unwrap();
        assert_eq!(image.size(), Size::new(3.0, 2.0));
        assert_eq!(image.pixel(2, 1), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(3, 0), None);
    }
}

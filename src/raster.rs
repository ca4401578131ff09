//! In-memory RGBA raster shared by the capture and diff stages.

use crate::{Error, Result};

/// An RGBA8 image: 4 bytes per pixel, rows top to bottom, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap an existing RGBA buffer, checking that its length matches the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = Self::buffer_len(width, height)?;
        if pixels.len() != expected {
            return Err(Error::CodecFailure(format!(
                "pixel buffer holds {} bytes, {}x{} RGBA needs {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// An image filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self { width, height, pixels }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// RGBA value at (x, y). Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        (y as usize * self.width as usize + x as usize) * 4
    }

    fn buffer_len(width: u32, height: u32) -> Result<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| Error::CodecFailure(format!("image too large: {}x{}", width, height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_short_buffers() {
        let err = RasterImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, Error::CodecFailure(_)));
        assert!(RasterImage::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn set_and_read_pixels() {
        let mut img = RasterImage::filled(3, 2, [1, 2, 3, 255]);
        assert_eq!(img.pixel_count(), 6);
        img.set_pixel(2, 1, [9, 8, 7, 6]);
        assert_eq!(img.pixel(2, 1), [9, 8, 7, 6]);
        assert_eq!(img.pixel(0, 0), [1, 2, 3, 255]);
        assert_eq!(&img.pixels[20..24], &[9, 8, 7, 6]);
    }
}

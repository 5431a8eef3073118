//! Captured frames and the inversion pipeline

use crate::{CaptureError, CaptureResult, Rect};
use image::{ImageBuffer, Rgb, RgbImage};

/// Raw capture of a screen region
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Top-down BGRX rows, 4 bytes per pixel
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Screen rectangle the pixels came from
    pub region: Rect,
}

impl FrameData {
    pub fn new(data: Vec<u8>, region: Rect) -> CaptureResult<Self> {
        let expected = region.width as usize * region.height as usize * 4;
        if data.len() != expected {
            return Err(CaptureError::Image(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                region.width,
                region.height,
                data.len()
            )));
        }

        Ok(Self {
            data,
            width: region.width,
            height: region.height,
            region,
        })
    }

    /// Reorder BGRX into an opaque RGB image, dropping the padding byte
    pub fn to_rgb_image(&self) -> CaptureResult<RgbImage> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }

        ImageBuffer::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| CaptureError::Image("RGB buffer size mismatch".into()))
    }

    /// Full color inversion of the frame
    pub fn inverted(&self) -> CaptureResult<RgbImage> {
        let mut img = self.to_rgb_image()?;
        for Rgb(channels) in img.pixels_mut() {
            for v in channels.iter_mut() {
                *v = invert_channel(*v);
            }
        }
        Ok(img)
    }
}

/// Inversion of a single channel value
#[inline]
pub fn invert_channel(v: u8) -> u8 {
    u8::MAX - v
}

/// Top-down 32-bit image GDI can blit directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DibImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DibImage {
    pub fn from_rgb(img: &RgbImage) -> Self {
        let mut data = Vec::with_capacity(img.width() as usize * img.height() as usize * 4);
        for Rgb([r, g, b]) in img.pixels() {
            data.extend_from_slice(&[*b, *g, *r, 0]);
        }

        Self {
            data,
            width: img.width(),
            height: img.height(),
        }
    }

    pub fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y * self.width + x) * 4) as usize;
        [self.data[idx + 2], self.data[idx + 1], self.data[idx]]
    }
}

//! GDI screen capture for the color inverter
//!
//! Grabs a rectangle of the live desktop and turns it into an inverted,
//! GDI-renderable image.

pub mod frame;
#[cfg(windows)]
pub mod grab;

pub use frame::{invert_channel, DibImage, FrameData};
#[cfg(windows)]
pub use grab::{grab_region, virtual_desktop_rect};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Windows API error: {0}")]
    Windows(String),

    #[error("Capture region is empty: {width}x{height}")]
    EmptyRegion { width: u32, height: u32 },

    #[error("Capture region {0:?} lies outside the virtual desktop")]
    OffScreen(Rect),

    #[error("GDI error: {0}")]
    Gdi(String),

    #[error("Image error: {0}")]
    Image(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

#[cfg(windows)]
impl From<windows::core::Error> for CaptureError {
    fn from(e: windows::core::Error) -> Self {
        CaptureError::Windows(e.to_string())
    }
}

/// Rectangle in physical pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x &&
        self.y < other.bottom() && self.bottom() > other.y
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Reject regions GDI cannot grab meaningfully.
///
/// Partially visible regions pass; the off-screen part comes back black.
pub fn check_region(region: &Rect, desktop: &Rect) -> CaptureResult<()> {
    if region.is_empty() {
        return Err(CaptureError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }
    if !region.intersects(desktop) {
        return Err(CaptureError::OffScreen(*region));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: Rect = Rect { x: 0, y: 0, width: 1920, height: 1080 };

    #[test]
    fn rect_edges() {
        let r = Rect::new(100, 100, 400, 300);
        assert_eq!(r.right(), 500);
        assert_eq!(r.bottom(), 400);
        assert!(r.intersects(&Rect::new(499, 399, 10, 10)));
        assert!(!r.intersects(&Rect::new(500, 100, 10, 10)));
    }

    #[test]
    fn empty_region_is_rejected() {
        let err = check_region(&Rect::new(10, 10, 0, 50), &DESKTOP).unwrap_err();
        assert!(matches!(err, CaptureError::EmptyRegion { width: 0, height: 50 }));
    }

    #[test]
    fn off_screen_region_is_rejected() {
        let region = Rect::new(-500, -500, 200, 150);
        let err = check_region(&region, &DESKTOP).unwrap_err();
        assert!(matches!(err, CaptureError::OffScreen(r) if r == region));
    }

    #[test]
    fn partially_visible_region_is_accepted() {
        assert!(check_region(&Rect::new(-50, 1000, 200, 150), &DESKTOP).is_ok());
    }
}

//! Recording surface for driving the controller without a window

use crate::controller::Surface;
use crate::geometry::CursorGlyph;
use crate::{OverlayError, OverlayResult};
use capture_gdi::{CaptureError, DibImage, FrameData, Rect};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Geometry(Rect),
    Opacity(f32),
    Flush,
    Capture(Rect),
    Present,
    /// The previously shown image was dropped
    Release,
}

/// In-memory surface that records what the controller asks of it
pub struct MockSurface {
    pub geometry: Rect,
    pub opacity: f32,
    pub cursor: CursorGlyph,
    pub focus_count: usize,
    pub captures: Vec<Rect>,
    /// Image currently attached to the surface
    pub current: Option<DibImage>,
    pub presented: usize,
    pub timer: Option<Duration>,
    pub quit: bool,
    pub calls: Vec<SurfaceCall>,
    /// RGB value every captured pixel has
    pub fill: [u8; 3],
    pub fail_capture: bool,
}

impl Default for MockSurface {
    fn default() -> Self {
        Self {
            geometry: Rect::default(),
            opacity: 1.0,
            cursor: CursorGlyph::default(),
            focus_count: 0,
            captures: vec![],
            current: None,
            presented: 0,
            timer: None,
            quit: false,
            calls: vec![],
            fill: [0, 0, 0],
            fail_capture: false,
        }
    }
}

impl Surface for MockSurface {
    fn set_geometry(&mut self, rect: Rect) -> OverlayResult<()> {
        self.calls.push(SurfaceCall::Geometry(rect));
        self.geometry = rect;
        Ok(())
    }

    fn position(&self) -> OverlayResult<(i32, i32)> {
        Ok((self.geometry.x, self.geometry.y))
    }

    fn set_opacity(&mut self, opacity: f32) -> OverlayResult<()> {
        self.calls.push(SurfaceCall::Opacity(opacity));
        self.opacity = opacity;
        Ok(())
    }

    fn flush(&mut self) {
        self.calls.push(SurfaceCall::Flush);
    }

    fn set_cursor(&mut self, glyph: CursorGlyph) {
        self.cursor = glyph;
    }

    fn focus(&mut self) {
        self.focus_count += 1;
    }

    fn capture(&mut self, region: Rect) -> OverlayResult<FrameData> {
        self.calls.push(SurfaceCall::Capture(region));
        if self.fail_capture {
            return Err(OverlayError::Capture(CaptureError::Gdi("display unavailable".into())));
        }
        self.captures.push(region);

        let [r, g, b] = self.fill;
        let pixels = region.width as usize * region.height as usize;
        let data = [b, g, r, 0].repeat(pixels);
        Ok(FrameData::new(data, region)?)
    }

    fn present(&mut self, image: DibImage) {
        let previous = self.current.replace(image);
        self.calls.push(SurfaceCall::Present);
        self.presented += 1;
        if previous.is_some() {
            self.calls.push(SurfaceCall::Release);
        }
    }

    fn schedule_refresh(&mut self, every: Duration) -> OverlayResult<()> {
        self.timer = Some(every);
        Ok(())
    }

    fn quit(&mut self) {
        self.quit = true;
    }
}

//! Overlay tunables

use crate::{OverlayError, OverlayResult};
use capture_gdi::Rect;
use std::time::Duration;

/// Overlay configuration
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Geometry at startup
    pub initial: Rect,
    /// Window opacity while visible, in (0, 1]
    pub opacity: f32,
    /// Hit-test zone along each edge
    pub border_margin: i32,
    pub min_width: i32,
    pub min_height: i32,
    /// Compact size used by the toggle key
    pub small_width: i32,
    pub small_height: i32,
    pub toggle_key: char,
    pub refresh_key: char,
    pub close_key: char,
    /// Periodic refresh; `None` keeps refresh user-triggered
    pub auto_refresh: Option<Duration>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            initial: Rect::new(100, 100, 400, 300),
            opacity: 0.9,
            border_margin: 20,
            min_width: 100,
            min_height: 100,
            small_width: 200,
            small_height: 150,
            toggle_key: 't',
            refresh_key: 'r',
            close_key: 'c',
            auto_refresh: None,
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> OverlayResult<()> {
        if self.min_width <= 0 || self.min_height <= 0 {
            return Err(OverlayError::Config(format!(
                "minimum size must be positive, got {}x{}",
                self.min_width, self.min_height
            )));
        }
        if self.small_width < self.min_width || self.small_height < self.min_height {
            return Err(OverlayError::Config(format!(
                "small size {}x{} is below the minimum",
                self.small_width, self.small_height
            )));
        }
        if (self.initial.width as i32) < self.min_width
            || (self.initial.height as i32) < self.min_height
        {
            return Err(OverlayError::Config(format!(
                "initial size {}x{} is below the minimum",
                self.initial.width, self.initial.height
            )));
        }
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(OverlayError::Config(format!(
                "opacity {} is outside (0, 1]",
                self.opacity
            )));
        }
        if self.auto_refresh.is_some_and(|d| d.is_zero()) {
            return Err(OverlayError::Config("auto refresh interval is zero".into()));
        }
        Ok(())
    }
}

/// Opacity as a layered-window alpha byte
pub fn opacity_to_alpha(opacity: f32) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

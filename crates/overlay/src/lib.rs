//! Overlay module for the color inverter
//!
//! A borderless, always-on-top window that shows the inverted pixels of the
//! screen region underneath it.

pub mod config;
pub mod controller;
pub mod geometry;
#[cfg(test)]
mod mock;
#[cfg(windows)]
pub mod render;
#[cfg(windows)]
pub mod window;

pub use config::OverlayConfig;
pub use controller::{Control, InverterController, Surface};
pub use geometry::{CursorGlyph, DragSession, Edges, WindowState};
#[cfg(windows)]
pub use window::InverterWindow;

use capture_gdi::CaptureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Windows API error: {0}")]
    Windows(String),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;

#[cfg(windows)]
impl From<windows::core::Error> for OverlayError {
    fn from(e: windows::core::Error) -> Self {
        OverlayError::Windows(e.to_string())
    }
}

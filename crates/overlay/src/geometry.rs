//! Window geometry, drag gestures and edge hit-testing

use crate::{OverlayError, OverlayResult};
use capture_gdi::Rect;

/// Geometry and size-toggle state of the overlay window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Size to restore when leaving the compact size
    pub prev_width: i32,
    pub prev_height: i32,
    pub is_small: bool,
    /// Whether the last gesture started on an edge
    pub is_resizing: bool,
}

impl WindowState {
    pub fn new(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width as i32,
            height: rect.height as i32,
            prev_width: rect.width as i32,
            prev_height: rect.height as i32,
            is_small: false,
            is_resizing: false,
        }
    }

    /// Current geometry as a screen rectangle
    pub fn rect(&self) -> OverlayResult<Rect> {
        if self.width <= 0 || self.height <= 0 {
            return Err(OverlayError::Geometry(format!(
                "window size {}x{} is not positive",
                self.width, self.height
            )));
        }
        Ok(Rect::new(self.x, self.y, self.width as u32, self.height as u32))
    }

    /// Edges within `margin` of a point in window-local coordinates
    pub fn edges_at(&self, local: (i32, i32), margin: i32) -> Edges {
        let (x, y) = local;
        Edges {
            left: x < margin,
            right: x > self.width - margin,
            top: y < margin,
            bottom: y > self.height - margin,
        }
    }

    /// Switch between the compact size and the remembered full size.
    ///
    /// The top-left corner never moves.
    pub fn toggle_size(&mut self, small_width: i32, small_height: i32) {
        if self.is_small {
            self.width = self.prev_width;
            self.height = self.prev_height;
            self.is_small = false;
        } else {
            self.prev_width = self.width;
            self.prev_height = self.height;
            self.width = small_width;
            self.height = small_height;
            self.is_small = true;
        }
    }

    /// Apply a drag gesture for the current pointer position (screen coordinates)
    pub fn apply_drag(&mut self, session: &DragSession, pointer: (i32, i32), min: (i32, i32)) {
        let dx = pointer.0 - session.start.0;
        let dy = pointer.1 - session.start.1;
        let init = session.initial;

        if !session.edges.any() {
            self.x = init.x + dx;
            self.y = init.y + dy;
            return;
        }

        let (min_width, min_height) = min;
        let (mut x, mut y) = (init.x, init.y);
        let (mut width, mut height) = (init.width as i32, init.height as i32);

        // Clamp first, then derive the origin so the far edge stays put
        if session.edges.left {
            width = (width - dx).max(min_width);
            x = init.right() - width;
        } else if session.edges.right {
            width = (width + dx).max(min_width);
        }

        if session.edges.top {
            height = (height - dy).max(min_height);
            y = init.bottom() - height;
        } else if session.edges.bottom {
            height = (height + dy).max(min_height);
        }

        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
    }
}

/// Window edges hit by a point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edges {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Edges {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }

    /// Cursor shape for this edge combination.
    ///
    /// The bottom corners reuse the opposite diagonal of the top corners:
    /// left+bottom shows NE/SW and right+bottom shows NW/SE.
    pub fn cursor(&self) -> CursorGlyph {
        match (self.left, self.right, self.top, self.bottom) {
            (true, _, true, _) => CursorGlyph::SizeNwSe,
            (_, true, true, _) => CursorGlyph::SizeNeSw,
            (true, _, _, true) => CursorGlyph::SizeNeSw,
            (_, true, _, true) => CursorGlyph::SizeNwSe,
            (true, _, _, _) | (_, true, _, _) => CursorGlyph::SizeWe,
            (_, _, true, _) | (_, _, _, true) => CursorGlyph::SizeNs,
            _ => CursorGlyph::Move,
        }
    }
}

/// Pointer shape shown over the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorGlyph {
    SizeNwSe,
    SizeNeSw,
    SizeWe,
    SizeNs,
    #[default]
    Move,
}

/// One press-drag-release gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Pointer at press, screen coordinates
    pub start: (i32, i32),
    /// Window geometry at press
    pub initial: Rect,
    /// Edges being resized; none means a move
    pub edges: Edges,
}

impl DragSession {
    pub fn begin(
        state: &WindowState,
        local: (i32, i32),
        screen: (i32, i32),
        margin: i32,
    ) -> OverlayResult<Self> {
        Ok(Self {
            start: screen,
            initial: state.rect()?,
            edges: state.edges_at(local, margin),
        })
    }

    pub fn is_resize(&self) -> bool {
        self.edges.any()
    }
}

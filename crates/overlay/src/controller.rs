//! Event handlers and the capture-invert-render cycle

use crate::config::OverlayConfig;
use crate::geometry::{CursorGlyph, DragSession, WindowState};
use crate::{OverlayError, OverlayResult};
use capture_gdi::{DibImage, FrameData, Rect};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Platform side of the overlay window
pub trait Surface {
    /// Move and resize the window and its drawable area
    fn set_geometry(&mut self, rect: Rect) -> OverlayResult<()>;

    /// Absolute screen position of the window's top-left corner
    fn position(&self) -> OverlayResult<(i32, i32)>;

    /// Window opacity in [0, 1]
    fn set_opacity(&mut self, opacity: f32) -> OverlayResult<()>;

    /// Push pending layout and paint work to the screen
    fn flush(&mut self);

    fn set_cursor(&mut self, glyph: CursorGlyph);

    fn focus(&mut self);

    /// Read live desktop pixels for `region`
    fn capture(&mut self, region: Rect) -> OverlayResult<FrameData>;

    /// Attach a new image, releasing the old one afterwards
    fn present(&mut self, image: DibImage);

    fn schedule_refresh(&mut self, every: Duration) -> OverlayResult<()>;

    /// End the event loop
    fn quit(&mut self);
}

/// On-window controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Close,
    Refresh,
}

/// Owns the window state and reacts to input
pub struct InverterController<S: Surface> {
    surface: S,
    config: OverlayConfig,
    state: WindowState,
    drag: Option<DragSession>,
}

impl<S: Surface> InverterController<S> {
    pub fn new(surface: S, config: OverlayConfig) -> OverlayResult<Self> {
        config.validate()?;
        let state = WindowState::new(config.initial);

        Ok(Self {
            surface,
            config,
            state,
            drag: None,
        })
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Apply the initial geometry and show the first inverted frame
    pub fn start(&mut self) -> OverlayResult<()> {
        let rect = self.state.rect()?;
        self.surface.set_geometry(rect)?;
        self.surface.set_opacity(self.config.opacity)?;
        if let Some(every) = self.config.auto_refresh {
            self.surface.schedule_refresh(every)?;
        }
        info!(?rect, "overlay started");
        self.refresh()
    }

    /// Pointer pressed: decide between move and resize
    pub fn on_press(&mut self, local: (i32, i32), screen: (i32, i32)) -> OverlayResult<()> {
        let (x, y) = self.surface.position()?;
        self.state.x = x;
        self.state.y = y;

        let session = DragSession::begin(&self.state, local, screen, self.config.border_margin)?;
        self.state.is_resizing = session.is_resize();
        debug!(edges = ?session.edges, resizing = self.state.is_resizing, "drag started");
        self.drag = Some(session);
        Ok(())
    }

    /// Pointer moved, with or without the button held
    pub fn on_motion(
        &mut self,
        local: (i32, i32),
        screen: (i32, i32),
        button_held: bool,
    ) -> OverlayResult<()> {
        match self.drag {
            Some(session) if button_held => {
                let min = (self.config.min_width, self.config.min_height);
                self.state.apply_drag(&session, screen, min);
                self.surface.set_geometry(self.state.rect()?)
            }
            _ => {
                let edges = self.state.edges_at(local, self.config.border_margin);
                self.surface.set_cursor(edges.cursor());
                Ok(())
            }
        }
    }

    /// Pointer released: end the gesture and take keyboard focus
    pub fn on_release(&mut self) {
        self.drag = None;
        self.surface.focus();
        debug!("focus set");
    }

    /// Key pressed on the window
    pub fn on_key(&mut self, key: char) -> OverlayResult<()> {
        let key = key.to_ascii_lowercase();
        if key == self.config.toggle_key {
            self.toggle_size()
        } else if key == self.config.refresh_key {
            self.refresh()
        } else if key == self.config.close_key {
            self.close();
            Ok(())
        } else {
            Ok(())
        }
    }

    pub fn on_command(&mut self, control: Control) -> OverlayResult<()> {
        let result = match control {
            Control::Close => {
                self.close();
                Ok(())
            }
            Control::Refresh => self.refresh(),
        };
        self.surface.focus();
        result
    }

    pub fn on_timer(&mut self) -> OverlayResult<()> {
        if self.drag.is_some() {
            return Ok(());
        }
        self.refresh()
    }

    /// Switch between compact and full size, then refresh for the new region
    pub fn toggle_size(&mut self) -> OverlayResult<()> {
        let (x, y) = self.surface.position()?;
        self.state.x = x;
        self.state.y = y;

        debug!(
            width = self.state.width,
            height = self.state.height,
            small = self.state.is_small,
            "toggling size"
        );
        self.state
            .toggle_size(self.config.small_width, self.config.small_height);

        self.surface.set_geometry(self.state.rect()?)?;
        self.surface.flush();
        self.refresh()?;
        debug!(width = self.state.width, height = self.state.height, "size toggled");
        Ok(())
    }

    /// Hide, capture the covered region, show again, invert and display
    pub fn refresh(&mut self) -> OverlayResult<()> {
        self.surface.set_opacity(0.0)?;
        self.surface.flush();

        let grabbed = self.grab_covered_region();

        let restored = self.surface.set_opacity(self.config.opacity);
        self.surface.flush();

        let frame = grabbed?;
        restored?;

        let inverted = frame.inverted()?;
        self.surface.present(DibImage::from_rgb(&inverted));
        Ok(())
    }

    fn grab_covered_region(&mut self) -> OverlayResult<FrameData> {
        let (x, y) = self.surface.position()?;
        self.state.x = x;
        self.state.y = y;
        let region = self.state.rect()?;

        let frame = self.surface.capture(region)?;
        if frame.region != region {
            warn!(?region, got = ?frame.region, "capture returned a different region");
            return Err(OverlayError::Geometry(format!(
                "captured {:?} instead of {:?}",
                frame.region, region
            )));
        }
        Ok(frame)
    }

    fn close(&mut self) {
        info!("closing overlay");
        self.surface.quit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockSurface, SurfaceCall};
    use capture_gdi::CaptureError;

    fn started() -> InverterController<MockSurface> {
        let mut controller =
            InverterController::new(MockSurface::default(), OverlayConfig::default()).unwrap();
        controller.start().unwrap();
        controller
    }

    #[test]
    fn start_applies_defaults_and_renders_once() {
        let c = started();
        let s = c.surface();
        assert_eq!(s.geometry, Rect::new(100, 100, 400, 300));
        assert_eq!(s.captures, vec![Rect::new(100, 100, 400, 300)]);
        assert_eq!(s.presented, 1);
        assert_eq!(s.opacity, 0.9);
        assert!(s.timer.is_none());
    }

    #[test]
    fn refresh_hides_before_capture_and_restores_after() {
        let mut c = started();
        c.surface.calls.clear();
        c.refresh().unwrap();

        let calls = &c.surface().calls;
        let hide = calls.iter().position(|k| *k == SurfaceCall::Opacity(0.0)).unwrap();
        let capture = calls.iter().position(|k| matches!(k, SurfaceCall::Capture(_))).unwrap();
        let show = calls.iter().position(|k| *k == SurfaceCall::Opacity(0.9)).unwrap();
        let present = calls.iter().position(|k| *k == SurfaceCall::Present).unwrap();
        assert!(hide < capture && capture < show && show < present);
        assert_eq!(calls[hide + 1], SurfaceCall::Flush);
        assert_eq!(calls[show + 1], SurfaceCall::Flush);
    }

    #[test]
    fn refresh_presents_inverted_pixels() {
        let mut c = started();
        c.surface.fill = [10, 128, 255];
        c.refresh().unwrap();

        let image = c.surface().current.as_ref().unwrap();
        assert_eq!((image.width, image.height), (400, 300));
        assert_eq!(image.pixel_rgb(0, 0), [245, 127, 0]);
        assert_eq!(image.pixel_rgb(399, 299), [245, 127, 0]);
    }

    #[test]
    fn previous_image_is_released_after_the_new_one_is_attached() {
        let mut c = started();
        assert!(!c.surface().calls.contains(&SurfaceCall::Release));

        c.surface.calls.clear();
        c.surface.fill = [255, 255, 255];
        c.refresh().unwrap();

        let calls = &c.surface().calls;
        let present = calls.iter().position(|k| *k == SurfaceCall::Present).unwrap();
        assert_eq!(calls.get(present + 1), Some(&SurfaceCall::Release));
        let current = c.surface().current.as_ref().unwrap();
        assert_eq!(current.pixel_rgb(0, 0), [0, 0, 0]);
    }

    #[test]
    fn capture_failure_propagates_and_restores_opacity() {
        let mut c = started();
        c.surface.fail_capture = true;

        let err = c.refresh().unwrap_err();
        assert!(matches!(err, OverlayError::Capture(CaptureError::Gdi(_))));
        assert_eq!(c.surface().opacity, 0.9);
        assert_eq!(c.surface().presented, 1);
    }

    #[test]
    fn move_gesture_translates_window() {
        let mut c = started();
        c.on_press((200, 150), (50, 50)).unwrap();
        assert!(!c.state().is_resizing);
        c.on_motion((220, 145), (70, 45), true).unwrap();
        assert_eq!(c.surface().geometry, Rect::new(120, 95, 400, 300));
    }

    #[test]
    fn resize_gesture_from_bottom_right_keeps_origin() {
        let mut c = started();
        c.on_press((395, 295), (495, 395)).unwrap();
        assert!(c.state().is_resizing);
        c.on_motion((0, 0), (-1000, -1000), true).unwrap();
        assert_eq!(c.surface().geometry, Rect::new(100, 100, 100, 100));
    }

    #[test]
    fn hover_updates_cursor_without_moving() {
        let mut c = started();
        c.on_motion((5, 5), (105, 105), false).unwrap();
        assert_eq!(c.surface().cursor, CursorGlyph::SizeNwSe);
        c.on_motion((200, 150), (300, 250), false).unwrap();
        assert_eq!(c.surface().cursor, CursorGlyph::Move);
        assert_eq!(c.surface().geometry, Rect::new(100, 100, 400, 300));
    }

    #[test]
    fn motion_after_release_is_hover_only() {
        let mut c = started();
        c.on_press((200, 150), (300, 250)).unwrap();
        c.on_release();
        c.on_motion((10, 150), (900, 900), true).unwrap();
        assert_eq!(c.surface().geometry, Rect::new(100, 100, 400, 300));
        assert_eq!(c.surface().cursor, CursorGlyph::SizeWe);
    }

    #[test]
    fn release_hands_focus_to_window() {
        let mut c = started();
        c.on_press((200, 150), (300, 250)).unwrap();
        c.on_release();
        assert_eq!(c.surface().focus_count, 1);
    }

    #[test]
    fn toggle_key_shrinks_and_restores() {
        let mut c = started();
        c.on_key('t').unwrap();
        assert_eq!(c.surface().geometry, Rect::new(100, 100, 200, 150));
        assert_eq!(c.surface().captures.last(), Some(&Rect::new(100, 100, 200, 150)));
        assert_eq!(c.surface().presented, 2);

        c.on_key('T').unwrap();
        assert_eq!(c.surface().geometry, Rect::new(100, 100, 400, 300));
        assert_eq!(c.surface().presented, 3);
        assert!(!c.state().is_small);
    }

    #[test]
    fn toggle_uses_the_platform_position() {
        let mut c = started();
        c.surface.geometry.x = 640;
        c.surface.geometry.y = 10;
        c.on_key('t').unwrap();
        assert_eq!(c.surface().geometry, Rect::new(640, 10, 200, 150));
    }

    #[test]
    fn refresh_key_and_control_capture_again() {
        let mut c = started();
        c.on_key('r').unwrap();
        c.on_command(Control::Refresh).unwrap();
        assert_eq!(c.surface().captures.len(), 3);
        assert_eq!(c.surface().focus_count, 1);
    }

    #[test]
    fn close_key_and_control_quit() {
        let mut c = started();
        c.on_key('c').unwrap();
        assert!(c.surface().quit);

        let mut c = started();
        c.on_command(Control::Close).unwrap();
        assert!(c.surface().quit);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut c = started();
        c.on_key('x').unwrap();
        assert_eq!(c.surface().captures.len(), 1);
        assert!(!c.surface().quit);
    }

    #[test]
    fn auto_refresh_schedules_timer_and_skips_during_drag() {
        let config = OverlayConfig {
            auto_refresh: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        let mut c = InverterController::new(MockSurface::default(), config).unwrap();
        c.start().unwrap();
        assert_eq!(c.surface().timer, Some(Duration::from_millis(500)));

        c.on_timer().unwrap();
        assert_eq!(c.surface().captures.len(), 2);

        c.on_press((200, 150), (300, 250)).unwrap();
        c.on_timer().unwrap();
        assert_eq!(c.surface().captures.len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = OverlayConfig {
            min_width: 0,
            ..Default::default()
        };
        assert!(InverterController::new(MockSurface::default(), config).is_err());
    }
}

//! Win32 overlay window

use crate::{
    config::opacity_to_alpha,
    controller::{Control, InverterController, Surface},
    geometry::CursorGlyph,
    render::CanvasRenderer,
    OverlayConfig, OverlayError, OverlayResult,
};
use capture_gdi::{grab_region, DibImage, FrameData, Rect};
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::time::Duration;
use tracing::{error, trace, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Dwm::DwmFlush;
use windows::Win32::Graphics::Gdi::{ClientToScreen, CreateSolidBrush, InvalidateRect, UpdateWindow};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::*;

const ID_BTN_REFRESH: u16 = 201;
const ID_BTN_CLOSE: u16 = 202;

const REFRESH_BTN_WIDTH: i32 = 70;
const CLOSE_BTN_WIDTH: i32 = 24;
const BTN_HEIGHT: i32 = 24;

const REFRESH_TIMER_ID: usize = 1;

const MK_LBUTTON: usize = 0x0001;
const BN_CLICKED: usize = 0;

static CLASS_REGISTERED: OnceCell<()> = OnceCell::new();

fn hinstance() -> OverlayResult<HINSTANCE> {
    let hmodule = unsafe { GetModuleHandleW(None)? };
    Ok(HINSTANCE(hmodule.0))
}

fn register_class() -> OverlayResult<()> {
    CLASS_REGISTERED
        .get_or_try_init(|| unsafe {
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wnd_proc),
                hInstance: hinstance()?,
                // No class cursor: the controller picks one per position
                hCursor: HCURSOR::default(),
                hbrBackground: CreateSolidBrush(COLORREF(0x00000000)),
                lpszClassName: InverterWindow::CLASS_NAME,
                ..Default::default()
            };

            if RegisterClassExW(&wc) == 0 {
                return Err(OverlayError::from(windows::core::Error::from_win32()));
            }
            Ok(())
        })
        .map(|_| ())
}

fn cursor_id(glyph: CursorGlyph) -> PCWSTR {
    match glyph {
        CursorGlyph::SizeNwSe => IDC_SIZENWSE,
        CursorGlyph::SizeNeSw => IDC_SIZENESW,
        CursorGlyph::SizeWe => IDC_SIZEWE,
        CursorGlyph::SizeNs => IDC_SIZENS,
        CursorGlyph::Move => IDC_SIZEALL,
    }
}

fn show_system_cursor(id: PCWSTR) {
    unsafe {
        match LoadCursorW(None, id) {
            Ok(cursor) => {
                SetCursor(cursor);
            }
            Err(e) => warn!("LoadCursorW failed: {e}"),
        }
    }
}

fn point_from_lparam(lparam: LPARAM) -> (i32, i32) {
    let x = (lparam.0 & 0xFFFF) as i16 as i32;
    let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
    (x, y)
}

fn local_to_screen(hwnd: HWND, local: (i32, i32)) -> (i32, i32) {
    let mut pt = POINT { x: local.0, y: local.1 };
    unsafe {
        let _ = ClientToScreen(hwnd, &mut pt);
    }
    (pt.x, pt.y)
}

/// Letter and digit virtual keys share their ASCII codes
fn key_from_vk(vk: usize) -> Option<char> {
    u8::try_from(vk)
        .ok()
        .filter(u8::is_ascii_alphanumeric)
        .map(|b| (b as char).to_ascii_lowercase())
}

/// Win32 side of the controller
pub struct Win32Surface {
    hwnd: HWND,
    refresh_btn: HWND,
    close_btn: HWND,
    image: Option<DibImage>,
    cursor: CursorGlyph,
}

impl Win32Surface {
    fn new(hwnd: HWND, refresh_btn: HWND, close_btn: HWND) -> Self {
        Self {
            hwnd,
            refresh_btn,
            close_btn,
            image: None,
            cursor: CursorGlyph::default(),
        }
    }

    pub fn image(&self) -> Option<&DibImage> {
        self.image.as_ref()
    }

    pub fn cursor(&self) -> CursorGlyph {
        self.cursor
    }

    fn is_control(&self, hwnd: HWND) -> bool {
        hwnd == self.refresh_btn || hwnd == self.close_btn
    }

    /// Refresh pinned top-left, close pinned top-right
    fn layout_controls(&self, width: i32) {
        unsafe {
            let flags = SWP_NOZORDER | SWP_NOACTIVATE;
            let _ = SetWindowPos(self.refresh_btn, None, 0, 0, REFRESH_BTN_WIDTH, BTN_HEIGHT, flags);
            let _ = SetWindowPos(
                self.close_btn,
                None,
                width - CLOSE_BTN_WIDTH,
                0,
                CLOSE_BTN_WIDTH,
                BTN_HEIGHT,
                flags,
            );
        }
    }
}

impl Surface for Win32Surface {
    fn set_geometry(&mut self, rect: Rect) -> OverlayResult<()> {
        unsafe {
            SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                rect.x,
                rect.y,
                rect.width as i32,
                rect.height as i32,
                SWP_NOACTIVATE,
            )?;
            self.layout_controls(rect.width as i32);
            let _ = InvalidateRect(self.hwnd, None, true);
        }
        Ok(())
    }

    fn position(&self) -> OverlayResult<(i32, i32)> {
        let mut rect = RECT::default();
        unsafe {
            GetWindowRect(self.hwnd, &mut rect)?;
        }
        Ok((rect.left, rect.top))
    }

    fn set_opacity(&mut self, opacity: f32) -> OverlayResult<()> {
        let alpha = opacity_to_alpha(opacity);
        unsafe {
            SetLayeredWindowAttributes(self.hwnd, COLORREF(0), alpha, LWA_ALPHA)?;
        }
        Ok(())
    }

    fn flush(&mut self) {
        unsafe {
            let _ = UpdateWindow(self.hwnd);
            // Wait for the compositor to present the new opacity
            if let Err(e) = DwmFlush() {
                trace!("DwmFlush failed: {e}");
            }
        }
    }

    fn set_cursor(&mut self, glyph: CursorGlyph) {
        self.cursor = glyph;
        show_system_cursor(cursor_id(glyph));
    }

    fn focus(&mut self) {
        unsafe {
            if let Err(e) = SetFocus(self.hwnd) {
                warn!("SetFocus failed: {e}");
            }
        }
    }

    fn capture(&mut self, region: Rect) -> OverlayResult<FrameData> {
        Ok(grab_region(region)?)
    }

    fn present(&mut self, image: DibImage) {
        let previous = self.image.replace(image);
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, false);
        }
        drop(previous);
    }

    fn schedule_refresh(&mut self, every: Duration) -> OverlayResult<()> {
        let millis = u32::try_from(every.as_millis()).unwrap_or(u32::MAX);
        let id = unsafe { SetTimer(self.hwnd, REFRESH_TIMER_ID, millis, None) };
        if id == 0 {
            return Err(windows::core::Error::from_win32().into());
        }
        Ok(())
    }

    fn quit(&mut self) {
        unsafe {
            let _ = PostMessageW(self.hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }
}

/// State reachable from the window procedure
struct WindowContext {
    controller: RefCell<InverterController<Win32Surface>>,
    failure: RefCell<Option<OverlayError>>,
}

impl WindowContext {
    /// Run a handler; a failure is recorded and closes the window
    fn dispatch<F>(&self, hwnd: HWND, handler: F)
    where
        F: FnOnce(&mut InverterController<Win32Surface>) -> OverlayResult<()>,
    {
        let result = match self.controller.try_borrow_mut() {
            Ok(mut controller) => handler(&mut controller),
            Err(_) => {
                trace!("controller busy, event dropped");
                return;
            }
        };

        if let Err(e) = result {
            error!("overlay handler failed: {e}");
            self.failure.borrow_mut().get_or_insert(e);
            unsafe {
                let _ = PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
            }
        }
    }
}

/// The color inverting overlay window
pub struct InverterWindow {
    hwnd: HWND,
    context: Box<WindowContext>,
}

impl InverterWindow {
    const CLASS_NAME: PCWSTR = w!("ColorInverterOverlay");

    /// Create the (still hidden) overlay window and its controls
    pub fn create(config: OverlayConfig) -> OverlayResult<Self> {
        config.validate()?;
        register_class()?;

        let hinstance = hinstance()?;
        let rect = config.initial;

        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_LAYERED | WS_EX_TOOLWINDOW,
                Self::CLASS_NAME,
                w!("Color Inverter"),
                WS_POPUP | WS_CLIPCHILDREN,
                rect.x,
                rect.y,
                rect.width as i32,
                rect.height as i32,
                None,
                None,
                hinstance,
                None,
            )?
        };

        let context = match Self::create_context(hwnd, hinstance, config) {
            Ok(context) => context,
            Err(e) => {
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
                return Err(e);
            }
        };

        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, &*context as *const WindowContext as isize);
        }

        Ok(Self { hwnd, context })
    }

    fn create_context(
        hwnd: HWND,
        hinstance: HINSTANCE,
        config: OverlayConfig,
    ) -> OverlayResult<Box<WindowContext>> {
        let refresh_btn = Self::create_button(hwnd, hinstance, w!("Refresh"), ID_BTN_REFRESH)?;
        let close_btn = Self::create_button(hwnd, hinstance, w!("X"), ID_BTN_CLOSE)?;

        let surface = Win32Surface::new(hwnd, refresh_btn, close_btn);
        surface.layout_controls(config.initial.width as i32);
        let controller = InverterController::new(surface, config)?;

        Ok(Box::new(WindowContext {
            controller: RefCell::new(controller),
            failure: RefCell::new(None),
        }))
    }

    fn create_button(
        parent: HWND,
        hinstance: HINSTANCE,
        label: PCWSTR,
        id: u16,
    ) -> OverlayResult<HWND> {
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                w!("BUTTON"),
                label,
                WS_CHILD | WS_VISIBLE | WINDOW_STYLE(BS_PUSHBUTTON as u32),
                0,
                0,
                0,
                0,
                parent,
                HMENU(id as _),
                hinstance,
                None,
            )?
        };
        Ok(hwnd)
    }

    /// Show the window, render the first frame and pump messages until close
    pub fn run(self) -> OverlayResult<()> {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
            let _ = SetForegroundWindow(self.hwnd);
        }

        let started = self.context.controller.borrow_mut().start();
        started?;

        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        match self.context.failure.borrow_mut().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for InverterWindow {
    fn drop(&mut self) {
        unsafe {
            if IsWindow(self.hwnd).as_bool() {
                SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WindowContext;
    if ptr.is_null() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }
    let context = &*ptr;

    match msg {
        WM_PAINT => match context.controller.try_borrow() {
            Ok(controller) => {
                CanvasRenderer::render(hwnd, controller.surface().image());
                LRESULT(0)
            }
            Err(_) => DefWindowProcW(hwnd, msg, wparam, lparam),
        },

        WM_LBUTTONDOWN => {
            let local = point_from_lparam(lparam);
            let screen = local_to_screen(hwnd, local);
            SetCapture(hwnd);
            context.dispatch(hwnd, |c| c.on_press(local, screen));
            LRESULT(0)
        }

        WM_MOUSEMOVE => {
            let local = point_from_lparam(lparam);
            let screen = local_to_screen(hwnd, local);
            let held = wparam.0 & MK_LBUTTON != 0;
            context.dispatch(hwnd, |c| c.on_motion(local, screen, held));
            LRESULT(0)
        }

        WM_LBUTTONUP => {
            let _ = ReleaseCapture();
            context.dispatch(hwnd, |c| {
                c.on_release();
                Ok(())
            });
            LRESULT(0)
        }

        WM_KEYDOWN => {
            if let Some(key) = key_from_vk(wparam.0) {
                context.dispatch(hwnd, |c| c.on_key(key));
            }
            LRESULT(0)
        }

        WM_COMMAND => {
            let id = (wparam.0 & 0xFFFF) as u16;
            let notification = (wparam.0 >> 16) & 0xFFFF;
            let control = match id {
                ID_BTN_REFRESH => Some(Control::Refresh),
                ID_BTN_CLOSE => Some(Control::Close),
                _ => None,
            };
            if let Some(control) = control.filter(|_| notification == BN_CLICKED) {
                context.dispatch(hwnd, |c| c.on_command(control));
            }
            LRESULT(0)
        }

        WM_TIMER if wparam.0 == REFRESH_TIMER_ID => {
            context.dispatch(hwnd, |c| c.on_timer());
            LRESULT(0)
        }

        WM_SETCURSOR => {
            let target = HWND(wparam.0 as *mut std::ffi::c_void);
            let hit = (lparam.0 & 0xFFFF) as u32;
            if let Ok(controller) = context.controller.try_borrow() {
                let surface = controller.surface();
                if surface.is_control(target) {
                    show_system_cursor(IDC_HAND);
                    return LRESULT(1);
                }
                if target == hwnd && hit == HTCLIENT as u32 {
                    show_system_cursor(cursor_id(surface.cursor()));
                    return LRESULT(1);
                }
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        WM_CLOSE => {
            let _ = KillTimer(hwnd, REFRESH_TIMER_ID);
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_NCDESTROY => {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

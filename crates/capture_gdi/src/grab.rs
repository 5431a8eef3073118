//! Region grab using GDI

use crate::{check_region, CaptureError, CaptureResult, FrameData, Rect};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

/// Get virtual desktop bounds
pub fn virtual_desktop_rect() -> Rect {
    unsafe {
        Rect::new(
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN).max(0) as u32,
            GetSystemMetrics(SM_CYVIRTUALSCREEN).max(0) as u32,
        )
    }
}

/// Capture exactly `region` of the live desktop as top-down BGRX
pub fn grab_region(region: Rect) -> CaptureResult<FrameData> {
    check_region(&region, &virtual_desktop_rect())?;

    let width = region.width as i32;
    let height = region.height as i32;

    unsafe {
        let screen_dc = GetDC(None);
        if screen_dc.is_invalid() {
            return Err(CaptureError::Gdi("Failed to get screen DC".into()));
        }

        let mem_dc = CreateCompatibleDC(screen_dc);
        if mem_dc.is_invalid() {
            ReleaseDC(None, screen_dc);
            return Err(CaptureError::Gdi("CreateCompatibleDC failed".into()));
        }

        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if bitmap.is_invalid() {
            let _ = DeleteDC(mem_dc);
            ReleaseDC(None, screen_dc);
            return Err(CaptureError::Gdi("CreateCompatibleBitmap failed".into()));
        }

        let old_bitmap = SelectObject(mem_dc, bitmap);

        let blit = BitBlt(
            mem_dc, 0, 0, width, height, screen_dc, region.x, region.y, SRCCOPY,
        );

        let mut bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                biHeight: -height, // Top-down DIB
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            bmiColors: [Default::default()],
        };

        let mut data = vec![0u8; region.width as usize * region.height as usize * 4];
        let rows = if blit.is_ok() {
            GetDIBits(
                mem_dc,
                bitmap,
                0,
                region.height,
                Some(data.as_mut_ptr() as *mut _),
                &mut bmi,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        SelectObject(mem_dc, old_bitmap);
        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(mem_dc);
        ReleaseDC(None, screen_dc);

        blit?;
        if rows == 0 {
            return Err(CaptureError::Gdi("GetDIBits returned no rows".into()));
        }

        tracing::trace!(?region, "grabbed region");
        FrameData::new(data, region)
    }
}

//! GDI painting of the inverted frame

use capture_gdi::DibImage;
use std::mem::size_of;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BeginPaint, EndPaint, SetDIBitsToDevice, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    DIB_RGB_COLORS, HDC, PAINTSTRUCT,
};

/// Paints the current frame into the window's client area
pub struct CanvasRenderer;

impl CanvasRenderer {
    /// Handle `WM_PAINT`; areas the image does not cover keep the class background
    pub fn render(hwnd: HWND, image: Option<&DibImage>) {
        unsafe {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            if let Some(image) = image {
                Self::draw_image(hdc, image);
            }

            let _ = EndPaint(hwnd, &ps);
        }
    }

    unsafe fn draw_image(hdc: HDC, image: &DibImage) {
        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: image.width as i32,
                biHeight: -(image.height as i32), // Top-down
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            bmiColors: [Default::default()],
        };

        SetDIBitsToDevice(
            hdc,
            0,
            0,
            image.width,
            image.height,
            0,
            0,
            0,
            image.height,
            image.data.as_ptr() as *const _,
            &bmi,
            DIB_RGB_COLORS,
        );
    }
}

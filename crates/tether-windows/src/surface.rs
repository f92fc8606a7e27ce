use tether_core::{OverlayError, OverlayResult, RenderSurface, WindowHandle, log_debug};
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Dwm::DwmFlush;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreateSolidBrush, DeleteDC, DeleteObject,
    FillRect, GetDC, HBITMAP, HDC, HGDIOBJ, ReleaseDC, SRCCOPY, SelectObject, SetBkMode,
    SetTextColor, TRANSPARENT, TextOutW,
};

use crate::desktop::hwnd;

/// A GDI back buffer presented to one window.
///
/// Frames are drawn into a memory DC and copied to the window in one
/// `BitBlt`, then paced to the compositor with `DwmFlush`. The alpha
/// channel of clear colours is ignored; overlay translucency is applied
/// to the whole window.
pub struct GdiSurface {
    hwnd: HWND,
    mem_dc: HDC,
    bitmap: HBITMAP,
    original: HGDIOBJ,
    width: i32,
    height: i32,
}

impl GdiSurface {
    /// Creates a back buffer matching the window's client size.
    pub fn new(window: WindowHandle, width: i32, height: i32) -> OverlayResult<Self> {
        let hwnd = hwnd(window);
        let (width, height) = (width.max(1), height.max(1));

        // SAFETY: every object created here is released on the failure
        // paths below or by Drop.
        unsafe {
            let window_dc = GetDC(Some(hwnd));
            if window_dc.is_invalid() {
                return Err(OverlayError::SurfaceCreationFailed(format!(
                    "no device context for {window}"
                )));
            }

            let mem_dc = CreateCompatibleDC(Some(window_dc));
            if mem_dc.is_invalid() {
                ReleaseDC(Some(hwnd), window_dc);
                return Err(OverlayError::SurfaceCreationFailed(
                    "CreateCompatibleDC failed".into(),
                ));
            }

            let bitmap = CreateCompatibleBitmap(window_dc, width, height);
            ReleaseDC(Some(hwnd), window_dc);
            if bitmap.is_invalid() {
                let _ = DeleteDC(mem_dc);
                return Err(OverlayError::SurfaceCreationFailed(format!(
                    "no {width}x{height} back buffer"
                )));
            }

            let original = SelectObject(mem_dc, bitmap.into());
            log_debug!("surface for {window} created at {width}x{height}");

            Ok(Self {
                hwnd,
                mem_dc,
                bitmap,
                original,
                width,
                height,
            })
        }
    }

    /// The memory DC frames are drawn into.
    pub fn dc(&self) -> HDC {
        self.mem_dc
    }

    /// Draws a line of text at `(x, y)` in the given RGB colour.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, rgb: [u8; 3]) {
        let wide: Vec<u16> = text.encode_utf16().collect();
        unsafe {
            SetBkMode(self.mem_dc, TRANSPARENT);
            SetTextColor(self.mem_dc, colorref(rgb));
            let _ = TextOutW(self.mem_dc, x, y, &wide);
        }
    }
}

fn colorref([r, g, b]: [u8; 3]) -> COLORREF {
    COLORREF(u32::from(r) | (u32::from(g) << 8) | (u32::from(b) << 16))
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl RenderSurface for GdiSurface {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: i32, height: i32) -> OverlayResult<()> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }

        // SAFETY: the new bitmap is selected before the old one is freed,
        // so the DC never holds a deleted object.
        unsafe {
            let window_dc = GetDC(Some(self.hwnd));
            let bitmap = CreateCompatibleBitmap(window_dc, width, height);
            ReleaseDC(Some(self.hwnd), window_dc);
            if bitmap.is_invalid() {
                return Err(OverlayError::SurfaceCreationFailed(format!(
                    "no {width}x{height} back buffer"
                )));
            }
            SelectObject(self.mem_dc, bitmap.into());
            let _ = DeleteObject(self.bitmap.into());
            self.bitmap = bitmap;
        }

        self.width = width;
        self.height = height;
        Ok(())
    }

    fn clear(&mut self, [r, g, b, _]: [f32; 4]) {
        let area = RECT {
            left: 0,
            top: 0,
            right: self.width,
            bottom: self.height,
        };
        unsafe {
            let brush = CreateSolidBrush(colorref([channel(r), channel(g), channel(b)]));
            FillRect(self.mem_dc, &area, brush);
            let _ = DeleteObject(brush.into());
        }
    }

    fn present(&mut self) -> OverlayResult<()> {
        unsafe {
            let window_dc = GetDC(Some(self.hwnd));
            let result = BitBlt(
                window_dc,
                0,
                0,
                self.width,
                self.height,
                Some(self.mem_dc),
                0,
                0,
                SRCCOPY,
            );
            ReleaseDC(Some(self.hwnd), window_dc);

            // Paces the loop to the compositor whether or not the copy
            // landed; fails harmlessly when composition is off.
            let _ = DwmFlush();

            result.map_err(|e| OverlayError::PresentFailed(format!("BitBlt: {e}")))
        }
    }
}

impl Drop for GdiSurface {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.mem_dc, self.original);
            let _ = DeleteObject(self.bitmap.into());
            let _ = DeleteDC(self.mem_dc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_channels_are_clamped() {
        assert_eq!(channel(-1.0), 0);
        assert_eq!(channel(0.5), 128);
        assert_eq!(channel(2.0), 255);
    }

    #[test]
    fn colorref_is_bgr_packed() {
        assert_eq!(colorref([0x11, 0x22, 0x33]), COLORREF(0x0033_2211));
    }
}

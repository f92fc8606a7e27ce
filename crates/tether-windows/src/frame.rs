use std::mem;

use tether_core::Rect;
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Dwm::{DWMWA_EXTENDED_FRAME_BOUNDS, DwmGetWindowAttribute};
use windows::Win32::UI::WindowsAndMessaging::{GetClientRect, GetWindowRect};

/// Returns the visible bounds of a window in screen coordinates.
///
/// On Windows 10/11 `GetWindowRect` includes the invisible drop-shadow
/// borders, so the DWM extended frame bounds are preferred. Falls back to
/// `GetWindowRect` when DWM has no answer (minimized, composition off).
pub fn visible_rect(hwnd: HWND) -> windows::core::Result<Rect> {
    let mut frame = RECT::default();
    let result = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_EXTENDED_FRAME_BOUNDS,
            &mut frame as *mut RECT as *mut _,
            mem::size_of::<RECT>() as u32,
        )
    };

    if result.is_err() {
        unsafe { GetWindowRect(hwnd, &mut frame)? };
    }

    Ok(Rect::from_edges(
        frame.left,
        frame.top,
        frame.right,
        frame.bottom,
    ))
}

/// Returns the size of a window's client area.
pub fn client_size(hwnd: HWND) -> windows::core::Result<(i32, i32)> {
    let mut client = RECT::default();
    unsafe { GetClientRect(hwnd, &mut client)? };
    Ok((client.right - client.left, client.bottom - client.top))
}

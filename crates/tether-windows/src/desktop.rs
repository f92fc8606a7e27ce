use tether_core::{Desktop, OverlayError, OverlayResult, Rect, TopLevelWindow, WindowHandle};

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowTextLengthW, GetWindowTextW, IsWindow, RealGetWindowClassW,
};

use crate::{enumerate, frame};

/// Converts a core handle back into an `HWND`.
pub(crate) fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as *mut _)
}

/// [`Desktop`] backed by the Win32 window manager.
///
/// Stateless: every query goes straight to the OS, so it can be shared
/// with the tracking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Desktop;

impl Win32Desktop {
    /// Returns a window's title text, or an empty string if it has none.
    pub fn title(&self, handle: WindowHandle) -> String {
        let hwnd = hwnd(handle);
        // SAFETY: GetWindowTextLengthW and GetWindowTextW only read window
        // text. A stale handle yields a length of zero.
        unsafe {
            let length = GetWindowTextLengthW(hwnd);
            if length <= 0 {
                return String::new();
            }

            // +1 for the null terminator that Windows requires
            let mut buffer = vec![0u16; (length + 1) as usize];
            let copied = GetWindowTextW(hwnd, &mut buffer);
            String::from_utf16_lossy(&buffer[..copied.max(0) as usize])
        }
    }

    /// Returns a window's class name.
    pub fn class_name(&self, handle: WindowHandle) -> String {
        // SAFETY: RealGetWindowClassW reads the class name.
        // 256 is the maximum class name length in Win32.
        unsafe {
            let mut buffer = [0u16; 256];
            let length = RealGetWindowClassW(hwnd(handle), &mut buffer);
            String::from_utf16_lossy(&buffer[..length as usize])
        }
    }
}

impl Desktop for Win32Desktop {
    fn top_level_windows(&self) -> OverlayResult<Vec<TopLevelWindow>> {
        enumerate::enumerate_windows()
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        // SAFETY: IsWindow accepts any value and only reports validity.
        unsafe { IsWindow(Some(hwnd(handle))).as_bool() }
    }

    fn window_rect(&self, handle: WindowHandle) -> OverlayResult<Rect> {
        frame::visible_rect(hwnd(handle)).map_err(|e| {
            tether_core::log_debug!("rect query for {handle} failed: {e}");
            OverlayError::TargetLost
        })
    }
}

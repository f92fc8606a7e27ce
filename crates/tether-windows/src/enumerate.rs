use tether_core::{OverlayError, OverlayResult, TopLevelWindow, WindowHandle};

use windows::Win32::Foundation::{HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowThreadProcessId, IsWindowVisible,
};
use windows::core::BOOL;

/// Enumerates every top-level window in z-order, top first.
///
/// Nothing is filtered here: hidden windows are reported with
/// `visible: false` so callers can decide what counts as a target.
pub fn enumerate_windows() -> OverlayResult<Vec<TopLevelWindow>> {
    let mut windows: Vec<TopLevelWindow> = Vec::new();

    // SAFETY: EnumWindows calls the callback synchronously for each
    // top-level window. The LPARAM is a pointer to `windows`, which
    // outlives the call.
    unsafe {
        EnumWindows(
            Some(enum_window_callback),
            LPARAM(&mut windows as *mut _ as isize),
        )
        .map_err(|e| OverlayError::EnumerationFailed(e.to_string()))?;
    }

    Ok(windows)
}

/// Callback invoked by `EnumWindows` for each top-level window.
///
/// Always returns `TRUE` so the enumeration covers every window.
unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the `Vec<TopLevelWindow>` pointer from enumerate_windows().
    let windows = unsafe { &mut *(lparam.0 as *mut Vec<TopLevelWindow>) };

    let mut process_id = 0u32;
    // SAFETY: read-only queries on a handle EnumWindows just gave us.
    let visible = unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut process_id));
        IsWindowVisible(hwnd).as_bool()
    };

    windows.push(TopLevelWindow {
        handle: WindowHandle(hwnd.0 as usize),
        process_id,
        visible,
    });

    BOOL(1)
}

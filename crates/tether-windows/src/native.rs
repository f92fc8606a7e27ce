//! Creation and control of the windows this process owns.
//!
//! Window procedures can't reach Rust state, so the procedure queues the
//! messages the host cares about in a thread-local map keyed by window
//! handle. The host drains the queue between frames on the same thread.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, OnceLock, PoisonError};

use tether_core::{
    NativeWindows, OverlayError, OverlayResult, Rect, WindowHandle, WindowSpec, WindowStyle,
    log_debug, log_warn,
};
use windows::Win32::Foundation::{
    COLORREF, ERROR_SUCCESS, GetLastError, HWND, LPARAM, LRESULT, SetLastError, WPARAM,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CW_USEDEFAULT, CreateWindowExW, DefWindowProcW, DestroyWindow, GWL_EXSTYLE, GetWindowLongPtrW,
    IDC_ARROW, LWA_ALPHA, LoadCursorW, PostMessageW, RegisterClassW, SW_SHOW, SW_SHOWNOACTIVATE,
    SWP_ASYNCWINDOWPOS, SWP_NOACTIVATE, SWP_NOZORDER, SetLayeredWindowAttributes,
    SetWindowLongPtrW, SetWindowPos, ShowWindow, WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE, WM_SIZE,
    WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_EX_TRANSPARENT, WS_OVERLAPPEDWINDOW, WS_POPUP,
};
use windows::core::PCWSTR;

use crate::desktop::hwnd;

/// A message queued by the window procedure for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    /// The client area changed size.
    Resized { width: i32, height: i32 },
    /// The user or the tracking thread asked the window to close.
    CloseRequested,
}

thread_local! {
    static PENDING: RefCell<HashMap<usize, Vec<WindowMessage>>> = RefCell::new(HashMap::new());
}

/// Takes the messages queued for `handle` on the calling thread.
pub fn take_messages(handle: WindowHandle) -> Vec<WindowMessage> {
    PENDING.with(|pending| {
        pending
            .borrow_mut()
            .get_mut(&handle.raw())
            .map(std::mem::take)
            .unwrap_or_default()
    })
}

fn queue(hwnd: HWND, message: WindowMessage) {
    PENDING.with(|pending| {
        pending
            .borrow_mut()
            .entry(hwnd.0 as usize)
            .or_default()
            .push(message);
    });
}

fn forget(handle: WindowHandle) {
    PENDING.with(|pending| {
        pending.borrow_mut().remove(&handle.raw());
    });
}

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_SIZE => {
            let width = (lparam.0 & 0xFFFF) as i32;
            let height = ((lparam.0 >> 16) & 0xFFFF) as i32;
            queue(hwnd, WindowMessage::Resized { width, height });
        }
        WM_CLOSE => {
            // The host decides whether closing ends the program.
            queue(hwnd, WindowMessage::CloseRequested);
            return LRESULT(0);
        }
        _ => {}
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

/// Window classes registered by this process. Classes are per process, and
/// registering the same name twice fails.
fn registered_classes() -> &'static Mutex<HashSet<String>> {
    static CLASSES: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    CLASSES.get_or_init(|| Mutex::new(HashSet::new()))
}

fn ensure_class_registered(class_name: &str) -> OverlayResult<()> {
    let mut classes = registered_classes()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if classes.contains(class_name) {
        return Ok(());
    }

    let wide = to_wide(class_name);
    // SAFETY: the class name and module handle are valid for the call;
    // RegisterClassW copies the name.
    let atom = unsafe {
        let instance = GetModuleHandleW(None)
            .map_err(|e| OverlayError::CreationFailed(format!("module handle: {e}")))?;
        let wc = WNDCLASSW {
            lpfnWndProc: Some(wnd_proc),
            hInstance: instance.into(),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: PCWSTR(wide.as_ptr()),
            ..Default::default()
        };
        RegisterClassW(&wc)
    };
    if atom == 0 {
        return Err(OverlayError::CreationFailed(format!(
            "could not register window class {class_name}"
        )));
    }

    log_debug!("registered window class {class_name}");
    classes.insert(class_name.to_string());
    Ok(())
}

/// Maps requested attributes to Win32 window styles.
fn window_styles(style: WindowStyle) -> (WINDOW_STYLE, WINDOW_EX_STYLE) {
    if !style.overlay {
        return (WS_OVERLAPPEDWINDOW, WINDOW_EX_STYLE::default());
    }

    let mut ex = WS_EX_LAYERED | WS_EX_TOOLWINDOW;
    if style.topmost {
        ex |= WS_EX_TOPMOST;
    }
    if style.no_activate {
        ex |= WS_EX_NOACTIVATE;
    }
    if style.click_through {
        ex |= WS_EX_TRANSPARENT;
    }
    (WS_POPUP, ex)
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Makes a freshly created window visible. Overlays never take activation.
pub fn show_window(handle: WindowHandle, overlay: bool) {
    let command = if overlay { SW_SHOWNOACTIVATE } else { SW_SHOW };
    unsafe {
        let _ = ShowWindow(hwnd(handle), command);
    }
}

/// [`NativeWindows`] backed by Win32.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Windows;

impl NativeWindows for Win32Windows {
    fn create_window(&self, spec: &WindowSpec<'_>) -> OverlayResult<WindowHandle> {
        ensure_class_registered(spec.class_name)?;

        let class = to_wide(spec.class_name);
        let title = to_wide(spec.title);
        let (style, ex_style) = window_styles(spec.style);
        let (x, y) = spec.position.unwrap_or((CW_USEDEFAULT, CW_USEDEFAULT));
        let (width, height) = spec.size;

        // SAFETY: class and title are null-terminated and outlive the call.
        let hwnd = unsafe {
            let instance = GetModuleHandleW(None)
                .map_err(|e| OverlayError::CreationFailed(format!("module handle: {e}")))?;
            CreateWindowExW(
                ex_style,
                PCWSTR(class.as_ptr()),
                PCWSTR(title.as_ptr()),
                style,
                x,
                y,
                width,
                height,
                None,
                None,
                Some(instance.into()),
                None,
            )
        }
        .map_err(|e| OverlayError::CreationFailed(e.to_string()))?;

        Ok(WindowHandle(hwnd.0 as usize))
    }

    fn set_translucency(&self, window: WindowHandle, level: u8) -> OverlayResult<()> {
        // SAFETY: the window was created with WS_EX_LAYERED.
        unsafe { SetLayeredWindowAttributes(hwnd(window), COLORREF(0), level, LWA_ALPHA) }
            .map_err(|e| OverlayError::CreationFailed(format!("translucency: {e}")))
    }

    fn set_click_through(&self, window: WindowHandle, enabled: bool) -> OverlayResult<()> {
        let hwnd = hwnd(window);
        let bit = WS_EX_TRANSPARENT.0 as isize;

        // Both calls return 0 on failure, but 0 is also a valid style, so
        // the thread's last error decides.
        // SAFETY: reads and writes the extended style of a window we own.
        unsafe {
            SetLastError(ERROR_SUCCESS);
            let current = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            if current == 0 {
                last_error(window, "read style")?;
            }
            let updated = if enabled { current | bit } else { current & !bit };
            if updated != current && SetWindowLongPtrW(hwnd, GWL_EXSTYLE, updated) == 0 {
                last_error(window, "write style")?;
            }
        }
        Ok(())
    }

    fn move_window(&self, window: WindowHandle, rect: Rect) -> OverlayResult<()> {
        // SWP_ASYNCWINDOWPOS posts the change to the owning thread instead
        // of waiting on it. The owner may be joining the caller.
        unsafe {
            SetWindowPos(
                hwnd(window),
                None,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                SWP_ASYNCWINDOWPOS | SWP_NOACTIVATE | SWP_NOZORDER,
            )
        }
        .map_err(|e| {
            log_debug!("move of {window} to {rect:?} failed: {e}");
            OverlayError::TargetLost
        })
    }

    fn request_close(&self, window: WindowHandle) {
        if let Err(e) = unsafe { PostMessageW(Some(hwnd(window)), WM_CLOSE, WPARAM(0), LPARAM(0)) }
        {
            log_warn!("could not post close to {window}: {e}");
        }
    }

    fn destroy_window(&self, window: WindowHandle) {
        // SAFETY: called on the owning thread, once per window.
        if let Err(e) = unsafe { DestroyWindow(hwnd(window)) } {
            log_debug!("destroy of {window} failed: {e}");
        }
        forget(window);
    }
}

/// Turns the calling thread's last error into a click-through failure.
fn last_error(window: WindowHandle, action: &str) -> OverlayResult<()> {
    // SAFETY: reads thread-local error state.
    let code = unsafe { GetLastError() };
    if code == ERROR_SUCCESS {
        return Ok(());
    }
    let error = windows::core::Error::from_hresult(code.to_hresult());
    Err(OverlayError::CreationFailed(format!(
        "click-through on {window}: {action}: {error}"
    )))
}

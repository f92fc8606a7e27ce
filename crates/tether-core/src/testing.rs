//! In-memory fakes for the platform traits, shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::controller::{NativeWindows, WindowSpec, WindowStyle};
use crate::{
    Desktop, OverlayError, OverlayResult, ProcessRecord, ProcessRecords, ProcessTable, Rect,
    TopLevelWindow, WindowHandle,
};

/// Polls `cond` every millisecond for up to two seconds.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// -- Desktop --

struct FakeWindow {
    raw: usize,
    process_id: u32,
    visible: bool,
    rect: Rect,
    rect_fails: bool,
}

/// A desktop of foreign windows that tests can move and close.
#[derive(Default)]
pub struct FakeDesktop {
    windows: Mutex<Vec<FakeWindow>>,
    enumeration_fails: Mutex<bool>,
}

impl FakeDesktop {
    pub fn add_window(&self, raw: usize, process_id: u32, visible: bool, rect: Rect) {
        self.windows.lock().expect("lock").push(FakeWindow {
            raw,
            process_id,
            visible,
            rect,
            rect_fails: false,
        });
    }

    pub fn move_window(&self, raw: usize, rect: Rect) {
        let mut windows = self.windows.lock().expect("lock");
        if let Some(window) = windows.iter_mut().find(|w| w.raw == raw) {
            window.rect = rect;
        }
    }

    pub fn close_window(&self, raw: usize) {
        self.windows.lock().expect("lock").retain(|w| w.raw != raw);
    }

    pub fn fail_rect(&self, raw: usize, fails: bool) {
        let mut windows = self.windows.lock().expect("lock");
        if let Some(window) = windows.iter_mut().find(|w| w.raw == raw) {
            window.rect_fails = fails;
        }
    }

    pub fn fail_enumeration(&self) {
        *self.enumeration_fails.lock().expect("lock") = true;
    }
}

impl Desktop for FakeDesktop {
    fn top_level_windows(&self) -> OverlayResult<Vec<TopLevelWindow>> {
        if *self.enumeration_fails.lock().expect("lock") {
            return Err(OverlayError::EnumerationFailed("fake".into()));
        }
        Ok(self
            .windows
            .lock()
            .expect("lock")
            .iter()
            .map(|w| TopLevelWindow {
                handle: WindowHandle(w.raw),
                process_id: w.process_id,
                visible: w.visible,
            })
            .collect())
    }

    fn is_window(&self, handle: WindowHandle) -> bool {
        self.windows
            .lock()
            .expect("lock")
            .iter()
            .any(|w| w.raw == handle.raw())
    }

    fn window_rect(&self, handle: WindowHandle) -> OverlayResult<Rect> {
        self.windows
            .lock()
            .expect("lock")
            .iter()
            .find(|w| w.raw == handle.raw() && !w.rect_fails)
            .map(|w| w.rect)
            .ok_or(OverlayError::TargetLost)
    }
}

// -- Process table --

/// A fixed process table, or one that always fails.
pub struct FakeProcesses {
    result: Result<Vec<ProcessRecord>, OverlayError>,
}

impl FakeProcesses {
    pub fn new(records: Vec<ProcessRecord>) -> Self {
        Self {
            result: Ok(records),
        }
    }

    pub fn failing(error: OverlayError) -> Self {
        Self { result: Err(error) }
    }
}

impl ProcessTable for FakeProcesses {
    fn snapshot(&self) -> OverlayResult<ProcessRecords> {
        let records = self.result.clone()?;
        Ok(Box::new(records.into_iter()))
    }
}

// -- Native windows --

/// A native call observed by [`FakeNativeWindows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeOp {
    Created(WindowHandle),
    Translucency(WindowHandle, u8),
    ClickThrough(WindowHandle, bool),
    Moved(WindowHandle, Rect),
    CloseRequested(WindowHandle),
    Destroyed(WindowHandle),
}

/// The creation parameters of a fake window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedSpec {
    pub style: WindowStyle,
    pub position: Option<(i32, i32)>,
    pub size: (i32, i32),
}

struct NativeWindow {
    spec: RecordedSpec,
    rect: Rect,
    click_through: bool,
    destroyed: bool,
}

#[derive(Default)]
struct NativeState {
    next: usize,
    windows: HashMap<usize, NativeWindow>,
    ops: Vec<NativeOp>,
    create_error: Option<String>,
    moves_fail: bool,
    click_through_fails: bool,
}

/// Records every native call and keeps per-window state.
#[derive(Default)]
pub struct FakeNativeWindows {
    state: Mutex<NativeState>,
}

impl FakeNativeWindows {
    pub fn fail_creation(&self, reason: &str) {
        self.state.lock().expect("lock").create_error = Some(reason.into());
    }

    pub fn fail_moves(&self, fail: bool) {
        self.state.lock().expect("lock").moves_fail = fail;
    }

    pub fn fail_click_through(&self, fail: bool) {
        self.state.lock().expect("lock").click_through_fails = fail;
    }

    pub fn ops(&self) -> Vec<NativeOp> {
        self.state.lock().expect("lock").ops.clone()
    }

    pub fn rect(&self, handle: WindowHandle) -> Option<Rect> {
        self.with_window(handle, |w| w.rect)
    }

    pub fn spec(&self, handle: WindowHandle) -> Option<RecordedSpec> {
        self.with_window(handle, |w| w.spec)
    }

    pub fn click_through(&self, handle: WindowHandle) -> Option<bool> {
        self.with_window(handle, |w| w.click_through)
    }

    pub fn is_destroyed(&self, handle: WindowHandle) -> bool {
        self.with_window(handle, |w| w.destroyed).unwrap_or(false)
    }

    pub fn close_requests(&self, handle: WindowHandle) -> usize {
        self.ops()
            .iter()
            .filter(|op| **op == NativeOp::CloseRequested(handle))
            .count()
    }

    fn with_window<T>(&self, handle: WindowHandle, f: impl FnOnce(&NativeWindow) -> T) -> Option<T> {
        self.state.lock().expect("lock").windows.get(&handle.raw()).map(f)
    }
}

impl NativeWindows for FakeNativeWindows {
    fn create_window(&self, spec: &WindowSpec<'_>) -> OverlayResult<WindowHandle> {
        let mut state = self.state.lock().expect("lock");
        if let Some(reason) = &state.create_error {
            return Err(OverlayError::CreationFailed(reason.clone()));
        }
        state.next += 1;
        let handle = WindowHandle(0x1000 + state.next);
        let (x, y) = spec.position.unwrap_or((0, 0));
        state.windows.insert(
            handle.raw(),
            NativeWindow {
                spec: RecordedSpec {
                    style: spec.style,
                    position: spec.position,
                    size: spec.size,
                },
                rect: Rect::new(x, y, spec.size.0, spec.size.1),
                click_through: spec.style.click_through,
                destroyed: false,
            },
        );
        state.ops.push(NativeOp::Created(handle));
        Ok(handle)
    }

    fn set_translucency(&self, window: WindowHandle, level: u8) -> OverlayResult<()> {
        self.state
            .lock()
            .expect("lock")
            .ops
            .push(NativeOp::Translucency(window, level));
        Ok(())
    }

    fn set_click_through(&self, window: WindowHandle, enabled: bool) -> OverlayResult<()> {
        let mut state = self.state.lock().expect("lock");
        if state.click_through_fails {
            return Err(OverlayError::CreationFailed("style rejected".into()));
        }
        if let Some(w) = state.windows.get_mut(&window.raw()) {
            w.click_through = enabled;
        }
        state.ops.push(NativeOp::ClickThrough(window, enabled));
        Ok(())
    }

    fn move_window(&self, window: WindowHandle, rect: Rect) -> OverlayResult<()> {
        let mut state = self.state.lock().expect("lock");
        if state.moves_fail {
            return Err(OverlayError::TargetLost);
        }
        if let Some(w) = state.windows.get_mut(&window.raw()) {
            w.rect = rect;
        }
        state.ops.push(NativeOp::Moved(window, rect));
        Ok(())
    }

    fn request_close(&self, window: WindowHandle) {
        self.state
            .lock()
            .expect("lock")
            .ops
            .push(NativeOp::CloseRequested(window));
    }

    fn destroy_window(&self, window: WindowHandle) {
        let mut state = self.state.lock().expect("lock");
        if let Some(w) = state.windows.get_mut(&window.raw()) {
            w.destroyed = true;
        }
        state.ops.push(NativeOp::Destroyed(window));
    }
}

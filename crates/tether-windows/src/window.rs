//! The application-facing window: a builder, a render loop and callbacks.

use std::sync::Arc;

use tether_core::{
    OverlayError, OverlayEvent, OverlayResult, OverlaySession, ProcessTable, RenderSurface,
    TargetReference, TrackingState, WindowConfigBuilder, WindowHandle, log_debug, log_error,
    log_info, log_warn,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, PostQuitMessage, TranslateMessage, WM_QUIT,
};

use crate::desktop::{Win32Desktop, hwnd};
use crate::dpi::enable_dpi_awareness;
use crate::native::{self, Win32Windows, WindowMessage};
use crate::process::NtProcessTable;
use crate::surface::GdiSurface;
use crate::frame;

/// A user callback run on the window's thread.
pub type Callback = Box<dyn FnMut(&mut Window)>;

/// Builds a [`Window`], optionally attached to another program's window.
///
/// ```no_run
/// use tether_windows::WindowBuilder;
///
/// let mut window = WindowBuilder::new()
///     .name("Overlay", "OverlayClass")
///     .attach_to_process_name("notepad.exe", false, true)
///     .build()?;
/// window.show();
/// # Ok::<(), tether_core::OverlayError>(())
/// ```
pub struct WindowBuilder {
    config: WindowConfigBuilder,
    processes: Box<dyn ProcessTable>,
    on_render: Option<Callback>,
    on_resize: Option<Callback>,
    on_close: Option<Callback>,
}

impl Default for WindowBuilder {
    fn default() -> Self {
        Self::with_config(WindowConfigBuilder::default())
    }
}

impl WindowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a pre-seeded configuration, e.g. from the config file.
    pub fn with_config(config: WindowConfigBuilder) -> Self {
        Self {
            config,
            processes: Box::new(NtProcessTable),
            on_render: None,
            on_resize: None,
            on_close: None,
        }
    }

    pub fn name(mut self, title: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.config = self.config.name(title, class_name);
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.config = self.config.size(width, height);
        self
    }

    pub fn clear_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.config = self.config.clear_color(r, g, b, a);
        self
    }

    pub fn attach_to_window(self, handle: WindowHandle, take_focus: bool, transparent: bool) -> Self {
        self.attach(TargetReference::ByHandle(handle), take_focus, transparent)
    }

    pub fn attach_to_process_id(self, pid: u32, take_focus: bool, transparent: bool) -> Self {
        self.attach(TargetReference::ByProcessId(pid), take_focus, transparent)
    }

    pub fn attach_to_process_name(
        self,
        name: impl Into<String>,
        take_focus: bool,
        transparent: bool,
    ) -> Self {
        self.attach(
            TargetReference::ByProcessName(name.into()),
            take_focus,
            transparent,
        )
    }

    pub fn attach(mut self, target: TargetReference, take_focus: bool, transparent: bool) -> Self {
        self.config = self.config.attach(target, take_focus, transparent);
        self
    }

    /// Replaces the process table used to resolve process names.
    pub fn process_table(mut self, processes: impl ProcessTable + 'static) -> Self {
        self.processes = Box::new(processes);
        self
    }

    /// Runs every frame after the back buffer is cleared.
    pub fn on_render(mut self, callback: impl FnMut(&mut Window) + 'static) -> Self {
        self.on_render = Some(Box::new(callback));
        self
    }

    /// Runs after the client area changes size.
    pub fn on_resize(mut self, callback: impl FnMut(&mut Window) + 'static) -> Self {
        self.on_resize = Some(Box::new(callback));
        self
    }

    /// Runs when the window is asked to close. Without one, closing ends
    /// the [`Window::show`] loop.
    pub fn on_close(mut self, callback: impl FnMut(&mut Window) + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    /// Creates the window and its render surface.
    ///
    /// A target that can't be found produces an ordinary window; see
    /// [`Window::diagnostic`]. Native window or surface failures are
    /// returned, and nothing is left on screen.
    pub fn build(self) -> OverlayResult<Window> {
        enable_dpi_awareness();
        let config = self.config.build()?;

        let session = OverlaySession::open(
            Arc::new(Win32Desktop),
            self.processes.as_ref(),
            Arc::new(Win32Windows),
            &config,
        )?;

        let handle = session.handle();
        let (width, height) = frame::client_size(hwnd(handle)).unwrap_or(config.size());
        // On failure `session` drops here: tracking is joined and the
        // hidden window destroyed.
        let surface = GdiSurface::new(handle, width, height).inspect_err(|e| {
            log_error!("surface for {handle} failed: {e}");
        })?;

        native::show_window(handle, session.is_overlay());
        log_info!(
            "window {handle} ready ({}x{}, overlay: {})",
            width,
            height,
            session.is_overlay()
        );

        Ok(Window {
            session,
            surface,
            clear_color: config.clear_color(),
            on_render: self.on_render,
            on_resize: self.on_resize,
            on_close: self.on_close,
        })
    }
}

/// A window with a render loop.
///
/// Owns the overlay session (and through it the native window and the
/// tracking thread) and the surface frames are drawn on.
pub struct Window {
    // Field order matters: the surface must go before the window it draws to.
    surface: GdiSurface,
    session: OverlaySession<Win32Windows>,
    clear_color: [f32; 4],
    on_render: Option<Callback>,
    on_resize: Option<Callback>,
    on_close: Option<Callback>,
}

impl Window {
    /// Runs the message and render loop until a quit is posted.
    ///
    /// Each iteration drains pending messages, applies tracking and
    /// window events, then renders one frame.
    pub fn show(&mut self) {
        let mut msg = MSG::default();

        'frames: loop {
            while unsafe { PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() } {
                if msg.message == WM_QUIT {
                    break 'frames;
                }
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            self.dispatch_events();
            self.render_frame();
        }

        log_debug!("window {} left its loop", self.handle());
        self.session.stop_tracking();
    }

    pub fn handle(&self) -> WindowHandle {
        self.session.handle()
    }

    pub fn is_overlay(&self) -> bool {
        self.session.is_overlay()
    }

    /// The tracked target, or `None` for an ordinary window.
    pub fn target_window(&self) -> Option<WindowHandle> {
        self.session.target_window()
    }

    /// Why an attachment fell back to an ordinary window.
    pub fn diagnostic(&self) -> Option<&OverlayError> {
        self.session.diagnostic()
    }

    pub fn take_focus(&self) -> bool {
        self.session.take_focus()
    }

    /// Switches the overlay between interactive and click-through.
    pub fn set_take_focus(&self, take_focus: bool) {
        if let Err(e) = self.session.set_take_focus(take_focus) {
            log_warn!("take focus {take_focus} on {}: {e}", self.handle());
        }
    }

    pub fn tracking_state(&self) -> Option<TrackingState> {
        self.session.tracking_state()
    }

    /// Client size in pixels.
    pub fn size(&self) -> (i32, i32) {
        self.surface.size()
    }

    /// The surface for the frame being rendered.
    pub fn surface(&mut self) -> &mut GdiSurface {
        &mut self.surface
    }

    fn dispatch_events(&mut self) {
        let events: Vec<OverlayEvent> = self.session.poll_events().collect();
        for event in events {
            match event {
                OverlayEvent::Resized(rect) => self.handle_resize(rect.width, rect.height),
                OverlayEvent::TargetLost => {
                    log_info!("target of {} is gone, closing", self.handle());
                }
            }
        }

        for message in native::take_messages(self.handle()) {
            match message {
                WindowMessage::Resized { width, height } => self.handle_resize(width, height),
                WindowMessage::CloseRequested => self.handle_close(),
            }
        }
    }

    /// Rebuilds the surface for a new size. Tracking and `WM_SIZE` both
    /// report overlay resizes, so sizes already applied are ignored.
    fn handle_resize(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 || (width, height) == self.surface.size() {
            return;
        }
        if let Err(e) = self.surface.resize(width, height) {
            log_error!("resize of {} to {width}x{height}: {e}", self.handle());
            return;
        }
        run_callback(self, |w| &mut w.on_resize);
    }

    fn handle_close(&mut self) {
        if !run_callback(self, |w| &mut w.on_close) {
            unsafe { PostQuitMessage(0) };
        }
    }

    fn render_frame(&mut self) {
        self.surface.clear(self.clear_color);
        run_callback(self, |w| &mut w.on_render);
        if let Err(e) = self.surface.present() {
            log_warn!("present on {}: {e}", self.handle());
        }
    }
}

/// Runs the callback in `slot`, if any. It is taken out while running so
/// it can borrow the window mutably, then put back.
fn run_callback(window: &mut Window, slot: fn(&mut Window) -> &mut Option<Callback>) -> bool {
    let Some(mut callback) = slot(window).take() else {
        return false;
    };
    callback(window);
    slot(window).get_or_insert(callback);
    true
}

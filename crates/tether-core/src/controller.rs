use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::WindowConfig;
use crate::{Desktop, OverlayResult, Rect, WindowHandle, log_debug, log_warn};

/// Native attributes requested when a window is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowStyle {
    /// Borderless, layered popup instead of a framed application window.
    pub overlay: bool,
    /// Stays above every non-topmost window.
    pub topmost: bool,
    /// Never becomes the foreground window implicitly.
    pub no_activate: bool,
    /// Pointer input passes to whatever lies beneath.
    pub click_through: bool,
}

impl WindowStyle {
    /// An ordinary framed application window.
    pub fn normal() -> Self {
        Self::default()
    }

    /// Overlay attributes: always topmost and non-activating, and
    /// click-through unless the overlay takes focus.
    pub fn overlay(take_focus: bool) -> Self {
        Self {
            overlay: true,
            topmost: true,
            no_activate: true,
            click_through: !take_focus,
        }
    }
}

/// Everything the platform needs to create a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec<'a> {
    pub title: &'a str,
    pub class_name: &'a str,
    pub style: WindowStyle,
    /// Top-left corner; `None` lets the platform choose.
    pub position: Option<(i32, i32)>,
    pub size: (i32, i32),
}

/// Operations on windows this process owns.
///
/// `move_window` and `request_close` are called from the tracking thread
/// and must not wait on the thread that owns the window; everything else
/// runs on the owning thread.
pub trait NativeWindows: Send + Sync {
    /// Creates a hidden window, failing with `CreationFailed`. The host
    /// shows it once its render surface exists.
    fn create_window(&self, spec: &WindowSpec<'_>) -> OverlayResult<WindowHandle>;

    /// Sets whole-window alpha (255 = opaque).
    fn set_translucency(&self, window: WindowHandle, level: u8) -> OverlayResult<()>;

    /// Turns the click-through attribute on or off.
    fn set_click_through(&self, window: WindowHandle, enabled: bool) -> OverlayResult<()>;

    /// Moves and resizes without activating or changing z-order.
    fn move_window(&self, window: WindowHandle, rect: Rect) -> OverlayResult<()>;

    /// Asks the window to run its own close sequence.
    fn request_close(&self, window: WindowHandle);

    /// Releases the native window.
    fn destroy_window(&self, window: WindowHandle);
}

/// Owns one native window and its overlay input mode.
///
/// The handle is bound at creation and released on drop. The tracking
/// thread only holds a `Weak` to the controller and is joined before the
/// controller is dropped.
pub struct OverlayController<N: NativeWindows> {
    native: Arc<N>,
    handle: WindowHandle,
    overlay: bool,
    take_focus: AtomicBool,
    initial_geometry: Option<Rect>,
}

impl<N: NativeWindows> OverlayController<N> {
    /// Creates an overlay covering `target`.
    ///
    /// Starts at the target's current rectangle; if that can't be read the
    /// configured default size is used at a platform-chosen position.
    pub fn create_overlay<D: Desktop + ?Sized>(
        native: Arc<N>,
        desktop: &D,
        config: &WindowConfig,
        target: WindowHandle,
        take_focus: bool,
    ) -> OverlayResult<Self> {
        let initial_geometry = match desktop.window_rect(target) {
            Ok(rect) if !rect.is_empty() => Some(rect),
            Ok(rect) => {
                log_warn!("target {target} has an empty rectangle {rect:?}, using default size");
                None
            }
            Err(e) => {
                log_warn!("target {target} rectangle unavailable ({e}), using default size");
                None
            }
        };

        let spec = WindowSpec {
            title: config.title(),
            class_name: config.class_name(),
            style: WindowStyle::overlay(take_focus),
            position: initial_geometry.map(|r| (r.x, r.y)),
            size: initial_geometry.map_or(config.size(), |r| (r.width, r.height)),
        };
        let handle = native.create_window(&spec)?;

        if let Err(e) = native.set_translucency(handle, config.translucency()) {
            native.destroy_window(handle);
            return Err(e);
        }
        log_debug!("overlay {handle} created over {target} at {initial_geometry:?}");

        Ok(Self {
            native,
            handle,
            overlay: true,
            take_focus: AtomicBool::new(take_focus),
            initial_geometry,
        })
    }

    /// Creates an ordinary window with the configured size.
    pub fn create_normal(native: Arc<N>, config: &WindowConfig) -> OverlayResult<Self> {
        let spec = WindowSpec {
            title: config.title(),
            class_name: config.class_name(),
            style: WindowStyle::normal(),
            position: None,
            size: config.size(),
        };
        let handle = native.create_window(&spec)?;

        Ok(Self {
            native,
            handle,
            overlay: false,
            take_focus: AtomicBool::new(true),
            initial_geometry: None,
        })
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn is_overlay(&self) -> bool {
        self.overlay
    }

    /// The target rectangle the overlay was created at, if it was known.
    pub fn initial_geometry(&self) -> Option<Rect> {
        self.initial_geometry
    }

    /// Whether the overlay captures input. Always `true` for normal windows.
    pub fn take_focus(&self) -> bool {
        self.take_focus.load(Ordering::Acquire)
    }

    /// Switches between interactive and click-through.
    ///
    /// Does nothing for normal windows. Repeating the current mode is
    /// harmless. Only touches the click-through attribute, so it can run
    /// while tracking moves the window.
    pub fn set_take_focus(&self, take_focus: bool) -> OverlayResult<()> {
        if !self.overlay {
            return Ok(());
        }
        self.native.set_click_through(self.handle, !take_focus)?;
        self.take_focus.store(take_focus, Ordering::Release);
        Ok(())
    }

    pub(crate) fn move_to(&self, rect: Rect) -> OverlayResult<()> {
        self.native.move_window(self.handle, rect)
    }

    pub(crate) fn request_close(&self) {
        self.native.request_close(self.handle);
    }
}

impl<N: NativeWindows> Drop for OverlayController<N> {
    fn drop(&mut self) {
        self.native.destroy_window(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OverlayError;
    use crate::testing::{FakeDesktop, FakeNativeWindows, NativeOp};

    fn overlay_config(take_focus: bool, transparent: bool) -> WindowConfig {
        WindowConfig::builder()
            .name("Overlay", "OverlayClass")
            .size(320, 240)
            .attach_to_handle(WindowHandle(0x20), take_focus, transparent)
            .build()
            .expect("valid config")
    }

    #[test]
    fn overlay_starts_at_target_rectangle() {
        // Arrange
        let desktop = FakeDesktop::default();
        desktop.add_window(0x20, 100, true, Rect::new(100, 100, 400, 300));
        let native = Arc::new(FakeNativeWindows::default());

        // Act
        let controller = OverlayController::create_overlay(
            native.clone(),
            &desktop,
            &overlay_config(false, true),
            WindowHandle(0x20),
            false,
        )
        .expect("overlay created");

        // Assert
        assert_eq!(
            native.rect(controller.handle()),
            Some(Rect::new(100, 100, 400, 300))
        );
        assert_eq!(
            controller.initial_geometry(),
            Some(Rect::new(100, 100, 400, 300))
        );
    }

    #[test]
    fn unreadable_target_falls_back_to_default_size() {
        let desktop = FakeDesktop::default();
        let native = Arc::new(FakeNativeWindows::default());

        let controller = OverlayController::create_overlay(
            native.clone(),
            &desktop,
            &overlay_config(false, true),
            WindowHandle(0x99),
            false,
        )
        .expect("overlay created");

        let spec = native.spec(controller.handle()).expect("window exists");
        assert_eq!(spec.position, None);
        assert_eq!(spec.size, (320, 240));
        assert_eq!(controller.initial_geometry(), None);
    }

    #[test]
    fn overlay_style_depends_on_take_focus() {
        let passive = WindowStyle::overlay(false);
        let interactive = WindowStyle::overlay(true);

        assert!(passive.topmost && passive.no_activate && passive.click_through);
        assert!(interactive.topmost && interactive.no_activate);
        assert!(!interactive.click_through);
        assert_eq!(WindowStyle::normal(), WindowStyle::default());
    }

    #[test]
    fn translucency_is_applied_after_creation() {
        let desktop = FakeDesktop::default();
        desktop.add_window(0x20, 100, true, Rect::new(0, 0, 10, 10));
        let native = Arc::new(FakeNativeWindows::default());

        let controller = OverlayController::create_overlay(
            native.clone(),
            &desktop,
            &overlay_config(false, true),
            WindowHandle(0x20),
            false,
        )
        .expect("overlay created");

        let h = controller.handle();
        assert_eq!(
            native.ops(),
            vec![NativeOp::Created(h), NativeOp::Translucency(h, 200)]
        );
    }

    #[test]
    fn take_focus_round_trip_restores_click_through() {
        // Arrange
        let desktop = FakeDesktop::default();
        desktop.add_window(0x20, 100, true, Rect::new(0, 0, 10, 10));
        let native = Arc::new(FakeNativeWindows::default());
        let controller = OverlayController::create_overlay(
            native.clone(),
            &desktop,
            &overlay_config(false, true),
            WindowHandle(0x20),
            false,
        )
        .expect("overlay created");
        let original = native.click_through(controller.handle());

        // Act
        controller.set_take_focus(true).expect("focus on");
        let while_focused = native.click_through(controller.handle());
        controller.set_take_focus(true).expect("focus on again");
        controller.set_take_focus(false).expect("focus off");

        // Assert
        assert_eq!(original, Some(true));
        assert_eq!(while_focused, Some(false));
        assert_eq!(native.click_through(controller.handle()), original);
        assert!(!controller.take_focus());
    }

    #[test]
    fn rejected_click_through_keeps_the_previous_focus_mode() {
        // Arrange
        let desktop = FakeDesktop::default();
        desktop.add_window(0x20, 100, true, Rect::new(0, 0, 10, 10));
        let native = Arc::new(FakeNativeWindows::default());
        let controller = OverlayController::create_overlay(
            native.clone(),
            &desktop,
            &overlay_config(false, true),
            WindowHandle(0x20),
            false,
        )
        .expect("overlay created");
        native.fail_click_through(true);

        // Act
        let result = controller.set_take_focus(true);

        // Assert
        assert!(matches!(result, Err(OverlayError::CreationFailed(_))));
        assert!(!controller.take_focus());
        assert_eq!(native.click_through(controller.handle()), Some(true));
    }

    #[test]
    fn set_take_focus_is_a_no_op_for_normal_windows() {
        let native = Arc::new(FakeNativeWindows::default());
        let config = WindowConfig::builder().build().expect("valid config");
        let controller =
            OverlayController::create_normal(native.clone(), &config).expect("window created");

        controller.set_take_focus(false).expect("no-op");

        assert!(!controller.is_overlay());
        assert!(controller.take_focus());
        assert_eq!(native.ops(), vec![NativeOp::Created(controller.handle())]);
    }

    #[test]
    fn creation_failure_is_propagated() {
        let native = Arc::new(FakeNativeWindows::default());
        native.fail_creation("class not registered");
        let config = WindowConfig::builder().build().expect("valid config");

        let result = OverlayController::create_normal(native, &config);

        assert!(matches!(result, Err(OverlayError::CreationFailed(_))));
    }

    #[test]
    fn drop_destroys_the_window() {
        let native = Arc::new(FakeNativeWindows::default());
        let config = WindowConfig::builder().build().expect("valid config");
        let controller =
            OverlayController::create_normal(native.clone(), &config).expect("window created");
        let handle = controller.handle();

        drop(controller);

        assert!(native.is_destroyed(handle));
    }
}

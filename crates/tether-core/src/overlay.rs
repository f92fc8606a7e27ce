use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use crate::config::WindowConfig;
use crate::controller::{NativeWindows, OverlayController};
use crate::tracking::{TrackingSession, TrackingState};
use crate::{
    Desktop, Locator, OverlayError, OverlayEvent, OverlayResult, ProcessTable, Rect, WindowHandle,
    log_info, log_warn,
};

/// One window, and when it is attached to a target, its tracking session.
///
/// Construction resolves the target once. If resolution fails the session
/// degrades to an ordinary window and keeps the reason in
/// [`OverlaySession::diagnostic`]. Dropping the session stops and joins
/// tracking before the native window is released.
pub struct OverlaySession<N: NativeWindows> {
    tracking: Option<TrackingSession>,
    controller: Arc<OverlayController<N>>,
    target: Option<WindowHandle>,
    events: Receiver<OverlayEvent>,
    diagnostic: Option<OverlayError>,
}

impl<N: NativeWindows + 'static> OverlaySession<N> {
    /// Creates the window described by `config`.
    ///
    /// Only native window creation failures are returned as errors; a
    /// target that can't be found yields a normal window instead.
    pub fn open<D>(
        desktop: Arc<D>,
        processes: &dyn ProcessTable,
        native: Arc<N>,
        config: &WindowConfig,
    ) -> OverlayResult<Self>
    where
        D: Desktop + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let Some(attachment) = config.attachment() else {
            let controller = OverlayController::create_normal(native, config)?;
            return Ok(Self::without_tracking(controller, rx, None));
        };

        let target = match Locator::new(&*desktop, processes).resolve(&attachment.target) {
            Ok(handle) => handle,
            Err(e) => {
                log_warn!(
                    "{}: {e}, creating a normal window instead",
                    attachment.target
                );
                let controller = OverlayController::create_normal(native, config)?;
                return Ok(Self::without_tracking(controller, rx, Some(e)));
            }
        };
        log_info!("{} resolved to window {target}", attachment.target);

        let controller = Arc::new(OverlayController::create_overlay(
            native,
            &*desktop,
            config,
            target,
            attachment.take_focus,
        )?);

        let tracking = TrackingSession::start(
            desktop,
            Arc::downgrade(&controller),
            target,
            controller.initial_geometry().unwrap_or_default(),
            config.poll_interval(),
            tx,
        )?;

        Ok(Self {
            tracking: Some(tracking),
            controller,
            target: Some(target),
            events: rx,
            diagnostic: None,
        })
    }

    fn without_tracking(
        controller: OverlayController<N>,
        events: Receiver<OverlayEvent>,
        diagnostic: Option<OverlayError>,
    ) -> Self {
        Self {
            tracking: None,
            controller: Arc::new(controller),
            target: None,
            events,
            diagnostic,
        }
    }
}

impl<N: NativeWindows> OverlaySession<N> {
    /// The window this session owns.
    pub fn handle(&self) -> WindowHandle {
        self.controller.handle()
    }

    /// Whether the window is an overlay attached to a target.
    pub fn is_overlay(&self) -> bool {
        self.controller.is_overlay()
    }

    /// The resolved target, or `None` for an ordinary window.
    pub fn target_window(&self) -> Option<WindowHandle> {
        self.target
    }

    /// Why an attachment fell back to an ordinary window.
    pub fn diagnostic(&self) -> Option<&OverlayError> {
        self.diagnostic.as_ref()
    }

    pub fn take_focus(&self) -> bool {
        self.controller.take_focus()
    }

    /// Switches the overlay between interactive and click-through.
    pub fn set_take_focus(&self, take_focus: bool) -> OverlayResult<()> {
        self.controller.set_take_focus(take_focus)
    }

    /// Tracking state, or `None` when no target is tracked.
    pub fn tracking_state(&self) -> Option<TrackingState> {
        self.tracking.as_ref().map(TrackingSession::state)
    }

    /// The target geometry last mirrored onto the overlay.
    pub fn last_geometry(&self) -> Option<Rect> {
        self.tracking.as_ref().map(TrackingSession::last_geometry)
    }

    /// Drains tracking notifications without blocking.
    pub fn poll_events(&self) -> impl Iterator<Item = OverlayEvent> + '_ {
        self.events.try_iter()
    }

    /// Stops and joins the tracking thread, if any. The window stays open.
    pub fn stop_tracking(&mut self) {
        if let Some(tracking) = self.tracking.as_mut() {
            tracking.stop();
        }
    }
}

impl<N: NativeWindows> Drop for OverlaySession<N> {
    fn drop(&mut self) {
        // Join before `controller` drops and releases the window.
        self.stop_tracking();
    }
}

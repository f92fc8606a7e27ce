use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use crate::controller::{NativeWindows, OverlayController};
use crate::{
    Desktop, OverlayError, OverlayEvent, OverlayResult, Rect, WindowHandle, log_debug, log_error,
    log_info, log_warn,
};

/// Lifecycle of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TrackingState {
    Idle = 0,
    Running = 1,
    /// Shutdown requested or target lost; the thread may still be running.
    Stopping = 2,
    /// The thread has been joined.
    Stopped = 3,
}

impl TrackingState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopping,
            3 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

/// State shared between the owner and the tracking thread.
struct Shared {
    stop: AtomicBool,
    state: AtomicU8,
    last_geometry: Mutex<Rect>,
}

impl Shared {
    fn set_state(&self, state: TrackingState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn state(&self) -> TrackingState {
        TrackingState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn last_geometry(&self) -> Rect {
        *self
            .last_geometry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A background thread keeping one overlay glued to its target.
///
/// Every poll interval it checks that the target still exists, mirrors
/// any move or resize onto the overlay, and reports size changes through
/// the event channel. When the target disappears it asks the overlay to
/// close and exits. Dropping the session stops and joins the thread.
pub struct TrackingSession {
    target: WindowHandle,
    poll_interval: Duration,
    shared: Arc<Shared>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TrackingSession {
    /// Spawns the tracking thread.
    ///
    /// `initial` is the geometry the overlay was created with; the first
    /// poll only acts if the target differs from it.
    pub fn start<D, N>(
        desktop: Arc<D>,
        controller: Weak<OverlayController<N>>,
        target: WindowHandle,
        initial: Rect,
        poll_interval: Duration,
        events: Sender<OverlayEvent>,
    ) -> OverlayResult<Self>
    where
        D: Desktop + ?Sized + 'static,
        N: NativeWindows + 'static,
    {
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            state: AtomicU8::new(TrackingState::Idle as u8),
            last_geometry: Mutex::new(initial),
        });
        shared.set_state(TrackingState::Running);

        let thread_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("tether-tracking".into())
            .spawn(move || {
                track(
                    &*desktop,
                    &controller,
                    target,
                    poll_interval,
                    &thread_shared,
                    &events,
                );
            })
            .map_err(|e| OverlayError::CreationFailed(format!("tracking thread: {e}")))?;

        Ok(Self {
            target,
            poll_interval,
            shared,
            thread: Some(thread),
        })
    }

    pub fn target(&self) -> WindowHandle {
        self.target
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn state(&self) -> TrackingState {
        self.shared.state()
    }

    /// The target rectangle last mirrored onto the overlay.
    pub fn last_geometry(&self) -> Rect {
        self.shared.last_geometry()
    }

    /// Requests shutdown and blocks until the thread has exited.
    ///
    /// The thread notices within one poll interval. Calling this again
    /// after the session stopped does nothing.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.shared.stop.store(true, Ordering::Release);
        if self.shared.state() == TrackingState::Running {
            self.shared.set_state(TrackingState::Stopping);
        }
        if thread.join().is_err() {
            log_error!("tracking thread for {} panicked", self.target);
        }
        self.shared.set_state(TrackingState::Stopped);
        log_debug!("tracking of {} stopped", self.target);
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Whether the loop keeps going after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Continue,
    TargetLost,
}

fn track<D, N>(
    desktop: &D,
    controller: &Weak<OverlayController<N>>,
    target: WindowHandle,
    poll_interval: Duration,
    shared: &Shared,
    events: &Sender<OverlayEvent>,
) where
    D: Desktop + ?Sized,
    N: NativeWindows,
{
    log_info!("tracking {target} every {poll_interval:?}");

    while !shared.stop.load(Ordering::Acquire) {
        thread::sleep(poll_interval);
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        let Some(controller) = controller.upgrade() else {
            break;
        };

        if poll_target(desktop, &controller, target, &shared.last_geometry, events)
            == PollOutcome::TargetLost
        {
            shared.set_state(TrackingState::Stopping);
            break;
        }
    }

    log_debug!("tracking loop for {target} exited");
}

/// One iteration of the loop body: liveness, then geometry.
pub(crate) fn poll_target<D, N>(
    desktop: &D,
    controller: &OverlayController<N>,
    target: WindowHandle,
    last_geometry: &Mutex<Rect>,
    events: &Sender<OverlayEvent>,
) -> PollOutcome
where
    D: Desktop + ?Sized,
    N: NativeWindows,
{
    if !desktop.is_window(target) {
        log_info!("target {target} is gone, closing overlay {}", controller.handle());
        controller.request_close();
        let _ = events.send(OverlayEvent::TargetLost);
        return PollOutcome::TargetLost;
    }

    let rect = match desktop.window_rect(target) {
        Ok(rect) => rect,
        Err(e) => {
            log_debug!("target {target} rectangle unavailable: {e}");
            return PollOutcome::Continue;
        }
    };

    let mut last = last_geometry.lock().unwrap_or_else(PoisonError::into_inner);
    if rect == *last {
        return PollOutcome::Continue;
    }

    // Leave the old geometry in place on failure so the next poll retries.
    if let Err(e) = controller.move_to(rect) {
        log_warn!("failed to move overlay {}: {e}", controller.handle());
        return PollOutcome::Continue;
    }

    let resized = !rect.same_size(&last);
    *last = rect;
    drop(last);

    if resized {
        let _ = events.send(OverlayEvent::Resized(rect));
    }
    PollOutcome::Continue
}

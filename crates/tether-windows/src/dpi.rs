use std::sync::Once;

use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};

static DPI_AWARENESS: Once = Once::new();

/// Declares the process per-monitor DPI aware (V2), once.
///
/// Overlays copy target rectangles verbatim, so both sides must be in
/// physical pixels. Without this a target on a scaled monitor reports
/// virtualized coordinates and the overlay drifts off it.
pub fn enable_dpi_awareness() {
    DPI_AWARENESS.call_once(|| {
        // Fails when a manifest already set the awareness; nothing to do then.
        if let Err(e) = unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) }
        {
            tether_core::log_debug!("DPI awareness unchanged: {e}");
        }
    });
}

use crate::{
    Desktop, OverlayError, OverlayResult, ProcessTable, TargetReference, WindowHandle, log_debug,
    log_warn,
};

/// Resolves a [`TargetReference`] to a concrete window handle.
///
/// Pid lookups walk the desktop's top-level windows directly. Name lookups
/// first find the pid in a process table snapshot, so they work whichever
/// [`ProcessTable`] backs the locator.
pub struct Locator<'a, D: Desktop + ?Sized> {
    desktop: &'a D,
    processes: &'a dyn ProcessTable,
}

impl<'a, D: Desktop + ?Sized> Locator<'a, D> {
    pub fn new(desktop: &'a D, processes: &'a dyn ProcessTable) -> Self {
        Self { desktop, processes }
    }

    /// Resolves the target once.
    ///
    /// Returns [`OverlayError::TargetNotFound`] when nothing matches,
    /// including when the process table itself could not be read.
    pub fn resolve(&self, target: &TargetReference) -> OverlayResult<WindowHandle> {
        match target {
            TargetReference::ByHandle(handle) => self.by_handle(*handle),
            TargetReference::ByProcessId(pid) => self.by_process_id(*pid),
            TargetReference::ByProcessName(name) => self.by_process_name(name),
        }
    }

    /// Accepts the handle if it denotes a window right now. The window may
    /// still vanish immediately afterwards; tracking re-checks every poll.
    fn by_handle(&self, handle: WindowHandle) -> OverlayResult<WindowHandle> {
        if self.desktop.is_window(handle) {
            Ok(handle)
        } else {
            Err(OverlayError::TargetNotFound)
        }
    }

    /// First visible top-level window owned by `pid`, in native order.
    ///
    /// A process with several visible windows resolves to whichever the
    /// platform lists first; that order is not stable across runs.
    pub fn by_process_id(&self, pid: u32) -> OverlayResult<WindowHandle> {
        let windows = self.desktop.top_level_windows().map_err(|e| {
            log_warn!("window enumeration failed: {e}");
            OverlayError::TargetNotFound
        })?;

        windows
            .iter()
            .find(|w| w.process_id == pid && w.visible)
            .map(|w| w.handle)
            .ok_or(OverlayError::TargetNotFound)
    }

    /// Finds the first process named exactly `name`, then its window.
    ///
    /// Only the first matching process is considered: if it has no visible
    /// window, later processes with the same name are not tried.
    fn by_process_name(&self, name: &str) -> OverlayResult<WindowHandle> {
        let mut records = self.processes.snapshot().map_err(|e| {
            log_warn!("process snapshot failed: {e}");
            OverlayError::TargetNotFound
        })?;

        let record = records
            .find(|r| r.image_name == name)
            .ok_or(OverlayError::TargetNotFound)?;
        log_debug!("'{name}' matched process {}", record.process_id);

        self.by_process_id(record.process_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDesktop, FakeProcesses};
    use crate::{ProcessRecord, Rect};

    fn desktop() -> FakeDesktop {
        let desktop = FakeDesktop::default();
        desktop.add_window(0x10, 100, false, Rect::new(0, 0, 10, 10));
        desktop.add_window(0x20, 100, true, Rect::new(100, 100, 400, 300));
        desktop.add_window(0x30, 100, true, Rect::new(0, 0, 50, 50));
        desktop.add_window(0x40, 200, true, Rect::new(0, 0, 640, 480));
        desktop
    }

    fn processes() -> FakeProcesses {
        FakeProcesses::new(vec![
            ProcessRecord::new(4, "System"),
            ProcessRecord::new(100, "notepad.exe"),
            ProcessRecord::new(200, "game.exe"),
            ProcessRecord::new(300, "game.exe"),
        ])
    }

    #[test]
    fn process_id_resolves_first_visible_window() {
        // Arrange
        let desktop = desktop();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        // Act
        let handle = locator.resolve(&TargetReference::ByProcessId(100));

        // Assert
        assert_eq!(handle, Ok(WindowHandle(0x20)));
    }

    #[test]
    fn process_name_matches_pid_lookup() {
        let desktop = desktop();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        let by_name = locator.resolve(&TargetReference::ByProcessName("notepad.exe".into()));
        let by_pid = locator.resolve(&TargetReference::ByProcessId(100));

        assert_eq!(by_name, by_pid);
        assert_eq!(by_name, Ok(WindowHandle(0x20)));
    }

    #[test]
    fn process_name_match_is_case_sensitive() {
        let desktop = desktop();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        let result = locator.resolve(&TargetReference::ByProcessName("Notepad.exe".into()));

        assert_eq!(result, Err(OverlayError::TargetNotFound));
    }

    #[test]
    fn shared_name_resolves_through_first_process_only() {
        // Arrange: process 300 has no window at all
        let desktop = desktop();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        // Act
        let result = locator.resolve(&TargetReference::ByProcessName("game.exe".into()));

        // Assert
        assert_eq!(result, Ok(WindowHandle(0x40)));
    }

    #[test]
    fn unknown_targets_are_not_found() {
        let desktop = desktop();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        for target in [
            TargetReference::ByProcessId(9999),
            TargetReference::ByProcessName("missing.exe".into()),
            TargetReference::ByHandle(WindowHandle(0xDEAD)),
        ] {
            assert_eq!(locator.resolve(&target), Err(OverlayError::TargetNotFound));
        }
    }

    #[test]
    fn process_with_only_hidden_windows_is_not_found() {
        let desktop = FakeDesktop::default();
        desktop.add_window(0x10, 100, false, Rect::new(0, 0, 10, 10));
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        assert_eq!(
            locator.resolve(&TargetReference::ByProcessId(100)),
            Err(OverlayError::TargetNotFound)
        );
    }

    #[test]
    fn live_handle_resolves_to_itself() {
        let desktop = desktop();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        let result = locator.resolve(&TargetReference::ByHandle(WindowHandle(0x10)));

        assert_eq!(result, Ok(WindowHandle(0x10)));
    }

    #[test]
    fn snapshot_failure_degrades_to_not_found() {
        let desktop = desktop();
        let processes = FakeProcesses::failing(OverlayError::EnumerationFailed("denied".into()));
        let locator = Locator::new(&desktop, &processes);

        let result = locator.resolve(&TargetReference::ByProcessName("notepad.exe".into()));

        assert_eq!(result, Err(OverlayError::TargetNotFound));
    }

    #[test]
    fn window_enumeration_failure_degrades_to_not_found() {
        let desktop = desktop();
        desktop.fail_enumeration();
        let processes = processes();
        let locator = Locator::new(&desktop, &processes);

        let result = locator.resolve(&TargetReference::ByProcessId(100));

        assert_eq!(result, Err(OverlayError::TargetNotFound));
    }
}

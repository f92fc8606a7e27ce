use std::time::Duration;

use super::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TRANSLUCENCY, OPAQUE};
use crate::{OverlayError, OverlayResult, TargetReference, WindowHandle};

/// How a window attaches to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub target: TargetReference,
    /// Whether the overlay captures input instead of passing it through.
    pub take_focus: bool,
    /// Whether the overlay is drawn translucent.
    pub transparent: bool,
}

/// A complete, validated window configuration.
///
/// Built once through [`WindowConfig::builder`] and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    title: String,
    class_name: String,
    width: i32,
    height: i32,
    clear_color: [f32; 4],
    attachment: Option<Attachment>,
    poll_interval: Duration,
    translucency: Option<u8>,
}

impl WindowConfig {
    pub fn builder() -> WindowConfigBuilder {
        WindowConfigBuilder::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Fallback size used when there is no target rectangle.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// The target to attach to, or `None` for an ordinary window.
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Alpha applied to the overlay: the explicit level if one was set,
    /// otherwise partially transparent or opaque per the attachment.
    pub fn translucency(&self) -> u8 {
        match (self.translucency, &self.attachment) {
            (Some(level), _) => level,
            (None, Some(attachment)) if attachment.transparent => DEFAULT_TRANSLUCENCY,
            _ => OPAQUE,
        }
    }
}

/// Staged builder for [`WindowConfig`].
#[derive(Debug, Clone)]
pub struct WindowConfigBuilder {
    title: String,
    class_name: String,
    width: i32,
    height: i32,
    clear_color: [f32; 4],
    attachment: Option<Attachment>,
    poll_interval_ms: u64,
    translucency: Option<u8>,
}

impl Default for WindowConfigBuilder {
    fn default() -> Self {
        Self {
            title: "Window".into(),
            class_name: "TetherWindowClass".into(),
            width: 800,
            height: 600,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            attachment: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            translucency: None,
        }
    }
}

impl WindowConfigBuilder {
    /// Sets the window title and window class name.
    pub fn name(mut self, title: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.title = title.into();
        self.class_name = class_name.into();
        self
    }

    /// Sets the size used for ordinary windows and as the overlay fallback.
    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the colour the surface is cleared to before every frame.
    pub fn clear_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.clear_color = [r, g, b, a];
        self
    }

    /// Attaches to a window handle the caller already has.
    pub fn attach_to_handle(self, handle: WindowHandle, take_focus: bool, transparent: bool) -> Self {
        self.attach(TargetReference::ByHandle(handle), take_focus, transparent)
    }

    /// Attaches to the first visible top-level window of a process.
    pub fn attach_to_process_id(self, pid: u32, take_focus: bool, transparent: bool) -> Self {
        self.attach(TargetReference::ByProcessId(pid), take_focus, transparent)
    }

    /// Attaches to the first process with this exact executable name.
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

    /// Attaches to any target reference. A later call replaces an earlier one.
    pub fn attach(mut self, target: TargetReference, take_focus: bool, transparent: bool) -> Self {
        self.attachment = Some(Attachment {
            target,
            take_focus,
            transparent,
        });
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Overrides the overlay alpha (0 = invisible, 255 = opaque).
    pub fn translucency(mut self, level: u8) -> Self {
        self.translucency = Some(level);
        self
    }

    /// Validates the settings and produces the immutable configuration.
    pub fn build(self) -> OverlayResult<WindowConfig> {
        if self.class_name.is_empty() {
            return Err(invalid("window class name is empty"));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(invalid(format!(
                "window size {}x{} is not positive",
                self.width, self.height
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll interval must be at least 1 ms"));
        }
        if let Some(Attachment {
            target: TargetReference::ByProcessName(name),
            ..
        }) = &self.attachment
            && name.is_empty()
        {
            return Err(invalid("process name is empty"));
        }

        Ok(WindowConfig {
            title: self.title,
            class_name: self.class_name,
            width: self.width,
            height: self.height,
            clear_color: self.clear_color,
            attachment: self.attachment,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            translucency: self.translucency,
        })
    }
}

fn invalid(reason: impl Into<String>) -> OverlayError {
    OverlayError::InvalidConfig(reason.into())
}

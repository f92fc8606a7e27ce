mod builder;
mod loader;

use serde::{Deserialize, Serialize};

use crate::log::LogConfig;

pub use builder::{Attachment, WindowConfig, WindowConfigBuilder};
pub use loader::{config_dir, config_path, load, try_load_from};

/// Default delay between two tracking polls, roughly one 60 Hz frame.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 16;

/// Default translucency of a transparent overlay (0 = invisible, 255 = opaque).
pub const DEFAULT_TRANSLUCENCY: u8 = 200;

/// Translucency level of a fully opaque window.
pub const OPAQUE: u8 = 255;

/// Slowest poll interval accepted from the config file.
const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// Top-level configuration for Tether.
///
/// Loaded from `~/.config/tether/config.toml`. Missing sections
/// fall back to defaults thanks to `#[serde(default)]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults applied to every overlay the CLI opens.
    pub overlay: OverlayConfig,
    /// File logging settings.
    pub logging: LogConfig,
}

/// Overlay defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Milliseconds between two target geometry checks.
    pub poll_interval_ms: u64,
    /// Alpha of transparent overlays, 0-255.
    pub translucency: u8,
    /// Window width used when the target rectangle can't be read.
    pub default_width: i32,
    /// Window height used when the target rectangle can't be read.
    pub default_height: i32,
    /// RGBA colour the surface is cleared to every frame (0.0-1.0).
    pub clear_color: [f32; 4],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            translucency: DEFAULT_TRANSLUCENCY,
            default_width: 800,
            default_height: 600,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl OverlayConfig {
    /// Returns a window builder seeded with these defaults.
    ///
    /// The translucency level is not applied here: it only concerns
    /// transparent attachments, see [`OverlayConfig::translucency`].
    pub fn builder(&self) -> WindowConfigBuilder {
        let [r, g, b, a] = self.clear_color;
        WindowConfig::builder()
            .size(self.default_width, self.default_height)
            .poll_interval_ms(self.poll_interval_ms)
            .clear_color(r, g, b, a)
    }
}

impl Config {
    /// Clamps loaded values to ranges the overlay can work with.
    pub fn validate(&mut self) {
        let overlay = &mut self.overlay;
        overlay.poll_interval_ms = overlay.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS);
        overlay.default_width = overlay.default_width.max(1);
        overlay.default_height = overlay.default_height.max(1);
        for channel in &mut overlay.clear_color {
            *channel = if channel.is_nan() {
                0.0
            } else {
                channel.clamp(0.0, 1.0)
            };
        }
    }
}

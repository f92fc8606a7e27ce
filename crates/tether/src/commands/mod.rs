//! Subcommand implementations.

#[cfg(windows)]
pub mod attach;
#[cfg(windows)]
pub mod find;
#[cfg(windows)]
pub mod processes;
pub mod show_config;
#[cfg(any(windows, test))]
pub mod target;
#[cfg(windows)]
pub mod windows;

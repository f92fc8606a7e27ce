use clap::Args;

use tether_core::{TargetReference, WindowHandle};

/// Selects the window an overlay attaches to. Exactly one is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Window handle (decimal or hex with 0x prefix)
    #[arg(long, value_parser = parse_handle)]
    pub hwnd: Option<WindowHandle>,
    /// Process id; its first visible window is used
    #[arg(long)]
    pub pid: Option<u32>,
    /// Executable name, e.g. notepad.exe (case-sensitive)
    #[arg(long)]
    pub name: Option<String>,
}

impl TargetArgs {
    pub fn reference(&self) -> Option<TargetReference> {
        if let Some(handle) = self.hwnd {
            return Some(TargetReference::ByHandle(handle));
        }
        if let Some(pid) = self.pid {
            return Some(TargetReference::ByProcessId(pid));
        }
        self.name.clone().map(TargetReference::ByProcessName)
    }
}

/// Parses a window handle from a string (supports decimal and 0x hex).
pub fn parse_handle(s: &str) -> Result<WindowHandle, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    match parsed {
        Ok(0) => Err("window handle must not be zero".into()),
        Ok(raw) => Ok(WindowHandle(raw)),
        Err(e) => Err(format!("invalid window handle '{s}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal_handles() {
        assert_eq!(parse_handle("0x1A2B"), Ok(WindowHandle(0x1A2B)));
        assert_eq!(parse_handle("0XFF"), Ok(WindowHandle(0xFF)));
        assert_eq!(parse_handle("4660"), Ok(WindowHandle(4660)));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(parse_handle("0").is_err());
        assert!(parse_handle("0xZZ").is_err());
        assert!(parse_handle("notepad").is_err());
    }

    #[test]
    fn reference_prefers_the_given_selector() {
        let args = TargetArgs {
            hwnd: None,
            pid: Some(42),
            name: None,
        };

        assert_eq!(args.reference(), Some(TargetReference::ByProcessId(42)));
    }
}

use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use tether_core::Desktop;
use tether_windows::Win32Desktop;

/// Arguments for the `windows` subcommand.
#[derive(Args, Debug)]
pub struct WindowsArgs {
    /// Include hidden and untitled windows
    #[arg(long)]
    all: bool,
}

/// Lists top-level windows in z-order with their owning process.
pub fn execute(args: &WindowsArgs) -> i32 {
    tether_windows::dpi::enable_dpi_awareness();

    let desktop = Win32Desktop;
    let windows = match desktop.top_level_windows() {
        Ok(windows) => windows,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("HWND"),
            Cell::new("PID").set_alignment(CellAlignment::Right),
            Cell::new("Visible"),
            Cell::new("Title"),
            Cell::new("Class"),
            Cell::new("Width").set_alignment(CellAlignment::Right),
            Cell::new("Height").set_alignment(CellAlignment::Right),
        ]);

    let mut count = 0;
    for window in &windows {
        let title = desktop.title(window.handle);
        if !args.all && (!window.visible || title.is_empty()) {
            continue;
        }

        let rect = desktop.window_rect(window.handle).unwrap_or_default();
        table.add_row(vec![
            Cell::new(window.handle),
            Cell::new(window.process_id).set_alignment(CellAlignment::Right),
            Cell::new(if window.visible { "yes" } else { "no" }),
            Cell::new(title),
            Cell::new(desktop.class_name(window.handle)),
            Cell::new(rect.width).set_alignment(CellAlignment::Right),
            Cell::new(rect.height).set_alignment(CellAlignment::Right),
        ]);
        count += 1;
    }

    println!("{table}");
    println!("\n{count} windows found");
    0
}

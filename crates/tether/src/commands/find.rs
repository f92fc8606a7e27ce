use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use tether_core::{Desktop, Locator, TopLevelWindow};
use tether_windows::Win32Desktop;

use super::processes::process_table;
use super::target::TargetArgs;

/// Arguments for the `find` subcommand.
#[derive(Args, Debug)]
pub struct FindArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Resolve process names with the ToolHelp walk instead of the raw table
    #[arg(long)]
    toolhelp: bool,
}

/// Resolves a target the way `attach` would and prints the window found.
pub fn execute(args: &FindArgs) -> i32 {
    tether_windows::dpi::enable_dpi_awareness();

    let Some(target) = args.target.reference() else {
        eprintln!("Error: no target given.");
        return 2;
    };

    let desktop = Win32Desktop;
    let processes = process_table(args.toolhelp);
    let handle = match Locator::new(&desktop, processes.as_ref()).resolve(&target) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{target}: {e}");
            return 1;
        }
    };

    let process_id = desktop
        .top_level_windows()
        .unwrap_or_default()
        .iter()
        .find(|w| w.handle == handle)
        .map(|w: &TopLevelWindow| w.process_id.to_string())
        .unwrap_or_else(|| "-".into());
    let rect = desktop.window_rect(handle).unwrap_or_default();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("HWND"),
            Cell::new("PID").set_alignment(CellAlignment::Right),
            Cell::new("Title"),
            Cell::new("Class"),
            Cell::new("X").set_alignment(CellAlignment::Right),
            Cell::new("Y").set_alignment(CellAlignment::Right),
            Cell::new("Width").set_alignment(CellAlignment::Right),
            Cell::new("Height").set_alignment(CellAlignment::Right),
        ])
        .add_row(vec![
            Cell::new(handle),
            Cell::new(process_id).set_alignment(CellAlignment::Right),
            Cell::new(desktop.title(handle)),
            Cell::new(desktop.class_name(handle)),
            Cell::new(rect.x).set_alignment(CellAlignment::Right),
            Cell::new(rect.y).set_alignment(CellAlignment::Right),
            Cell::new(rect.width).set_alignment(CellAlignment::Right),
            Cell::new(rect.height).set_alignment(CellAlignment::Right),
        ]);

    println!("{table}");
    0
}

use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use tether_core::ProcessTable;
use tether_windows::{NtProcessTable, ToolhelpProcessTable};

/// Arguments for the `processes` subcommand.
#[derive(Args, Debug)]
pub struct ProcessesArgs {
    /// Read the ToolHelp walk instead of the raw system table
    #[arg(long)]
    toolhelp: bool,
    /// Only show image names containing this text (case-insensitive)
    #[arg(long)]
    filter: Option<String>,
}

/// The process table selected on the command line.
pub fn process_table(toolhelp: bool) -> Box<dyn ProcessTable> {
    if toolhelp {
        Box::new(ToolhelpProcessTable)
    } else {
        Box::new(NtProcessTable)
    }
}

/// Prints one snapshot of the process table.
pub fn execute(args: &ProcessesArgs) -> i32 {
    let records = match process_table(args.toolhelp).snapshot() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: could not read the process table: {e}");
            return 1;
        }
    };
    let filter = args.filter.as_deref().map(str::to_lowercase);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("PID").set_alignment(CellAlignment::Right),
            Cell::new("Image"),
        ]);

    let mut count = 0;
    for record in records {
        if let Some(filter) = &filter
            && !record.image_name.to_lowercase().contains(filter)
        {
            continue;
        }

        table.add_row(vec![
            Cell::new(record.process_id).set_alignment(CellAlignment::Right),
            Cell::new(record.image_name),
        ]);
        count += 1;
    }

    println!("{table}");
    println!("\n{count} processes found");
    0
}

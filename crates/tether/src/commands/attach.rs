use clap::Args;

use tether_core::config::Config;
use tether_windows::{ToolhelpProcessTable, Window, WindowBuilder};

use super::target::TargetArgs;

/// Arguments for the `attach` subcommand.
#[derive(Args, Debug)]
pub struct AttachArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Capture mouse and keyboard input instead of passing it through
    #[arg(long)]
    take_focus: bool,
    /// Draw the overlay fully opaque
    #[arg(long)]
    opaque: bool,
    /// Alpha of a transparent overlay, 0-255 (default from config)
    #[arg(long, conflicts_with = "opaque")]
    translucency: Option<u8>,
    /// Resolve process names with the ToolHelp walk instead of the raw table
    #[arg(long)]
    toolhelp: bool,
}

/// Opens an overlay on the target and runs it until the target closes.
pub fn execute(args: &AttachArgs, config: &Config) -> i32 {
    let Some(target) = args.target.reference() else {
        eprintln!("Error: no target given.");
        return 2;
    };

    let transparent = !args.opaque;
    let mut settings = config
        .overlay
        .builder()
        .name("Tether", "TetherOverlay")
        .attach(target.clone(), args.take_focus, transparent);
    if transparent {
        settings = settings.translucency(args.translucency.unwrap_or(config.overlay.translucency));
    }

    let label = target.to_string();
    let mut builder = WindowBuilder::with_config(settings).on_render(move |w| draw_status(w, &label));
    if args.toolhelp {
        builder = builder.process_table(ToolhelpProcessTable);
    }

    let mut window = match builder.build() {
        Ok(window) => window,
        Err(e) => {
            eprintln!("Error: could not open overlay: {e}");
            return 1;
        }
    };

    match (window.target_window(), window.diagnostic()) {
        (Some(handle), _) => println!("Attached to window {handle} ({target})."),
        (None, Some(reason)) => {
            eprintln!("{target}: {reason}. Showing a normal window instead.");
        }
        (None, None) => {}
    }

    window.show();
    0
}

fn draw_status(window: &mut Window, label: &str) {
    let line = match window.target_window() {
        Some(handle) => format!("{label} -> {handle}"),
        None => format!("{label}: not found"),
    };
    let input = if window.take_focus() {
        "input: captured"
    } else {
        "input: click-through"
    };

    let surface = window.surface();
    surface.draw_text(8, 8, &line, [255, 255, 255]);
    surface.draw_text(8, 28, input, [190, 190, 190]);
}

mod commands;

use clap::{Parser, Subcommand};

use tether_core::config::{self, Config};

#[derive(Parser)]
#[command(
    name = "tether",
    version,
    about = "Pin overlay windows on top of other applications' windows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an overlay on a target window and follow it until it closes
    #[cfg(windows)]
    Attach(commands::attach::AttachArgs),
    /// Resolve a target and print the window it refers to
    #[cfg(windows)]
    Find(commands::find::FindArgs),
    /// Print a snapshot of the process table
    #[cfg(windows)]
    Processes(commands::processes::ProcessesArgs),
    /// List top-level windows with their owning process
    #[cfg(windows)]
    Windows(commands::windows::WindowsArgs),
    /// Print the configuration in effect
    Config,
}

fn main() {
    let cli = Cli::parse();

    let config = config::load();
    tether_core::log::init(&config.logging);

    let code = run(cli.command, &config);
    std::process::exit(code);
}

fn run(command: Commands, config: &Config) -> i32 {
    match command {
        #[cfg(windows)]
        Commands::Attach(args) => commands::attach::execute(&args, config),
        #[cfg(windows)]
        Commands::Find(args) => commands::find::execute(&args),
        #[cfg(windows)]
        Commands::Processes(args) => commands::processes::execute(&args),
        #[cfg(windows)]
        Commands::Windows(args) => commands::windows::execute(&args),
        Commands::Config => commands::show_config::execute(config),
    }
}

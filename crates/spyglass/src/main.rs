mod commands;
mod report;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spyglass",
    version,
    about = "A live window inspector with a drag-to-target finder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default configuration file
    Init,
    /// Open the finder window and inspect windows under the cursor
    Inspect,
    /// Resolve the window at a screen point once
    Probe(commands::probe::ProbeArgs),
    /// Load and unload the companion library in a process once
    Inject(commands::inject::InjectArgs),
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Inspect => commands::inspect::execute(),
        Commands::Probe(args) => commands::probe::execute(&args),
        Commands::Inject(args) => commands::inject::execute(&args),
    }
}

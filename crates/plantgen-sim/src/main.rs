use std::error::Error;

use clap::{Parser, Subcommand};
use commands::generate::{self, GenerateArgs};

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "plantgen-sim", about = "Cereal plant population generator")]
struct Cli {
    /// Log level, e.g. `info` or `plantgen_fit=debug`.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one or more plant populations from a configuration and user tables.
    Generate(GenerateArgs),
    /// Print the tool version.
    Version,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _logger = logging::init(&cli.log_level)?;
    match cli.command {
        Command::Generate(args) => {
            let manifests = generate::run(&args)?;
            for manifest in &manifests {
                println!("replicate {} {}", manifest.replicate, manifest.tables_digest);
            }
            Ok(())
        }
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

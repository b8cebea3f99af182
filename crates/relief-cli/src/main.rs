//! Relief CLI - turn a photo into a multi-color printable relief.
//!
//! Usage: relief <COMMAND> [OPTIONS] <INPUT>
//!
//! Run `relief --help` for available commands.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod output;

#[derive(Parser)]
#[command(name = "relief")]
#[command(author, version, about = "Photo to multi-color relief STL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all text output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce a photo to a few flat colors and save it as an image
    Quantize(commands::quantize::QuantizeArgs),

    /// Quantize a photo and build a binary STL relief from it
    Generate(commands::generate::GenerateArgs),

    /// Print the effective configuration
    Config,
}

/// How results are printed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = commands::load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Quantize(args) => commands::quantize::run(args, config, cli.format, cli.quiet),
        Commands::Generate(args) => commands::generate::run(args, config, cli.format, cli.quiet),
        Commands::Config => commands::print_config(&config, cli.format),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&err, cli.format);
            ExitCode::FAILURE
        }
    }
}

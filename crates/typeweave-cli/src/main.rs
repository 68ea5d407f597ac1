//! Typeweave CLI - schema type extraction and Rust code generation.

mod commands;
mod formatters;
mod logging;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "typeweave")]
#[command(about = "Extract types from .schema modules and generate Rust code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Extract types from the configured schema modules
    Extract(commands::ExtractArgs),

    /// Extract and write the generated Rust module
    Generate(commands::GenerateArgs),

    /// Manage typeweave.toml
    Config {
        #[command(subcommand)]
        command: commands::ConfigCommand,
    },

    /// Serve one extraction request on stdin/stdout
    #[command(hide = true)]
    Worker,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Extract(args) => commands::handle_extract_command(args),
        Command::Generate(args) => commands::handle_generate_command(args),
        Command::Config { command } => commands::handle_config_command(command),
        Command::Worker => std::process::exit(commands::run_worker()),
    }
}

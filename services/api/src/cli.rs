use crate::demo::{run_allocate, AllocateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tikrar_pairing::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Tikrar Pairing",
    about = "Run the study-partner pairing and halaqah capacity service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Import a cohort roster CSV and run one bulk allocation offline
    Allocate(AllocateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Preload the in-memory store from a cohort roster CSV
    #[arg(long, requires = "cohort")]
    pub(crate) seed_csv: Option<PathBuf>,
    /// Cohort id assigned to rows loaded with --seed-csv
    #[arg(long)]
    pub(crate) cohort: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Allocate(args) => run_allocate(args),
    }
}

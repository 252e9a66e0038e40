use crate::demo::{run_demo, run_portfolio_import, DemoArgs, PortfolioImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use leasehold::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Leasehold",
    about = "Run and demonstrate the lease lifecycle service from the command line",
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
    /// Work with portfolio spreadsheet exports
    Portfolio {
        #[command(subcommand)]
        command: PortfolioCommand,
    },
    /// Run an end-to-end CLI demo covering the lease lifecycle and rent queries
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PortfolioCommand {
    /// Validate a portfolio CSV export by importing it into a transient store
    Import(PortfolioImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Portfolio {
            command: PortfolioCommand::Import(args),
        } => run_portfolio_import(args),
        Command::Demo(args) => run_demo(args),
    }
}

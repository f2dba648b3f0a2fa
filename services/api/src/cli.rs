use crate::demo::{run_demo, DemoArgs};
use crate::directory::{list_agencies, list_housegirls, AgencyListArgs, HousegirlListArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use domestic_connect::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Domestic Connect",
    about = "Run the Domestic Connect marketplace service and its command-line tools",
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
    /// Load and filter directory listings
    Directory {
        #[command(subcommand)]
        command: DirectoryCommand,
    },
    /// Walk through sign-up, browsing, and payment (in-memory unless --backend)
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum DirectoryCommand {
    /// List placement agencies
    Agencies(AgencyListArgs),
    /// List domestic workers
    Housegirls(HousegirlListArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the agency listing from a CSV export instead of the backend
    #[arg(long)]
    pub(crate) agencies_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Directory {
            command: DirectoryCommand::Agencies(args),
        } => list_agencies(args).await,
        Command::Directory {
            command: DirectoryCommand::Housegirls(args),
        } => list_housegirls(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

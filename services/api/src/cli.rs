use crate::eligible::{run_eligible, EligibleArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use scheme_eligibility::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Scheme Eligibility Service",
    about = "Serve the scheme eligibility API or evaluate an applicant from the command line",
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
    /// Print the schemes an applicant qualifies for as JSON
    Eligible(EligibleArgs),
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
        Command::Eligible(args) => run_eligible(args),
    }
}

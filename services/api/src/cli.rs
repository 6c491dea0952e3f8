use crate::commands::{run_assess, run_model_status, AssessArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_scoring::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Risk Scoring",
    about = "Score loan applications and serve explainable approval scores",
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
    /// Score a single application read from a JSON file or stdin
    Assess(AssessArgs),
    /// Load or train the scoring model and report the active strategy
    Model,
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
        Command::Assess(args) => run_assess(args),
        Command::Model => run_model_status(),
    }
}

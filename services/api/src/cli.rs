use crate::server;
use crate::submit::{run_submit, SubmitArgs};
use clap::{Args, Parser, Subcommand};
use loan_leads::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Leads",
    about = "Run the loan enquiry relay or send an enquiry through it from the command line",
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
    /// Fill in the two-step enquiry form and submit it to a running service
    Submit(SubmitArgs),
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
        Command::Submit(args) => run_submit(args).await,
    }
}

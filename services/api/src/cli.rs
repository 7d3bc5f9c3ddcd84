use crate::demo::{run_demo, run_gate, run_suggest, DemoArgs, GateArgs, SuggestArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use staff_eval::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Staff Evaluation Service",
    about = "Run and explore the staff performance evaluation workflow from the command line",
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
    /// Show which evaluation sections a role may see and edit at a given status
    Gate(GateArgs),
    /// Compute a suggested final grade from a self grade and reviewer ratings
    Suggest(SuggestArgs),
    /// Drive sample evaluations through every review stage and print the period report
    Demo(DemoArgs),
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
        Command::Gate(args) => run_gate(args),
        Command::Suggest(args) => run_suggest(args),
        Command::Demo(args) => run_demo(args),
    }
}

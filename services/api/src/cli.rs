use crate::demo::{run_demo, run_months, DemoArgs, MonthsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ensemble::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Ensemble",
    about = "Run the Ensemble operations portal or explore it from the command line",
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
    /// Print the scorecard month columns a time period resolves to
    Months(MonthsArgs),
    /// Seed an in-memory portal and print a scorecard and turnover dashboard
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
    /// Pre-populate the store with a demo team before serving
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Months(args) => run_months(args),
        Command::Demo(args) => run_demo(args),
    }
}

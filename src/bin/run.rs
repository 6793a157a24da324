//! Entry point: loads (or writes default) configuration, then runs the
//! supervisor for the configured wall-clock budget.

use clap::Parser;
use pbt_knapsack::config::Config;

#[derive(Parser)]
#[command(author, version, about = "Population-based training of simulated-annealing workers for the multidimensional knapsack problem.", long_about = None)]
struct Cli {
    /// Path to the JSON config document. Written with defaults on first run
    /// if it doesn't exist.
    #[arg(long, default_value = "cfg.json")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pbt_knapsack::logging::init();
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)?;
    pbt_knapsack::supervisor::run(config).await
}

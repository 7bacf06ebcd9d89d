mod cli;
mod config;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use tokio::runtime::Runtime;

use cli::commands::run_cli;
use cli::opts::Cli;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let rt = Runtime::new()?;
    rt.block_on(run_cli(args))
}

mod cli;
mod logging;
mod spider;

use clap::Parser;
use cli::{Cli, Commands};
use fundos_spider::Config;
use tracing::{error, trace, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = cli.trace.map(Level::from).unwrap_or(Level::INFO);

    // a bad config still needs somewhere to log the failure
    let config = Config::from_env();
    let defaults = Config::default();
    let log_config = config.as_ref().unwrap_or(&defaults);
    logging::init(
        level,
        &log_config.log_dir,
        &log_config.log_prefix,
        !cli.progress,
    )?;

    let config = config.map_err(|err| {
        error!("fatal: {err}");
        err
    })?;
    trace!("command line input recorded: {cli:?}");

    match &cli.command {
        // `fundos run`: scrape the ticker list into the store
        Commands::Run {
            tickers,
            persist,
            dry_run,
        } => spider::run(&config, &cli, tickers.clone(), *persist, *dry_run).await?,

        // `fundos peek <TICKER>`: scrape one page, print it
        Commands::Peek { ticker } => spider::peek(&config, ticker).await?,
    }

    Ok(())
}

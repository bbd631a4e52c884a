mod account;
mod account_store;
mod cli_io;
mod code_generator;
mod config;
mod constants;
mod ledger_engine;
mod logging;
#[cfg(test)]
mod test;
mod transaction;

use anyhow::Context;
use config::EngineConfig;
use ledger_engine::LedgerEngine;

fn main() -> anyhow::Result<()> {
    let cli_options = cli_io::parse_cli()?;
    let config = match &cli_options.config_file {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {}", path))?,
        None => EngineConfig::default(),
    };
    logging::init_logging(&config);

    let mut ledger = LedgerEngine::new(&config);
    ledger.streaming_execute(&cli_options)?;
    Ok(())
}

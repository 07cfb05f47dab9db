use clap::Parser;

use ws_echo::{config::Cli, run_stdio, Result};

fn main() -> Result<()> {
    env_logger::init();

    let config = Cli::parse().into_config()?;
    log::debug!("Running {:?} client against {}", config.encoding, config.url);
    run_stdio(config)
}

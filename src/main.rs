//! voletc CLI entry point.

use clap::Parser;

use voletc::cli::{self, commands, Cli, CliContext};
use voletc::infrastructure::logging::{LogConfig, LoggerImpl};

fn main() {
    let cli = Cli::parse();
    let json = cli.global.json;

    let config = match cli::load_config(&cli.global) {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, json),
    };

    let result = CliContext::new(config, json).and_then(|ctx| commands::dispatch(&ctx, cli.command));

    if let Err(err) = result {
        cli::handle_error(err, json);
    }
}

#[macro_use]
extern crate log;
#[macro_use]
extern crate clap;

mod api;
mod charts;
mod config;
mod data;
mod logger;
mod merge;
mod metrics;
mod models;

use std::error::Error;

fn run(config: &config::Config) -> Result<(), Box<dyn Error>> {
    if config.command.runs_merge() {
        merge::run_merge(config)?;
    }
    if config.command.runs_metrics() {
        metrics::run_metrics(config)?;
    }
    if config.command.runs_server() {
        let state = api::DashboardState::load(config)?;
        api::run(config, state)?;
    }
    Ok(())
}

fn main() {
    let config = match config::load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Unable to load config: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = logger::setup_logger(config.log_level, &config.log_dir) {
        eprintln!("Unable to set up logging in '{}': {}", config.log_dir, err);
        std::process::exit(1);
    }
    info!("Config: {:#?}", config);
    if !config.config_file_loaded {
        info!("No config file loaded, using command line and defaults");
    }

    if let Err(err) = run(&config) {
        error!("{}", err);
        std::process::exit(1);
    }
}

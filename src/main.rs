mod config;
mod despike;
mod manager;
mod output;
mod plot;
mod position;
mod profile;
mod record;
mod spike;
mod stats;
mod vna;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    exp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Process,

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.exp_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Process => mgr.process_experiment()?,
        Command::Clean => mgr.clean_experiment()?,
    }

    Ok(())
}

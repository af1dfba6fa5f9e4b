#[macro_use]
extern crate prettytable;

use std::fs::File;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use sql2doc::config::Config;
use sql2doc::utils::get_sql2doc_version;

use crate::cli::{SubCommand, CLI};

mod cli;
mod commands;

fn progress_bar(hidden: bool) -> anyhow::Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.green/blue}] {pos}/{len} units ({eta})")?
            .progress_chars("#>-"),
    );

    Ok(pb)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = CLI::parse();

    debug!(
        "sql2doc {} with configuration file {:?}",
        get_sql2doc_version(),
        args.config
    );

    let file = File::open(&args.config)?;
    let config: Config = serde_yaml::from_reader(file)?;

    match &args.sub_commands {
        SubCommand::Units => commands::units::list(&config),
        SubCommand::Run(args) => {
            // skip progress when output = true
            let pb = progress_bar(args.output)?;

            let progress_callback = |done: usize, total: usize| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            };

            let report = commands::transfer::run(args, config, progress_callback)?;
            pb.finish_and_clear();

            if !args.output {
                commands::transfer::summary(&report);
            }

            Ok(())
        }
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// sql2doc copies relational tables and queries into document collections, just pass `-h`
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct CLI {
    /// sql2doc configuration file
    #[clap(
        short,
        long,
        parse(from_os_str),
        default_value = "sql2doc.conf",
        value_name = "configuration file"
    )]
    pub config: PathBuf,
    #[clap(subcommand)]
    pub sub_commands: SubCommand,
}

/// sub commands
#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// transfer every work unit -- use `-h` to show all the options
    Run(RunArgs),
    /// list the work units a run would transfer
    Units,
}

/// all run options
#[derive(Args, Debug)]
pub struct RunArgs {
    /// write documents as JSON lines to stdout instead of the configured destination
    #[clap(short, long)]
    pub output: bool,
    /// documents per insert, overrides `destination.batch_size`
    #[clap(short, long, value_name = "documents")]
    pub batch_size: Option<usize>,
}

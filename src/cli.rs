use crate::types::ScanOptions;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pardu")]
#[command(author = "pardu Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Summarize disk usage of directory trees, one task per directory", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Paths to scan (defaults to current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Print the total size in human-readable format (e.g., 1.50K 234.00M 2.00G)
    #[arg(short = 'h', long)]
    pub human_readable: bool,

    /// Block size in bytes; all printed sizes are divided by it
    #[arg(
        short = 'b',
        long,
        value_name = "BYTES",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub block_size: u64,

    /// Display only a total for each argument
    #[arg(short = 's', long)]
    pub summarize: bool,

    /// Maximum number of worker threads (default: one per CPU)
    #[arg(short = 'j', long, value_name = "N", default_value_t = 0)]
    pub jobs: usize,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl From<&Cli> for ScanOptions {
    fn from(cli: &Cli) -> Self {
        ScanOptions {
            summarize: cli.summarize,
            human_readable: cli.human_readable,
            block_size: cli.block_size,
            jobs: cli.jobs,
            verbose: cli.verbose,
        }
    }
}

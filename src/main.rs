mod cli;
mod platform;
mod scanner;
mod types;
mod utils;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use crossbeam_channel::{unbounded, Receiver};
use scanner::Scanner;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use types::{ScanOptions, Summary, Usage};
use utils::{humanize, report_error, to_blocks, write_path};

fn main() {
    let cli = Cli::parse();
    let options = ScanOptions::from(&cli);

    if let Err(e) = run(&cli.paths, &options) {
        report_error(format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(roots: &[PathBuf], options: &ScanOptions) -> Result<()> {
    let scanner = Scanner::from(options);
    let (tx, rx) = unbounded();
    let block_size = options.block_size;

    // Lines are printed by a single thread as tasks complete
    let (summary, printed) = thread::scope(|s| {
        let printer = s.spawn(move || {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_usages(rx, &mut out, block_size)
        });
        let summary = scanner.run(roots, tx);
        (summary, printer.join())
    });

    let summary = summary?;
    match printed {
        Ok(result) => result.context("Failed to write output")?,
        Err(_) => bail!("Output thread panicked"),
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_totals(&mut out, &summary, options).context("Failed to write output")?;
    out.flush()?;

    Ok(())
}

/// Print one `<blocks>\t<path>` line per finished task, in arrival order
fn write_usages(rx: Receiver<Usage>, out: &mut impl Write, block_size: u64) -> io::Result<()> {
    for usage in rx {
        write!(out, "{}\t", to_blocks(usage.size, block_size))?;
        write_path(out, &usage.path)?;
        writeln!(out)?;
    }
    out.flush()
}

fn write_totals(out: &mut impl Write, summary: &Summary, options: &ScanOptions) -> io::Result<()> {
    if options.summarize {
        return writeln!(out, "{}\ttotal", to_blocks(summary.size, options.block_size));
    }

    if options.human_readable {
        writeln!(out, "total size: {}", humanize(summary.size))?;
    } else {
        writeln!(
            out,
            "total size: {}",
            to_blocks(summary.size, options.block_size)
        )?;
    }
    writeln!(out, "total inodes: {}", summary.inodes)
}

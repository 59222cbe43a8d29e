use colored::*;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

const KB: u64 = 1 << 10;
const MB: u64 = 1 << 20;
const GB: u64 = 1 << 30;
const TB: u64 = 1 << 40;

/// Format bytes with a base-1024 unit suffix, e.g. `1.50K` or `512B`
pub fn humanize(bytes: u64) -> String {
    let (unit, suffix) = match bytes {
        b if b >= TB => (TB, "T"),
        b if b >= GB => (GB, "G"),
        b if b >= MB => (MB, "M"),
        b if b >= KB => (KB, "K"),
        _ => return format!("{}B", bytes),
    };

    format!("{:.2}{}", bytes as f64 / unit as f64, suffix)
}

/// Convert bytes to whole blocks, rounding down
pub fn to_blocks(bytes: u64, block_size: u64) -> u64 {
    bytes / block_size.max(1)
}

/// Write a path as its raw bytes, so non-UTF-8 names survive unchanged
#[cfg(unix)]
pub fn write_path(out: &mut impl Write, path: &Path) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    out.write_all(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
pub fn write_path(out: &mut impl Write, path: &Path) -> io::Result<()> {
    write!(out, "{}", path.display())
}

/// Report a non-fatal error on stderr
pub fn report_error(err: impl Display) {
    eprintln!("{} {}", "error:".red().bold(), err);
}

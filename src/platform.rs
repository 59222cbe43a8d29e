use crate::utils::report_error;
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Calculate the size and inode count of a directory recursively.
///
/// Anything that is not a directory counts as a file, using its `lstat`
/// size, so symlinks are counted but never followed. The directory itself
/// adds one inode. An unreadable directory is reported on stderr and
/// contributes `(0, 0)`.
pub fn scan_subtree(path: &Path) -> (u64, u64) {
    let entries = match fs::read_dir(path)
        .with_context(|| format!("cannot read directory {}", path.display()))
    {
        Ok(entries) => entries,
        Err(e) => {
            report_error(format!("{:#}", e));
            return (0, 0);
        }
    };

    let mut size = 0u64;
    let mut inodes = 0u64;

    for entry in entries {
        let entry = match entry
            .with_context(|| format!("cannot read entry in {}", path.display()))
        {
            Ok(e) => e,
            Err(e) => {
                report_error(format!("{:#}", e));
                continue;
            }
        };

        let child = entry.path();
        let metadata = match entry
            .metadata()
            .with_context(|| format!("cannot stat {}", child.display()))
        {
            Ok(m) => m,
            Err(e) => {
                report_error(format!("{:#}", e));
                continue;
            }
        };

        if metadata.is_dir() {
            let (child_size, child_inodes) = scan_subtree(&child);
            size += child_size;
            inodes += child_inodes;
        } else {
            size += metadata.len();
            inodes += 1;
        }
    }

    // the directory itself
    inodes += 1;

    (size, inodes)
}

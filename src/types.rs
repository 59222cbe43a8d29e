use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Size and inode count of one scanned subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub path: PathBuf,
    pub size: u64,
    pub inodes: u64,
}

impl Usage {
    pub fn new(path: PathBuf, size: u64, inodes: u64) -> Self {
        Self { path, size, inodes }
    }
}

/// Running totals shared by every scan task
#[derive(Debug, Default)]
pub struct Totals {
    size: AtomicU64,
    inodes: AtomicU64,
}

impl Totals {
    pub fn add(&self, size: u64, inodes: u64) {
        // Only read back after all tasks have joined.
        self.size.fetch_add(size, Ordering::Relaxed);
        self.inodes.fetch_add(inodes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Summary {
        Summary {
            size: self.size.load(Ordering::Relaxed),
            inodes: self.inodes.load(Ordering::Relaxed),
        }
    }
}

/// Final totals across all roots
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub size: u64,
    pub inodes: u64,
}

/// How results are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub summarize: bool,
    pub human_readable: bool,
    pub block_size: u64,
    pub jobs: usize,
    pub verbose: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            summarize: false,
            human_readable: false,
            block_size: 1,
            jobs: 0,
            verbose: false,
        }
    }
}

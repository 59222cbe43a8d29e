use crate::platform::scan_subtree;
use crate::types::{ScanOptions, Summary, Totals, Usage};
use crate::utils::report_error;
use anyhow::{bail, Context, Result};
use colored::*;
use crossbeam_channel::Sender;
use rayon::{Scope, ThreadPoolBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct Scanner {
    summarize: bool,
    jobs: usize,
    verbose: bool,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            summarize: false,
            jobs: 0,
            verbose: false,
        }
    }

    pub fn with_summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    /// Cap the number of worker threads; `0` lets rayon decide
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Walk every root and compute directory sizes concurrently.
    ///
    /// Each directory found by the walk gets its own task on the worker
    /// pool; finished results are sent on `results` in completion order.
    /// Only root results are folded into the returned totals, since a
    /// root's subtree already contains every nested directory.
    ///
    /// Returns an error as soon as a root cannot be walked at all; later
    /// roots are not attempted. Tasks already spawned still run to
    /// completion before this returns.
    pub fn run(&self, roots: &[PathBuf], results: Sender<Usage>) -> Result<Summary> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("pardu-worker-{}", i))
            .build()
            .context("Failed to build worker pool")?;

        if self.verbose {
            eprintln!(
                "{}",
                format!("Using {} worker threads", pool.current_num_threads()).dimmed()
            );
        }

        let totals = Totals::default();
        pool.scope(|scope| -> Result<()> {
            for root in roots {
                self.walk_root(scope, root, &totals, &results)?;
            }
            Ok(())
        })?;

        Ok(totals.snapshot())
    }

    fn walk_root<'scope>(
        &self,
        scope: &Scope<'scope>,
        root: &Path,
        totals: &'scope Totals,
        results: &'scope Sender<Usage>,
    ) -> Result<()> {
        if self.verbose {
            eprintln!("{} {}", "Scanning".dimmed(), root.display());
        }

        let mut walker = WalkDir::new(root);
        if self.summarize {
            // Only the root's own aggregate is wanted
            walker = walker.max_depth(0);
        }

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    let message = e.to_string();
                    let context = format!("cannot walk {}", root.display());
                    return match e.into_io_error() {
                        Some(io_err) => Err(io_err).context(context),
                        None => bail!("{}: {}", context, message),
                    };
                }
                Err(e) => {
                    report_error(e);
                    continue;
                }
            };

            let is_root = entry.depth() == 0;

            if !entry.file_type().is_dir() {
                // Nested files are covered by the root directory's task
                if is_root {
                    self.count_root_file(entry, totals, results);
                }
                continue;
            }

            let path = entry.into_path();
            if is_root {
                // Summarize mode never lets walkdir open the root itself
                fs::read_dir(&path)
                    .with_context(|| format!("cannot walk {}", root.display()))?;
            }
            scope.spawn(move |_| {
                let (size, inodes) = scan_subtree(&path);
                if is_root {
                    totals.add(size, inodes);
                }
                let _ = results.send(Usage::new(path, size, inodes));
            });
        }

        Ok(())
    }

    fn count_root_file(&self, entry: walkdir::DirEntry, totals: &Totals, results: &Sender<Usage>) {
        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                report_error(e);
                return;
            }
        };

        totals.add(size, 1);
        if self.summarize {
            let _ = results.send(Usage::new(entry.into_path(), size, 1));
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&ScanOptions> for Scanner {
    fn from(options: &ScanOptions) -> Self {
        Scanner::new()
            .with_summarize(options.summarize)
            .with_jobs(options.jobs)
            .with_verbose(options.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::fs;
    use tempfile::TempDir;

    // a/{f1 (100B), b/{f2 (200B)}}
    fn create_sample_tree(base: &Path) -> PathBuf {
        let a = base.join("a");
        let b = a.join("b");
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("f1"), [0u8; 100]).unwrap();
        fs::write(b.join("f2"), [0u8; 200]).unwrap();
        a
    }

    fn run_scanner(scanner: &Scanner, roots: &[PathBuf]) -> (Result<Summary>, Vec<Usage>) {
        let (tx, rx) = unbounded();
        let summary = scanner.run(roots, tx);
        let mut usages: Vec<Usage> = rx.iter().collect();
        usages.sort_by(|x, y| x.path.cmp(&y.path));
        (summary, usages)
    }

    #[test]
    fn test_scanner_reports_every_directory() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());

        let (summary, usages) = run_scanner(&Scanner::new(), &[a.clone()]);
        let summary = summary.unwrap();

        assert_eq!(summary.size, 300);
        assert_eq!(summary.inodes, 4);
        assert_eq!(
            usages,
            vec![
                Usage::new(a.clone(), 300, 4),
                Usage::new(a.join("b"), 200, 2),
            ]
        );
    }

    #[test]
    fn test_scanner_summarize() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());

        let scanner = Scanner::new().with_summarize(true);
        let (summary, usages) = run_scanner(&scanner, &[a.clone()]);

        assert_eq!(summary.unwrap().size, 300);
        assert_eq!(usages, vec![Usage::new(a, 300, 4)]);
    }

    #[test]
    fn test_scanner_multiple_roots() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());
        let c = temp_dir.path().join("c");
        fs::create_dir(&c).unwrap();
        fs::write(c.join("f3"), [0u8; 50]).unwrap();

        let scanner = Scanner::new().with_summarize(true);
        let (summary, usages) = run_scanner(&scanner, &[a.clone(), c.clone()]);
        let summary = summary.unwrap();

        assert_eq!(summary.size, 350);
        assert_eq!(summary.inodes, 6);
        assert_eq!(usages, vec![Usage::new(a, 300, 4), Usage::new(c, 50, 2)]);
    }

    #[test]
    fn test_scanner_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("lonely.bin");
        fs::write(&file, [0u8; 42]).unwrap();

        let (summary, usages) = run_scanner(&Scanner::new(), &[file.clone()]);
        assert_eq!(summary.unwrap(), Summary { size: 42, inodes: 1 });
        assert!(usages.is_empty());

        let scanner = Scanner::new().with_summarize(true);
        let (_, usages) = run_scanner(&scanner, &[file.clone()]);
        assert_eq!(usages, vec![Usage::new(file, 42, 1)]);
    }

    #[test]
    fn test_scanner_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());
        let missing = temp_dir.path().join("does-not-exist");
        let after = temp_dir.path().join("after");
        fs::create_dir(&after).unwrap();

        let (summary, usages) = run_scanner(&Scanner::new(), &[a, missing, after.clone()]);

        let err = summary.unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
        // Roots after the failing one are never walked
        assert!(usages.iter().all(|u| u.path != after));
    }

    #[test]
    fn test_scanner_root_error_is_not_repeated() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let (summary, _) = run_scanner(&Scanner::new(), &[missing]);
        let message = format!("{:#}", summary.unwrap_err());

        assert!(message.starts_with("cannot walk "));
        assert_eq!(message.matches("os error").count(), 1);
    }

    #[test]
    fn test_scanner_bad_root_is_fatal_in_both_modes() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());
        // A path through a regular file cannot be opened, whatever the user
        let bad_root = a.join("f1").join("inner");

        for summarize in [false, true] {
            let scanner = Scanner::new().with_summarize(summarize);
            let (summary, usages) = run_scanner(&scanner, &[bad_root.clone()]);

            assert!(summary.is_err(), "summarize = {}", summarize);
            assert!(usages.is_empty());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_scanner_unreadable_root_is_fatal_in_both_modes() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            eprintln!("skipped: permission bits are not enforced for this user");
            return;
        }

        for summarize in [false, true] {
            let scanner = Scanner::new().with_summarize(summarize);
            let (summary, usages) = run_scanner(&scanner, &[locked.clone()]);

            let message = format!("{:#}", summary.unwrap_err());
            assert!(message.contains("locked"), "summarize = {}", summarize);
            assert!(usages.is_empty());
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_scanner_single_worker_matches_default() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());
        for i in 0..5 {
            let dir = a.join(format!("dir{}", i));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("data"), vec![0u8; 10 * (i + 1)]).unwrap();
        }

        let (default_summary, default_usages) = run_scanner(&Scanner::new(), &[a.clone()]);
        let single = Scanner::new().with_jobs(1);
        let (single_summary, single_usages) = run_scanner(&single, &[a]);

        assert_eq!(default_summary.unwrap(), single_summary.unwrap());
        assert_eq!(default_usages, single_usages);
    }

    #[test]
    fn test_child_sizes_add_up_to_parent() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_sample_tree(temp_dir.path());
        let (_, usages) = run_scanner(&Scanner::new(), &[a.clone()]);

        let parent = usages.iter().find(|u| u.path == a).unwrap();
        let children: u64 = usages
            .iter()
            .filter(|u| u.path.parent() == Some(a.as_path()))
            .map(|u| u.size)
            .sum();

        // f1 is the only direct file of `a`
        assert_eq!(parent.size, children + 100);
    }
}

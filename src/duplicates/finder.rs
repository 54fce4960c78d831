//! Duplicate finder: walk, fingerprint, group, report.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] runs one scan of a directory tree:
//! 1. **Walking**: collect every regular file (see [`crate::scanner::Walker`])
//! 2. **Fingerprinting**: SHA-256 each file on a bounded rayon pool
//! 3. **Grouping**: merge results into a [`DuplicateIndex`] after the pool joins
//! 4. **Reported**: return groups of 2+ files together with every skipped path
//!
//! Finding never deletes anything. Resolution is a separate call, see
//! [`crate::actions::delete_duplicates`].
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let report = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! for group in &report.groups {
//!     println!("{} copies of {}", group.len(), group.kept().path.display());
//! }
//! for skipped in &report.skipped {
//!     eprintln!("skipped: {}", skipped);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::{DuplicateGroup, DuplicateIndex};
use crate::progress::{Phase, ProgressCallback};
use crate::scanner::{
    FileEntry, Fingerprint, Fingerprinter, ReadError, ScanError, Walker, WalkerConfig, BLOCK_SIZE,
};

/// Files larger than this are logged at debug level while hashing.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of worker threads for fingerprinting.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read block size for fingerprinting.
    pub block_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag, honored between files.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("block_size", &self.block_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            block_size: BLOCK_SIZE,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the fingerprinting thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the read block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Regular files discovered by the walk
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Files successfully fingerprinted
    pub fingerprinted_files: usize,
    /// Bytes read while fingerprinting
    pub bytes_hashed: u64,
    /// Distinct fingerprints among fingerprinted files
    pub unique_fingerprints: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Files that a resolve would delete
    pub duplicate_files: usize,
    /// Bytes a resolve would free
    pub reclaimable_space: u64,
    /// Paths skipped because of walk or read errors
    pub skipped_files: usize,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Percentage of scanned bytes held by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }
}

/// Everything a scan produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Duplicate groups, sorted by kept path
    pub groups: Vec<DuplicateGroup>,
    /// Paths left out of grouping, with the reason
    pub skipped: Vec<ScanError>,
    /// Summary counts
    pub summary: ScanSummary,
}

impl ScanReport {
    /// True when no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over `(path, reason)` for every skipped entry.
    pub fn skipped_paths(&self) -> impl Iterator<Item = (&Path, &ScanError)> + '_ {
        self.skipped.iter().map(|e| (e.path(), e))
    }
}

/// Errors that abort a scan before or during its run.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Runs scans with a fixed configuration.
pub struct DuplicateFinder {
    config: FinderConfig,
    fingerprinter: Fingerprinter,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let fingerprinter = Fingerprinter::new().with_block_size(config.block_size);
        Self {
            config,
            fingerprinter,
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all groups of identical files under `root`.
    ///
    /// Per-file problems never abort the scan: unreadable directories and
    /// files end up in [`ScanReport::skipped`].
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory (before any work)
    /// - The scan is interrupted by the shutdown flag
    pub fn find_duplicates(&self, root: &Path) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();

        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Starting duplicate scan of {}", root.display());

        let (files, walk_errors) = self.walk(root);

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut report = self.find_duplicates_from_files(files)?;

        // Walk errors come first: they happened first
        let read_errors = std::mem::take(&mut report.skipped);
        report.skipped = walk_errors;
        report.skipped.extend(read_errors);
        report.summary.skipped_files = report.skipped.len();
        report.summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete in {:.2?}: {} groups, {} duplicates, {} reclaimable, {} skipped",
            report.summary.scan_duration,
            report.summary.duplicate_groups,
            report.summary.duplicate_files,
            report.summary.reclaimable_display(),
            report.summary.skipped_files
        );

        Ok(report)
    }

    /// Fingerprint and group an already collected file list.
    ///
    /// Files keep their given order inside each group.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if the shutdown flag is raised.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let mut report = ScanReport::default();
        report.summary.total_files = files.len();
        report.summary.total_size = files.iter().map(|f| f.size).sum();

        let results = self.fingerprint_files(files);

        if self.config.is_shutdown_requested() {
            log::info!("Fingerprinting interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        self.notify(|cb| cb.on_phase_start(Phase::Grouping, results.len()));

        let mut index = DuplicateIndex::new();
        for (file, result) in results {
            match result {
                Ok((fingerprint, bytes)) => {
                    report.summary.fingerprinted_files += 1;
                    report.summary.bytes_hashed += bytes;
                    index.insert(fingerprint, file);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    report.skipped.push(ScanError::Read(e));
                }
            }
        }

        report.summary.unique_fingerprints = index.unique_count();
        report.groups = index.into_groups();

        for group in &report.groups {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                group.fingerprint_hex(),
                group.len(),
                group.size
            );
            self.notify(|cb| cb.on_group_found(group));
        }

        self.notify(|cb| cb.on_phase_end(Phase::Grouping));

        report.summary.duplicate_groups = report.groups.len();
        report.summary.duplicate_files = report.groups.iter().map(|g| g.duplicate_count()).sum();
        report.summary.reclaimable_space = report.groups.iter().map(|g| g.wasted_space()).sum();
        report.summary.skipped_files = report.skipped.len();
        report.summary.scan_duration = start_time.elapsed();

        self.notify(|cb| {
            cb.on_phase_start(Phase::Reported, report.groups.len());
            cb.on_phase_end(Phase::Reported);
        });

        Ok(report)
    }

    /// Collect files and walk errors under `root`.
    fn walk(&self, root: &Path) -> (Vec<FileEntry>, Vec<ScanError>) {
        self.notify(|cb| {
            cb.on_phase_start(Phase::Walking, 0);
            cb.on_message(&format!("Walking {}", root.display()));
        });

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => errors.push(e),
            }
        }

        self.notify(|cb| cb.on_phase_end(Phase::Walking));

        log::info!(
            "Found {} files ({} total), {} walk errors",
            files.len(),
            ByteSize(files.iter().map(|f| f.size).sum::<u64>()),
            errors.len()
        );

        (files, errors)
    }

    /// Fingerprint every file on a bounded pool.
    ///
    /// Output order matches input order. Files not yet started when the
    /// shutdown flag is raised are left out entirely.
    fn fingerprint_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Vec<(FileEntry, Result<(Fingerprint, u64), ReadError>)> {
        if files.is_empty() {
            log::debug!("No files to fingerprint");
            return Vec::new();
        }

        let total = files.len();
        self.notify(|cb| cb.on_phase_start(Phase::Fingerprinting, total));
        log::info!(
            "Fingerprinting {} files on {} threads",
            total,
            self.config.io_threads
        );

        let completed = AtomicUsize::new(0);
        let work = || {
            files
                .into_par_iter()
                .filter_map(|file| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }

                    if file.size > LARGE_FILE_THRESHOLD {
                        log::debug!(
                            "Hashing large file ({}): {}",
                            ByteSize(file.size),
                            file.path.display()
                        );
                    }

                    let result = self.fingerprinter.fingerprint_counted(&file.path);

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    self.notify(|cb| {
                        if let Ok((ref fingerprint, _)) = result {
                            cb.on_file_fingerprinted(&file.path, fingerprint);
                        }
                        cb.on_progress(done, file.path.to_string_lossy().as_ref());
                    });

                    Some((file, result))
                })
                .collect::<Vec<_>>()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                log::warn!(
                    "Failed to create fingerprint thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                work()
            }
        };

        self.notify(|cb| cb.on_phase_end(Phase::Fingerprinting));
        results
    }

    fn notify(&self, f: impl FnOnce(&dyn ProgressCallback)) {
        if let Some(ref callback) = self.config.progress_callback {
            f(callback.as_ref());
        }
    }
}

//! Duplicate resolution: delete all but the kept file of each group.
//!
//! # Overview
//!
//! [`delete_duplicates`] is the only function in this crate that removes
//! files. It is deliberately separate from scanning: callers get a
//! [`ScanReport`](crate::duplicates::ScanReport), show it, obtain
//! confirmation, and only then resolve.
//!
//! For every group the first member ([`DuplicateGroup::kept`]) survives and
//! every other member is deleted, after these checks:
//! - the kept file must still exist
//! - the candidate must not be the kept file under another name (a
//!   hardlink, or a path through a symlink)
//! - the candidate must be unchanged since the scan (size and mtime)
//! - the candidate must be byte-identical to the kept file (optional,
//!   on by default)
//!
//! A failure affects only the path it concerns; every other path is still
//! processed and the [`ResolveReport`] lists both outcomes.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::actions::{delete_duplicates, DeleteConfig};
//! use dupesweep::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("/data"))
//!     .unwrap();
//! // ... show report.groups and ask the user ...
//! let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);
//! println!("{}", resolved.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;
use crate::scanner::{contents_equal, same_file, FileEntry, ReadError};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan.
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// Byte comparison found the file differs from the kept copy.
    #[error("content differs from kept file {kept}: {path}")]
    ContentMismatch {
        /// Candidate that was not deleted
        path: PathBuf,
        /// File it was compared against
        kept: PathBuf,
    },

    /// Byte comparison could not be completed.
    #[error("could not verify {path}: {source}")]
    Unverified {
        /// Candidate that was not deleted
        path: PathBuf,
        /// Why the comparison failed
        #[source]
        source: ReadError,
    },

    /// The file that should survive is gone, so no copy may be removed.
    #[error("kept file {kept} is missing, not deleting {path}")]
    KeptFileMissing {
        /// Candidate that was not deleted
        path: PathBuf,
        /// Missing kept file
        kept: PathBuf,
    },

    /// Candidate and kept file are one file on disk; removing the
    /// candidate could remove the only copy.
    #[error("{path} is the same file as kept file {kept}")]
    SameFile {
        /// Candidate that was not deleted
        path: PathBuf,
        /// Kept file it resolves to
        kept: PathBuf,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {source}")]
    PermanentDeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// Shutdown was requested before this file was processed.
    #[error("interrupted before deleting {0}")]
    Interrupted(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::Interrupted(p)
            | Self::ContentMismatch { path: p, .. }
            | Self::Unverified { path: p, .. }
            | Self::KeptFileMissing { path: p, .. }
            | Self::SameFile { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    fn from_metadata(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Outcome of resolving a set of duplicate groups.
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Kept file of every processed group.
    pub kept: Vec<PathBuf>,
    /// Successfully deleted files.
    pub deleted: Vec<DeleteResult>,
    /// Files that were not deleted, with the reason.
    pub failed: Vec<(PathBuf, DeleteError)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl ResolveReport {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.deleted.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Total number of attempted deletions.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {}",
                self.success_count(),
                ByteSize(self.bytes_freed)
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                ByteSize(self.bytes_freed)
            )
        }
    }

    fn record_failure(
        &mut self,
        path: &Path,
        error: DeleteError,
        callback: Option<&dyn DeleteProgressCallback>,
    ) {
        log::warn!("Failed to delete {}: {}", path.display(), error);
        if let Some(cb) = callback {
            cb.on_delete_failure(path, &error);
        }
        self.failed.push((path.to_path_buf(), error));
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Move files to the system trash instead of removing them.
    pub use_trash: bool,
    /// Refuse to delete files whose size or mtime changed since the scan.
    pub verify_unchanged: bool,
    /// Compare each file byte for byte with the kept file before deleting.
    pub verify_content: bool,
    /// Optional shutdown flag, checked between files.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            use_trash: false,
            verify_unchanged: true,
            verify_content: true,
            shutdown_flag: None,
        }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            use_trash: true,
            ..Self::default()
        }
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self::default()
    }

    /// Enable/disable the size and mtime check.
    #[must_use]
    pub fn with_verify_unchanged(mut self, verify: bool) -> Self {
        self.verify_unchanged = verify;
        self
    }

    /// Enable/disable byte-for-byte confirmation.
    #[must_use]
    pub fn with_verify_content(mut self, verify: bool) -> Self {
        self.verify_content = verify;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Callback trait for deletion progress reporting.
///
/// `on_delete_success` and `on_delete_failure` are the `FileDeleted` and
/// `FileDeleteFailed` events of a resolve.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &DeleteError);

    /// Called when the resolve completes.
    fn on_complete(&self, report: &ResolveReport);
}

/// File metadata snapshot for change detection.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: Option<SystemTime>,
}

impl FileSnapshot {
    /// Create a snapshot of a file's current state.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or can't be accessed.
    pub fn capture(path: &Path) -> Result<Self, DeleteError> {
        let metadata = fs::metadata(path).map_err(|e| DeleteError::from_metadata(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime: metadata.modified().ok(),
        })
    }

    /// Capture the snapshot a scan recorded for `entry`.
    #[must_use]
    pub fn from_entry(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.clone(),
            size: entry.size,
            mtime: Some(entry.modified),
        }
    }

    /// Verify that the file still matches this snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if file was modified, deleted, or can't be accessed.
    pub fn verify(&self) -> Result<(), DeleteError> {
        let current = Self::capture(&self.path)?;

        if let (Some(orig), Some(curr)) = (self.mtime, current.mtime) {
            if orig != curr {
                log::warn!(
                    "File modified since scan: {} (mtime changed)",
                    self.path.display()
                );
                return Err(DeleteError::Modified(self.path.clone()));
            }
        }

        if self.size != current.size {
            log::warn!(
                "File modified since scan: {} (size changed from {} to {})",
                self.path.display(),
                self.size,
                current.size
            );
            return Err(DeleteError::Modified(self.path.clone()));
        }

        Ok(())
    }
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_metadata(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_metadata(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        match e.kind() {
            io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
            _ => DeleteError::PermanentDeleteFailed {
                path: path.to_path_buf(),
                source: e,
            },
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Validate that a selection doesn't delete all copies.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if all copies would be deleted.
///
/// # Example
///
/// ```
/// use dupesweep::actions::delete::validate_preserves_copy;
/// use std::path::PathBuf;
///
/// let group = vec![
///     PathBuf::from("/original.txt"),
///     PathBuf::from("/copy1.txt"),
///     PathBuf::from("/copy2.txt"),
/// ];
///
/// let selected = vec![PathBuf::from("/copy1.txt"), PathBuf::from("/copy2.txt")];
/// assert!(validate_preserves_copy(&selected, &group).is_ok());
///
/// assert!(validate_preserves_copy(&group, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected_paths: &[PathBuf],
    group_paths: &[PathBuf],
) -> Result<(), DeleteError> {
    use std::collections::HashSet;

    let selected_set: HashSet<&PathBuf> = selected_paths.iter().collect();
    let preserved_count = group_paths
        .iter()
        .filter(|p| !selected_set.contains(p))
        .count();

    if preserved_count == 0 {
        log::error!(
            "Attempted to delete all {} copies of a duplicate group",
            group_paths.len()
        );
        Err(DeleteError::AllCopiesWouldBeDeleted)
    } else {
        log::debug!(
            "Deletion validated: {} files selected, {} preserved",
            selected_paths.len(),
            preserved_count
        );
        Ok(())
    }
}

/// Delete every member of every group except its kept file.
///
/// Never fails as a whole: each path ends up either in
/// [`ResolveReport::deleted`] or in [`ResolveReport::failed`].
pub fn delete_duplicates(
    groups: &[DuplicateGroup],
    config: &DeleteConfig,
    callback: Option<&dyn DeleteProgressCallback>,
) -> ResolveReport {
    let mut report = ResolveReport::default();
    let total: usize = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    let mut index = 0;

    log::info!(
        "Resolving {} groups ({} files to delete, {})",
        groups.len(),
        total,
        if config.use_trash { "trash" } else { "permanent" }
    );

    for group in groups {
        if group.len() < 2 {
            log::debug!("Skipping group with fewer than two members");
            continue;
        }

        let kept = group.kept();
        report.kept.push(kept.path.clone());

        let selected: Vec<PathBuf> = group.duplicates().iter().map(|f| f.path.clone()).collect();
        let group_ok = validate_preserves_copy(&selected, &group.paths()).is_ok();
        // A dangling symlink does not count as a surviving copy
        let kept_present = fs::metadata(&kept.path).is_ok();
        if !kept_present {
            log::warn!("Kept file missing: {}", kept.path.display());
        }

        for candidate in group.duplicates() {
            let path = candidate.path.as_path();

            if config.is_shutdown_requested() {
                report.record_failure(path, DeleteError::Interrupted(path.to_path_buf()), callback);
                continue;
            }

            if let Some(cb) = callback {
                cb.on_before_delete(path, index, total);
            }
            index += 1;

            let outcome = if !group_ok {
                Err(DeleteError::AllCopiesWouldBeDeleted)
            } else if !kept_present {
                Err(DeleteError::KeptFileMissing {
                    path: path.to_path_buf(),
                    kept: kept.path.clone(),
                })
            } else {
                delete_member(kept, candidate, config)
            };

            match outcome {
                Ok(deleted) => {
                    report.bytes_freed += deleted.size;
                    if let Some(cb) = callback {
                        cb.on_delete_success(path, deleted.size);
                    }
                    report.deleted.push(deleted);
                }
                Err(e) => report.record_failure(path, e, callback),
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&report);
    }

    log::info!("{}", report.summary());

    report
}

/// Check and delete one non-kept member.
fn delete_member(
    kept: &FileEntry,
    candidate: &FileEntry,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    let aliased = same_file(&kept.path, &candidate.path)
        .map_err(|e| DeleteError::from_metadata(&candidate.path, e))?;
    if aliased {
        log::warn!(
            "Not deleting {}: same file as {}",
            candidate.path.display(),
            kept.path.display()
        );
        return Err(DeleteError::SameFile {
            path: candidate.path.clone(),
            kept: kept.path.clone(),
        });
    }

    if config.verify_unchanged {
        FileSnapshot::from_entry(candidate).verify()?;
    }

    if config.verify_content {
        let equal = contents_equal(&kept.path, &candidate.path).map_err(|e| {
            DeleteError::Unverified {
                path: candidate.path.clone(),
                source: e,
            }
        })?;
        if !equal {
            log::error!(
                "Fingerprint match but content differs: {} vs {}",
                kept.path.display(),
                candidate.path.display()
            );
            return Err(DeleteError::ContentMismatch {
                path: candidate.path.clone(),
                kept: kept.path.clone(),
            });
        }
    }

    if config.use_trash {
        delete_to_trash(&candidate.path)
    } else {
        permanent_delete(&candidate.path)
    }
}

//! Duplicate groups and the fingerprint index they are built from.
//!
//! # Overview
//!
//! [`DuplicateIndex`] maps each [`Fingerprint`] to the files that produced
//! it, in insertion (walk) order. Once every file has been inserted,
//! [`DuplicateIndex::into_groups`] keeps only the fingerprints shared by two
//! or more files and returns them as [`DuplicateGroup`]s.
//!
//! A group is only final after the whole tree has been indexed: a file's
//! single duplicate may be the last file walked.
//!
//! # Example
//!
//! ```
//! use dupesweep::duplicates::DuplicateIndex;
//! use dupesweep::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let mut index = DuplicateIndex::new();
//! index.insert([1; 32], FileEntry::new(PathBuf::from("/a.txt"), 5, SystemTime::now()));
//! index.insert([1; 32], FileEntry::new(PathBuf::from("/b.txt"), 5, SystemTime::now()));
//! index.insert([2; 32], FileEntry::new(PathBuf::from("/c.txt"), 5, SystemTime::now()));
//!
//! let groups = index.into_groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].kept().path, PathBuf::from("/a.txt"));
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::{fingerprint_to_hex, FileEntry, Fingerprint};

/// Files sharing one content fingerprint.
///
/// Members are in walk order and the first member is the one a resolve
/// keeps. Groups produced by [`DuplicateIndex::into_groups`] always have at
/// least two members.
///
/// Membership is decided by SHA-256 digest alone. A digest collision between
/// different contents is astronomically unlikely but not impossible; the
/// resolver confirms byte equality before deleting unless told otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// SHA-256 of the shared content
    pub fingerprint: Fingerprint,
    /// Size in bytes of each member
    pub size: u64,
    /// Members in walk order
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, files: Vec<FileEntry>) -> Self {
        let size = files.first().map_or(0, |f| f.size);
        Self {
            fingerprint,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The member that survives a resolve.
    ///
    /// # Panics
    ///
    /// Panics on an empty group, which the index never produces.
    #[must_use]
    pub fn kept(&self) -> &FileEntry {
        &self.files[0]
    }

    /// Every member except the kept one.
    #[must_use]
    pub fn duplicates(&self) -> &[FileEntry] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (total - 1 kept).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes reclaimed by deleting every duplicate.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.duplicates().iter().map(|f| f.size).sum()
    }

    /// Fingerprint as hexadecimal string.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        fingerprint_to_hex(&self.fingerprint)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Fingerprint to files map for a single run.
///
/// Insert-only while the run is grouping; consumed by
/// [`DuplicateIndex::into_groups`]. Never persisted.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    entries: HashMap<Fingerprint, Vec<FileEntry>>,
    files: usize,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` has content `fingerprint`.
    pub fn insert(&mut self, fingerprint: Fingerprint, file: FileEntry) {
        self.entries.entry(fingerprint).or_default().push(file);
        self.files += 1;
    }

    /// Number of files inserted.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Number of distinct fingerprints seen.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.entries.len()
    }

    /// Turn the index into its duplicate groups.
    ///
    /// Fingerprints held by a single file are dropped. Members keep their
    /// insertion order; groups are sorted by the path of their kept member,
    /// so output is stable for a given walk order.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .entries
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(fingerprint, files)| DuplicateGroup::new(fingerprint, files))
            .collect();

        groups.sort_by(|a, b| a.kept().path.cmp(&b.kept().path));
        groups
    }
}

impl FromIterator<(Fingerprint, FileEntry)> for DuplicateIndex {
    fn from_iter<I: IntoIterator<Item = (Fingerprint, FileEntry)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (fingerprint, file) in iter {
            index.insert(fingerprint, file);
        }
        index
    }
}

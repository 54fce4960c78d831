//! On-disk file identity.
//!
//! Several paths can name one file: hardlinks share an inode, and with
//! `follow_symlinks` a linked directory exposes the same files a second
//! time. Such paths hold a single copy of the data, so they must never be
//! grouped as duplicates of each other, and deleting one of them in favour
//! of the other can destroy the only copy.
//!
//! On Unix a file is identified by its `(device, inode)` pair. Other
//! platforms fall back to comparing canonical paths in [`same_file`] and
//! treat every walked path as distinct.

use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

/// `(device, inode)` of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    /// Identity from already fetched metadata, if the platform exposes one.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Identity of the file `path` resolves to, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying `stat`.
    pub fn of_path(path: &Path) -> io::Result<Option<Self>> {
        fs::metadata(path).map(|m| Self::from_metadata(&m))
    }
}

/// Remembers which files a walk has already produced.
#[derive(Debug, Default)]
pub struct SeenFiles {
    seen: HashSet<FileId>,
}

impl SeenFiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `metadata` and report whether this is the first path to the file.
    ///
    /// Always `true` where no identity is available.
    pub fn first_sighting(&mut self, metadata: &Metadata) -> bool {
        FileId::from_metadata(metadata).map_or(true, |id| self.seen.insert(id))
    }

    /// Number of distinct files recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// True if `a` and `b` resolve to the same file on disk.
///
/// # Errors
///
/// Returns the first I/O error hit while resolving either path.
pub fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    if let (Some(id_a), Some(id_b)) = (FileId::of_path(a)?, FileId::of_path(b)?) {
        return Ok(id_a == id_b);
    }
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_distinct_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();

        assert!(!same_file(&a, &b).unwrap());
        assert!(same_file(&a, &a).unwrap());

        let mut seen = SeenFiles::new();
        assert!(seen.first_sighting(&fs::metadata(&a).unwrap()));
        assert!(seen.first_sighting(&fs::metadata(&b).unwrap()));
    }

    #[test]
    fn test_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "x").unwrap();

        let err = same_file(&a, &dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_hardlink_seen_once() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("original");
        let link = dir.path().join("link");
        fs::write(&original, "data").unwrap();
        fs::hard_link(&original, &link).unwrap();

        let mut seen = SeenFiles::new();
        assert!(seen.first_sighting(&fs::metadata(&original).unwrap()));
        assert!(!seen.first_sighting(&fs::metadata(&link).unwrap()));
        assert_eq!(seen.len(), 1);
        assert!(same_file(&original, &link).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_resolves_to_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("z.txt");
        let link = dir.path().join("a.txt");
        fs::write(&target, "data").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(same_file(&link, &target).unwrap());
        assert_eq!(
            FileId::of_path(&link).unwrap(),
            FileId::of_path(&target).unwrap()
        );
    }
}

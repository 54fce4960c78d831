use dupesweep::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupesweep::progress::{Phase, ProgressCallback};
use dupesweep::scanner::{Fingerprinter, ReadError, ScanError, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_hello_hello_world() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.txt", b"hello");
    let b = write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "c.txt", b"world");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].paths(), vec![a.clone(), b]);
    assert_eq!(report.groups[0].kept().path, a);
    assert_eq!(
        report.groups[0].fingerprint_hex(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert!(report.skipped.is_empty());
    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.summary.duplicate_files, 1);
    assert_eq!(report.summary.reclaimable_space, 5);
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.groups.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(report.summary.total_files, 0);
}

#[test]
fn test_zero_byte_files_are_duplicates() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert_eq!(report.groups[0].size, 0);
    assert_eq!(
        report.groups[0].fingerprint_hex(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_no_duplicates() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one", b"1");
    write(dir.path(), "two", b"2");
    write(dir.path(), "sub/three", b"3");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(report.summary.unique_fingerprints, 3);
}

#[test]
fn test_duplicates_across_subdirectories() {
    let dir = TempDir::new().unwrap();
    let content = vec![7u8; 200_000];
    write(dir.path(), "z/deep/copy.bin", &content);
    write(dir.path(), "a/copy.bin", &content);
    write(dir.path(), "m.bin", &content);
    write(dir.path(), "other.bin", &content[..199_999]);

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.len(), 3);
    assert_eq!(group.kept().path, dir.path().join("a/copy.bin"));
    assert_eq!(group.wasted_space(), 400_000);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = TempDir::new().unwrap();
    for i in 0..20 {
        write(
            dir.path(),
            &format!("d{}/f{}.txt", i % 4, i),
            format!("content {}", i % 5).as_bytes(),
        );
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(8));
    let first = finder.find_duplicates(dir.path()).unwrap();
    let second = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.groups.len(), 5);
    assert_eq!(first.groups, second.groups);
}

#[test]
fn test_thread_count_does_not_change_result() {
    let dir = TempDir::new().unwrap();
    for i in 0..30 {
        write(
            dir.path(),
            &format!("f{:02}", i),
            format!("{}", i % 7).as_bytes(),
        );
    }

    let single = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(dir.path())
        .unwrap();
    let many = DuplicateFinder::new(FinderConfig::default().with_io_threads(16))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(single.groups, many.groups);
}

#[test]
fn test_block_size_does_not_change_fingerprint() {
    let dir = TempDir::new().unwrap();
    let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    let path = write(dir.path(), "data.bin", &content);

    let default = Fingerprinter::new().fingerprint(&path).unwrap();
    let small = Fingerprinter::new()
        .with_block_size(4096)
        .fingerprint(&path)
        .unwrap();
    let large = Fingerprinter::new()
        .with_block_size(1 << 20)
        .fingerprint(&path)
        .unwrap();

    assert_eq!(default, small);
    assert_eq!(default, large);
}

/// Removes a file between the walk and fingerprinting.
struct RemoveBeforeFingerprinting(PathBuf);

impl ProgressCallback for RemoveBeforeFingerprinting {
    fn on_phase_start(&self, phase: Phase, _total: usize) {
        if phase == Phase::Fingerprinting {
            fs::remove_file(&self.0).unwrap();
        }
    }
    fn on_progress(&self, _current: usize, _path: &str) {}
    fn on_phase_end(&self, _phase: Phase) {}
}

#[test]
fn test_file_vanishing_before_read_is_skipped() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.txt", b"dup");
    let b = write(dir.path(), "b.txt", b"dup");
    let vanished = write(dir.path(), "c.txt", b"dup");
    let x = write(dir.path(), "x.txt", b"other");
    let y = write(dir.path(), "y.txt", b"other");

    let config = FinderConfig::default()
        .with_progress_callback(Arc::new(RemoveBeforeFingerprinting(vanished.clone())));
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.total_files, 5);
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(
        &report.skipped[0],
        ScanError::Read(ReadError::NotFound(p)) if *p == vanished
    ));

    // The scan carried on past the failure
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups[0].paths(), vec![a, b]);
    assert_eq!(report.groups[1].paths(), vec![x, y]);
}

#[cfg(unix)]
#[test]
fn test_hardlinks_are_not_duplicates() {
    let dir = TempDir::new().unwrap();
    let original = write(dir.path(), "original.bin", b"one copy on disk");
    fs::hard_link(&original, dir.path().join("second_name.bin")).unwrap();
    write(dir.path(), "copy.bin", b"a real copy");
    write(dir.path(), "copy2.bin", b"a real copy");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.groups.len(), 1);
    assert!(!report.groups[0].paths().contains(&original));
    assert_eq!(report.summary.reclaimable_space, 11);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", b"same");
    write(dir.path(), "b.txt", b"same");
    let secret = write(dir.path(), "secret.txt", b"same");
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can still read it; nothing to test then.
    if fs::File::open(&secret).is_ok() {
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert!(!report.groups[0].paths().contains(&secret));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path(), secret.as_path());
    assert!(report.skipped[0].is_read_error());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", b"x");
    write(dir.path(), "b.txt", b"x");
    let locked = dir.path().join("locked");
    write(&locked, "inner.txt", b"x");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert!(report
        .skipped
        .iter()
        .any(|e| matches!(e, ScanError::PermissionDenied(_))));
}

#[test]
fn test_ignore_patterns_exclude_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "keep1.txt", b"data");
    write(dir.path(), "keep2.txt", b"data");
    write(dir.path(), "skip.tmp", b"data");

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(
        false,
        false,
        vec!["*.tmp".to_string()],
    ));
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_invalid_roots() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "file.txt", b"x");
    let finder = DuplicateFinder::with_defaults();

    assert!(matches!(
        finder.find_duplicates(&dir.path().join("missing")),
        Err(FinderError::PathNotFound(_))
    ));
    assert!(matches!(
        finder.find_duplicates(&file),
        Err(FinderError::NotADirectory(_))
    ));
}

#[test]
fn test_interrupted_scan() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a", b"x");
    write(dir.path(), "b", b"x");

    let config = FinderConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let result = DuplicateFinder::new(config).find_duplicates(dir.path());

    assert!(matches!(result, Err(FinderError::Interrupted)));
    assert!(dir.path().join("a").exists());
}

use dupesweep::actions::{delete_duplicates, DeleteConfig, DeleteError};
use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
use dupesweep::scanner::WalkerConfig;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
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
fn test_resolve_hello_hello_world() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.txt", b"hello");
    let b = write(dir.path(), "b.txt", b"hello");
    let c = write(dir.path(), "c.txt", b"world");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    // Finding alone never deletes
    assert!(b.exists());

    let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);

    assert!(resolved.all_succeeded());
    assert_eq!(resolved.kept, vec![a.clone()]);
    assert_eq!(resolved.deleted.len(), 1);
    assert_eq!(resolved.deleted[0].path, b);
    assert_eq!(resolved.bytes_freed, 5);
    assert!(a.exists());
    assert!(!b.exists());
    assert!(c.exists());
}

#[test]
fn test_exactly_kept_members_remain() {
    let dir = TempDir::new().unwrap();
    let mut all = Vec::new();
    for i in 0..12 {
        all.push(write(
            dir.path(),
            &format!("g{}/copy{}.dat", i % 3, i),
            format!("payload {}", i % 4).as_bytes(),
        ));
    }
    let unique = write(dir.path(), "unique.dat", b"only one");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(report.groups.len(), 4);

    let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);
    assert!(resolved.all_succeeded());
    assert_eq!(resolved.deleted.len(), 8);

    let remaining: Vec<&PathBuf> = all.iter().filter(|p| p.exists()).collect();
    assert_eq!(remaining.len(), 4);
    for group in &report.groups {
        assert!(group.kept().path.exists());
        for dup in group.duplicates() {
            assert!(!dup.path.exists());
        }
    }
    assert!(unique.exists());

    // Nothing left to find
    let rescan = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(rescan.is_empty());
}

#[test]
fn test_resolve_reports_failures_and_continues() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a1", b"first");
    let a2 = write(dir.path(), "a2", b"first");
    write(dir.path(), "b1", b"second");
    let b2 = write(dir.path(), "b2", b"second");
    let b3 = write(dir.path(), "b3", b"second");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    // Change one file after the scan
    fs::write(&a2, b"changed after scan").unwrap();
    // Remove another
    fs::remove_file(&b2).unwrap();

    let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);

    assert_eq!(resolved.failed.len(), 2);
    assert_eq!(resolved.deleted.len(), 1);
    assert_eq!(resolved.deleted[0].path, b3);
    assert!(a2.exists());

    let reasons: Vec<&DeleteError> = resolved.failed.iter().map(|(_, e)| e).collect();
    assert!(reasons.iter().any(|e| matches!(e, DeleteError::Modified(_))));
    assert!(reasons.iter().any(|e| matches!(e, DeleteError::NotFound(_))));
}

#[test]
fn test_resolve_detects_same_size_rewrite() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a", b"same");
    let b = write(dir.path(), "b", b"same");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    // Same length, new mtime
    fs::write(&b, b"diff").unwrap();
    filetime::set_file_mtime(&b, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);

    assert!(matches!(resolved.failed[0].1, DeleteError::Modified(_)));
    assert!(b.exists());

    // Without the staleness check the byte comparison still refuses
    let config = DeleteConfig::default().with_verify_unchanged(false);
    let resolved = delete_duplicates(&report.groups, &config, None);
    assert!(matches!(
        resolved.failed[0].1,
        DeleteError::ContentMismatch { .. }
    ));
    assert!(b.exists());
}

#[test]
fn test_resolve_never_deletes_without_kept_file() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"same");
    let b = write(dir.path(), "b", b"same");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    fs::remove_file(&a).unwrap();

    let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);

    assert!(resolved.deleted.is_empty());
    assert!(matches!(
        resolved.failed[0].1,
        DeleteError::KeptFileMissing { .. }
    ));
    assert!(b.exists());
}

#[cfg(unix)]
#[test]
fn test_followed_directory_link_keeps_only_copy() {
    let dir = TempDir::new().unwrap();
    let real = write(dir.path(), "z/only.txt", b"precious");
    let twin = write(dir.path(), "z/twin.txt", b"twin");
    write(dir.path(), "y/twin.txt", b"twin");
    std::os::unix::fs::symlink(dir.path().join("z"), dir.path().join("a_link")).unwrap();

    let config =
        FinderConfig::default().with_walker_config(WalkerConfig::new(true, false, Vec::new()));
    let report = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    // a_link/only.txt and z/only.txt are one file, not a duplicate pair
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);

    let resolved = delete_duplicates(&report.groups, &DeleteConfig::default(), None);
    assert!(resolved.all_succeeded());
    assert_eq!(fs::read(&real).unwrap(), b"precious");
    assert_eq!(fs::read(dir.path().join("a_link/only.txt")).unwrap(), b"precious");

    // The surviving twin is readable under some name
    let survivors = [dir.path().join("a_link/twin.txt"), twin, dir.path().join("y/twin.txt")];
    assert!(survivors.iter().any(|p| fs::read(p).map_or(false, |c| c == b"twin")));
}

#[test]
fn test_resolve_empty_groups() {
    let resolved = delete_duplicates(&[], &DeleteConfig::default(), None);
    assert!(resolved.all_succeeded());
    assert_eq!(resolved.total_count(), 0);
    assert!(resolved.kept.is_empty());
}

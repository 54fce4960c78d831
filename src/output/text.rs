//! Plain-text report for terminals.
//!
//! ```text
//! Group 1: 2 files, 5 B each (2cf24dba5fb0)
//!   keep  /data/a.txt
//!   dup   /data/b.txt
//!
//! Skipped 1 path:
//!   /data/secret: Permission denied: /data/secret
//!
//! 3 files scanned (15 B) in 4ms
//! 1 duplicate group, 1 redundant file, 5 B reclaimable (33.3%)
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::actions::ResolveReport;
use crate::duplicates::ScanReport;

/// Number of fingerprint hex digits shown per group.
const SHORT_FINGERPRINT: usize = 12;

/// Writes human-readable scan and resolve reports.
pub struct TextOutput<'a> {
    report: &'a ScanReport,
}

impl<'a> TextOutput<'a> {
    /// Wrap a finished scan for printing.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Write groups, skipped paths and the summary.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (i, group) in self.report.groups.iter().enumerate() {
            let hex = group.fingerprint_hex();
            writeln!(
                writer,
                "Group {}: {} files, {} each ({})",
                i + 1,
                group.len(),
                ByteSize(group.size),
                &hex[..SHORT_FINGERPRINT]
            )?;
            writeln!(writer, "  keep  {}", group.kept().path.display())?;
            for file in group.duplicates() {
                writeln!(writer, "  dup   {}", file.path.display())?;
            }
            writeln!(writer)?;
        }

        if !self.report.skipped.is_empty() {
            writeln!(
                writer,
                "Skipped {} {}:",
                self.report.skipped.len(),
                plural(self.report.skipped.len(), "path", "paths")
            )?;
            for (path, reason) in self.report.skipped_paths() {
                writeln!(writer, "  {}: {}", path.display(), reason)?;
            }
            writeln!(writer)?;
        }

        let summary = &self.report.summary;
        writeln!(
            writer,
            "{} {} scanned ({}) in {:.2?}",
            summary.total_files,
            plural(summary.total_files, "file", "files"),
            summary.total_size_display(),
            summary.scan_duration
        )?;

        if self.report.is_empty() {
            writeln!(writer, "No duplicates found")
        } else {
            writeln!(
                writer,
                "{} duplicate {}, {} redundant {}, {} reclaimable ({:.1}%)",
                summary.duplicate_groups,
                plural(summary.duplicate_groups, "group", "groups"),
                summary.duplicate_files,
                plural(summary.duplicate_files, "file", "files"),
                summary.reclaimable_display(),
                summary.wasted_percentage()
            )
        }
    }
}

/// Write the outcome of a resolve: failures first, then the summary line.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_resolve<W: Write>(writer: &mut W, report: &ResolveReport) -> io::Result<()> {
    for (path, error) in &report.failed {
        writeln!(writer, "  not deleted  {}: {}", path.display(), error)?;
    }
    writeln!(writer, "{}", report.summary())
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}

//! Progress reporting and run events.
//!
//! [`ProgressCallback`] is how the scan pipeline makes its state observable
//! without knowing how anything is displayed: phase transitions, per-file
//! progress, and the `FileFingerprinted` / `GroupFound` events.
//! Deletion events go through [`DeleteProgressCallback`].
//!
//! [`Progress`] implements both traits with indicatif progress bars for
//! terminal output.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::actions::delete::{DeleteError, DeleteProgressCallback, ResolveReport};
use crate::duplicates::DuplicateGroup;
use crate::scanner::Fingerprint;

/// Stages of a single run, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Discovering files under the root.
    Walking,
    /// Computing content fingerprints.
    Fingerprinting,
    /// Building the digest-to-paths index.
    Grouping,
    /// Groups are final and have been handed to the caller.
    Reported,
    /// Deleting all but the kept member of each group.
    Resolving,
    /// Run complete.
    Done,
}

impl Phase {
    /// Short lowercase name, used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Fingerprinting => "fingerprinting",
            Self::Grouping => "grouping",
            Self::Reported => "reported",
            Self::Resolving => "resolving",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callback for the scan pipeline.
///
/// Implementations must be thread-safe: per-file notifications arrive from
/// the fingerprinting worker pool.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - The phase being entered
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: Phase, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: Phase);

    /// A file was fingerprinted successfully.
    fn on_file_fingerprinted(&self, _path: &Path, _fingerprint: &Fingerprint) {}

    /// A final duplicate group was found.
    fn on_group_found(&self, _group: &DuplicateGroup) {}

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    fingerprinting: Mutex<Option<ProgressBar>>,
    resolving: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupesweep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            fingerprinting: Mutex::new(None),
            resolving: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: Phase) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            Phase::Walking => Some(&self.walking),
            Phase::Fingerprinting => Some(&self.fingerprinting),
            Phase::Resolving => Some(&self.resolving),
            _ => None,
        }
    }

    /// Run `f` on the most recently started bar still active.
    fn with_active_bar(&self, f: impl FnOnce(&ProgressBar)) {
        for slot in [&self.resolving, &self.fingerprinting, &self.walking] {
            if let Ok(guard) = slot.lock() {
                if let Some(ref pb) = *guard {
                    f(pb);
                    return;
                }
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: Phase, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            Phase::Walking => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            Phase::Fingerprinting | Phase::Resolving => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message(if phase == Phase::Resolving {
                    "Deleting"
                } else {
                    "Fingerprinting"
                });
                pb
            }
            _ => return,
        };

        if let Some(slot) = self.slot(phase) {
            if let Ok(mut guard) = slot.lock() {
                *guard = Some(pb);
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let msg = truncate_path(path, 30);
        self.with_active_bar(|pb| {
            pb.set_position(current as u64);
            pb.set_message(msg);
        });
    }

    fn on_phase_end(&self, phase: Phase) {
        if self.quiet {
            return;
        }

        if let Some(slot) = self.slot(phase) {
            if let Some(pb) = slot.lock().ok().and_then(|mut guard| guard.take()) {
                pb.finish_with_message(format!("{} complete", phase));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_active_bar(|pb| pb.set_message(message.to_string()));
    }
}

impl DeleteProgressCallback for Progress {
    fn on_before_delete(&self, path: &Path, index: usize, _total: usize) {
        self.on_progress(index + 1, path.to_string_lossy().as_ref());
    }

    fn on_delete_success(&self, _path: &Path, _size: u64) {}

    fn on_delete_failure(&self, path: &Path, error: &DeleteError) {
        if !self.quiet {
            self.with_active_bar(|pb| pb.println(format!("Failed: {}: {}", path.display(), error)));
        }
    }

    fn on_complete(&self, _report: &ResolveReport) {
        self.on_phase_end(Phase::Resolving);
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if file_name.len() >= max_len {
        let tail: String = file_name
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}

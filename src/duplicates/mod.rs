//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The per-run fingerprint index ([`DuplicateIndex`])
//! - Duplicate groups and their kept member ([`DuplicateGroup`])
//! - The scan pipeline ([`DuplicateFinder`])

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanReport, ScanSummary};
pub use groups::{DuplicateGroup, DuplicateIndex};

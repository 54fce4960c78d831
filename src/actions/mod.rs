//! File actions module.
//!
//! Resolving a scan means deleting every member of each duplicate group
//! except its kept file. Nothing here runs during a scan; callers invoke
//! [`delete_duplicates`] explicitly once the report has been reviewed.
//!
//! - Permanent deletion (default)
//! - Move to system trash (optional, recoverable)
//! - Change detection and byte-for-byte confirmation before each delete
//!
//! ```no_run
//! use dupesweep::actions::delete::{delete_duplicates, DeleteConfig};
//!
//! let report = delete_duplicates(&[], &DeleteConfig::trash(), None);
//! assert!(report.all_succeeded());
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    delete_duplicates, delete_to_trash, permanent_delete, validate_preserves_copy, DeleteConfig,
    DeleteError, DeleteProgressCallback, DeleteResult, FileSnapshot, ResolveReport,
};

//! Output formatters for scan and resolve results.
//!
//! - [`text`]: human-readable listing for terminals
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::DuplicateFinder;
//! use dupesweep::error::ExitCode;
//! use dupesweep::output::{JsonOutput, TextOutput};
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let report = DuplicateFinder::with_defaults().find_duplicates(root).unwrap();
//!
//! TextOutput::new(&report).write_to(&mut std::io::stdout()).unwrap();
//!
//! let output = JsonOutput::new(root, &report, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::{JsonOutput, JsonOutputError};
pub use text::{write_resolve, TextOutput};

//! Logging setup.
//!
//! The library logs through the `log` facade only. `run_app` installs an
//! `env_logger` backend writing to stderr, so `--output json` keeps stdout
//! machine-readable.
//!
//! Level resolution, first match wins:
//!
//! 1. `RUST_LOG`, parsed as an `env_logger` filter string
//! 2. `--quiet` (errors only)
//! 3. `-v` (debug) / `-vv` (trace)
//! 4. info

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Install the stderr logger.
///
/// Later calls are ignored, since a process can only own one logger.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    let filter = std::env::var("RUST_LOG").ok();

    match filter.as_deref() {
        Some(directives) => {
            builder.parse_filters(directives);
        }
        None => {
            builder.filter_level(level_for(verbose, quiet));
        }
    }
    set_format(&mut builder, verbose > 0 || cfg!(debug_assertions), verbose > 0);

    if builder.try_init().is_ok() {
        log::debug!(
            "Logger ready (level {}, source {})",
            current_level_name(),
            if filter.is_some() { "RUST_LOG" } else { "flags" }
        );
    }
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Release builds print `LEVEL message`; debug builds and `-v` add a
/// timestamp, and `-v` also adds the module path.
fn set_format(builder: &mut Builder, timestamps: bool, module_path: bool) {
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if timestamps {
            let timestamp = buf.timestamp_seconds();
            write!(buf, "{} ", timestamp)?;
        }
        write!(buf, "{style}{:<5}{style:#} ", record.level())?;
        if module_path {
            write!(buf, "[{}] ", record.module_path().unwrap_or("?"))?;
        }
        writeln!(buf, "{}", record.args())
    });
}

/// Name of the currently active maximum log level.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

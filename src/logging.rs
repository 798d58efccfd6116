//! Structured logging setup.
//!
//! Engine functions take a `&Logger`; the CLI builds a terminal logger on
//! stderr, tests and library callers can pass a discarding one.

use slog::{Drain, Level, Logger};

/// Create a slog logger that writes to stderr.
///
/// `verbose` lowers the threshold from Info to Debug.
pub fn terminal_logger(verbose: bool) -> Logger {
    let level = if verbose { Level::Debug } else { Level::Info };

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();
    Logger::root(drain, slog::o!())
}

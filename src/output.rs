//! Output functions for consistent message formatting.

use colored::Colorize;

const MARK_SUCCESS: &str = "✓";
const MARK_WARNING: &str = "!";
const MARK_INFO: &str = "ℹ";
const MARK_BULLET: &str = "•";

/// Print success message: "✓ {message}" in green
pub fn success(message: &str) {
    println!("{} {}", MARK_SUCCESS.green(), message);
}

/// Print warning message: "! {message}" in yellow
pub fn warning(message: &str) {
    println!("{} {}", MARK_WARNING.yellow().bold(), message);
}

/// Print info message: "ℹ {message}" in blue
pub fn info(message: &str) {
    println!("{} {}", MARK_INFO.blue(), message);
}

/// Print indented item: "  • {message}"
pub fn bullet(message: &str) {
    println!("  {} {}", MARK_BULLET, message);
}

/// A hash in the standard style
pub fn print_hash(hash: &str) -> String {
    format!("{}", hash.yellow())
}

/// A count in the standard style
pub fn print_count(n: usize) -> String {
    format!("{}", n.to_string().bold())
}

//! Color helpers for CLI output.
//!
//! All coloring respects `NO_COLOR` env var automatically via the `colored` crate.

use colored::Colorize;

/// Returns a colored rendering of a config value.
///
/// Empty values (keys a template expects but nobody set) are shown dimmed.
pub fn colorize_value(value: &str) -> colored::ColoredString {
    if value.is_empty() {
        "(unset)".dimmed()
    } else {
        value.normal()
    }
}

/// Field label: bold name followed by a dim colon.
pub fn label(name: &str) -> String {
    format!("{}{}", name.bold(), ":".dimmed())
}


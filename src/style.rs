//! Terminal styling for status output.
//!
//! Every helper returns a new string wrapped in ANSI colour codes. `colored`
//! honours NO_COLOR / CLICOLOR, so piping output through these is harmless.

use colored::Colorize;

/// Success markers such as `DONE!`.
pub fn ok(s: &str) -> String {
    s.green().to_string()
}

pub fn warn(s: &str) -> String {
    s.yellow().to_string()
}

/// Fatal or failed steps.
pub fn fata(s: &str) -> String {
    s.red().to_string()
}

pub fn info(s: &str) -> String {
    s.cyan().to_string()
}

/// Names coming back from the bucket (environments, files).
pub fn teal(s: &str) -> String {
    s.truecolor(0, 128, 128).to_string()
}

/// Headings. Left uncoloured.
pub fn white(s: &str) -> String {
    s.normal().to_string()
}

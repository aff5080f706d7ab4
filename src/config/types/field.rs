//! Type-safe config field path.

use crate::logger::styled;
use owo_colors::Style;
use std::fmt;

/// A type-safe wrapper for config field paths.
///
/// Each section exposes its paths as associated constants so diagnostics
/// never drift from the TOML layout.
///
/// # Example
///
/// ```ignore
/// impl WorkerConfig {
///     pub const COMMAND: FieldPath = FieldPath::new("worker.command");
/// }
///
/// diag.error(WorkerConfig::COMMAND, "must not be empty");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&styled(format!("`{}`", self.0), Style::new().bright_blue()))
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

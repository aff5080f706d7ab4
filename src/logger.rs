//! Logging utilities with colored output.
//!
//! - `log!` prints a message with a colored module prefix
//! - `debug!` prints only when `--verbose` is set
//! - `debug_do!` runs a block only when `--verbose` is set
//!
//! # Example
//!
//! ```ignore
//! log!("render"; "{} chunks rendered", count);
//! debug!("cache"; "hit {}", key);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream, Style};
use parking_lot::Mutex;
use std::{
    fmt,
    io::{Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Serializes output so concurrent render tasks never interleave a line.
static OUTPUT: Mutex<()> = Mutex::new(());

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Execute code only when --verbose is enabled
///
/// Use this to avoid computing expensive debug data when not needed.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// Goes to stderr: stdout is reserved for command output such as
/// `prerender render` markup.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let _guard = OUTPUT.lock();
    let mut out = stderr().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let style = match module_lower {
        "build" | "render" => Style::new().bright_blue(),
        "cache" => Style::new().bright_green(),
        "error" => Style::new().bright_red(),
        _ => Style::new().bright_yellow(),
    };
    styled(format!("[{module}]"), style.bold())
}

/// `value` in `style` when stderr takes colors.
///
/// Honors `--color` through `owo_colors::set_override`.
pub fn styled(value: impl fmt::Display, style: Style) -> String {
    value
        .if_supports_color(Stream::Stderr, |v| v.style(style))
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

//! `[worker]` section configuration.
//!
//! Controls the process each render runs in.
//!
//! # Example
//!
//! ```toml
//! [worker]
//! command = ["node", "$PRERENDER_WORKER"]   # Program and arguments
//! react = "react"                           # Module with createElement
//! server = "react-dom/server"               # Module with renderToString
//! timeout = 30000                           # ms per render, 0 = none
//! jobs = 8                                  # Concurrent workers, 0 = unbounded
//! ```
//!
//! Available variables in `command`:
//!
//! - `$PRERENDER_WORKER` - path of the generated worker script
//! - `$PRERENDER_ROOT` - project root
//! - `$PRERENDER_CACHE_DIR` - cache directory

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Command and arguments to spawn. Supports `$PRERENDER_*` variables.
    pub command: Vec<String>,

    /// Module resolved by the worker for element creation.
    pub react: String,

    /// Module resolved by the worker for string serialization.
    pub server: String,

    /// Upper bound for one render exchange in milliseconds (0 = none).
    pub timeout: u64,

    /// Maximum number of worker processes alive at once (0 = unbounded).
    pub jobs: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: vec!["node".into(), "$PRERENDER_WORKER".into()],
            react: "react".into(),
            server: "react-dom/server".into(),
            timeout: 0,
            jobs: 0,
        }
    }
}

impl WorkerConfig {
    pub const COMMAND: FieldPath = FieldPath::new("worker.command");
    pub const REACT: FieldPath = FieldPath::new("worker.react");
    pub const SERVER: FieldPath = FieldPath::new("worker.server");

    /// Timeout as a duration, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_millis(self.timeout))
    }

    /// Job limit, `None` when unbounded.
    pub fn jobs(&self) -> Option<usize> {
        (self.jobs > 0).then_some(self.jobs)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match self.command.first() {
            None => diag.error_with_hint(
                Self::COMMAND,
                "must not be empty",
                "use [\"node\", \"$PRERENDER_WORKER\"]",
            ),
            Some(program) if program.trim().is_empty() => {
                diag.error(Self::COMMAND, "program name must not be blank");
            }
            Some(_) => {
                if !self.command.iter().any(|arg| arg.contains("$PRERENDER_WORKER")) {
                    diag.warn(
                        Self::COMMAND,
                        "does not reference $PRERENDER_WORKER; the worker script will not run",
                    );
                }
            }
        }
        if self.react.trim().is_empty() {
            diag.error(Self::REACT, "module name must not be empty");
        }
        if self.server.trim().is_empty() {
            diag.error(Self::SERVER, "module name must not be empty");
        }
    }
}

//! Worker command construction.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use rustc_hash::FxHashMap;
use tokio::process::Command;

// ============================================================================
// Variables
// ============================================================================

/// Build `$PRERENDER_*` variables for the worker command.
pub fn worker_vars(worker: &Path, root: &Path, cache_dir: &Path) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert("PRERENDER_WORKER".into(), worker.display().to_string());
    vars.insert("PRERENDER_ROOT".into(), root.display().to_string());
    vars.insert("PRERENDER_CACHE_DIR".into(), cache_dir.display().to_string());
    vars
}

/// Resolve `$PRERENDER_*` variables in command arguments
///
/// Longer names are substituted first so a variable never clobbers another
/// that it prefixes.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut ordered: Vec<_> = vars.iter().collect();
    ordered.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in &ordered {
                let pattern = format!("${key}");
                result = result.replace(&pattern, value);
            }
            result
        })
        .collect()
}

// ============================================================================
// Command
// ============================================================================

/// A resolved worker command line.
#[derive(Debug, Clone, Default)]
pub struct WorkerCommand {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl WorkerCommand {
    /// Create from a command array (e.g. `["node", "worker.js"]`).
    pub fn from_slice<S: AsRef<str>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter().map(|s| OsString::from(s.as_ref()));
        Self {
            program: iter.next().unwrap_or_default(),
            args: iter.collect(),
            ..Default::default()
        }
    }

    /// Create from a configured template, substituting `vars`.
    ///
    /// The variables are also exported to the worker's environment.
    pub fn from_template(template: &[String], vars: &FxHashMap<String, String>) -> Self {
        let mut cmd = Self::from_slice(&resolve_args(template, vars));
        cmd.envs = vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        cmd.envs.sort();
        cmd
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program name, for logging.
    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Process builder with piped stdio that is killed when dropped.
    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

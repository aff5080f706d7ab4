//! Embedded static resources.
//!
//! The render worker is a small node script. `build.rs` minifies it into
//! `OUT_DIR`; at runtime the module names are injected and the result is
//! written next to the cache under a content fingerprint, so concurrent
//! passes and different configs never overwrite each other's worker.

mod template;

pub use template::{Template, TemplateVars};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::utils::hash;

/// Variables for worker.js.
pub struct WorkerVars<'a> {
    /// Module providing `createElement` / `isValidElement`.
    pub react: &'a str,
    /// Module providing `renderToString`.
    pub server: &'a str,
}

impl TemplateVars for WorkerVars<'_> {
    fn apply(&self, content: &str) -> String {
        content
            .replace("__PRERENDER_REACT__", &js_string(self.react))
            .replace("__PRERENDER_SERVER__", &js_string(self.server))
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".into())
}

/// Render worker script.
pub const WORKER_JS: Template<WorkerVars<'static>> =
    Template::new(include_str!(concat!(env!("OUT_DIR"), "/worker.min.js")));

/// Write the rendered worker into `dir`, returning its path.
///
/// The filename carries a fingerprint of the content; an existing file with
/// the same name is reused as-is.
pub fn write_worker(dir: &Path, vars: &WorkerVars<'_>) -> io::Result<PathBuf> {
    let script = WORKER_JS.render(vars);
    let path = dir.join(format!("worker-{}.js", hash::fingerprint(&script)));

    if path.exists() {
        return Ok(path);
    }

    fs::create_dir_all(dir)?;
    // Write-then-rename so a concurrent reader never sees a partial script.
    let tmp = path.with_extension(format!("js.{}.tmp", std::process::id()));
    fs::write(&tmp, script)?;
    fs::rename(&tmp, &path)?;

    crate::debug!("worker"; "wrote {}", path.display());
    Ok(path)
}

//! Turning a module's source into markup.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;

use super::RenderError;
use super::command::{WorkerCommand, worker_vars};
use super::protocol::{RenderRequest, RequestOptions};
use super::worker::render_in_worker;
use crate::config::PrerenderConfig;
use crate::embed::{WorkerVars, write_worker};

/// Settings every evaluation of a pass shares.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalContext {
    /// Values merged into the module's global scope.
    pub globals: Map<String, Value>,
    /// Document header, passed along for evaluators that want it.
    pub html_header: String,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            globals: Map::new(),
            html_header: "<!DOCTYPE html>".into(),
        }
    }
}

/// Renders one module's source to serialized markup.
///
/// Header injection and post-render transforms are not the evaluator's job;
/// callers apply them to the returned markup.
///
/// Implementations must be independent per call: nothing observable may leak
/// from one evaluation into the next.
pub trait Evaluate: Send + Sync + 'static {
    fn evaluate(
        &self,
        asset: &str,
        source: String,
        context: &EvalContext,
    ) -> impl Future<Output = Result<String, RenderError>> + Send;
}

/// Evaluates every module in its own worker process.
pub struct IsolatedEvaluator {
    command: WorkerCommand,
    timeout: Option<Duration>,
    jobs: Option<Arc<Semaphore>>,
}

impl IsolatedEvaluator {
    pub fn new(command: WorkerCommand) -> Self {
        Self {
            command,
            timeout: None,
            jobs: None,
        }
    }

    /// Build an evaluator from configuration, writing the worker script into
    /// the cache directory.
    pub fn from_config(config: &PrerenderConfig) -> Result<Self> {
        let worker = write_worker(
            &config.cache.dir,
            &WorkerVars {
                react: &config.worker.react,
                server: &config.worker.server,
            },
        )
        .with_context(|| format!("failed to write worker into {}", config.cache.dir.display()))?;

        let vars = worker_vars(&worker, config.get_root(), &config.cache.dir);
        let command = WorkerCommand::from_template(&config.worker.command, &vars).cwd(config.get_root());

        let mut evaluator = Self::new(command);
        if let Some(timeout) = config.worker.timeout() {
            evaluator = evaluator.with_timeout(timeout);
        }
        if let Some(jobs) = config.worker.jobs() {
            evaluator = evaluator.with_jobs(jobs);
        }
        Ok(evaluator)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cap the number of worker processes alive at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(Arc::new(Semaphore::new(jobs.max(1))));
        self
    }

    /// Render `source` (named `asset`) in a fresh worker.
    pub async fn render(
        &self,
        asset: &str,
        source: &str,
        context: &EvalContext,
    ) -> Result<String, RenderError> {
        let _permit = match &self.jobs {
            Some(jobs) => jobs.acquire().await.ok(),
            None => None,
        };

        let request = RenderRequest {
            asset_name: asset,
            source,
            options: RequestOptions {
                globals: &context.globals,
                html_header: &context.html_header,
            },
        };
        render_in_worker(&self.command, &request, self.timeout).await
    }
}

impl Evaluate for IsolatedEvaluator {
    fn evaluate(
        &self,
        asset: &str,
        source: String,
        context: &EvalContext,
    ) -> impl Future<Output = Result<String, RenderError>> + Send {
        async move { self.render(asset, &source, context).await }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::render::RenderCause;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn evaluator(dir: &Path, body: &str) -> IsolatedEvaluator {
        let path = dir.join("worker.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        IsolatedEvaluator::new(
            WorkerCommand::from_slice(&["sh".to_owned(), path.display().to_string()]).cwd(dir),
        )
    }

    const DOCUMENT_WORKER: &str = r#"read -r request
echo '{"exports":[{"name":"default","kind":"component"}]}'
read -r command
echo '{"renderedFile":"<html data-reactroot=\"\"><body>hi</body></html>"}'"#;

    #[tokio::test]
    async fn test_markup_is_returned_as_serialized() {
        let dir = TempDir::new().unwrap();
        let evaluator = evaluator(dir.path(), DOCUMENT_WORKER);

        let markup = evaluator
            .evaluate("index.js", "ignored".into(), &EvalContext::default())
            .await
            .unwrap();
        assert_eq!(markup, r#"<html data-reactroot=""><body>hi</body></html>"#);
    }

    #[tokio::test]
    async fn test_context_is_sent_with_request() {
        let dir = TempDir::new().unwrap();
        let evaluator = evaluator(
            dir.path(),
            r#"read -r request
printf '%s\n' "$request" > request.json
echo '{"error":{"message":"stop here"}}'"#,
        );
        let mut context = EvalContext {
            html_header: "<!doctype html>".into(),
            ..Default::default()
        };
        context.globals.insert("title".into(), Value::from("Docs"));

        let err = evaluator.render("index.js", "src", &context).await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::Render { cause: RenderCause::Script { ref name, .. }, .. } if name == "Error"
        ));

        let sent: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("request.json")).unwrap())
                .unwrap();
        assert_eq!(sent["source"], "src");
        assert_eq!(sent["options"]["globals"]["title"], "Docs");
        assert_eq!(sent["options"]["htmlHeader"], "<!doctype html>");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_jobs_limit_still_renders_everything() {
        let dir = TempDir::new().unwrap();
        let evaluator = Arc::new(evaluator(dir.path(), DOCUMENT_WORKER).with_jobs(1));

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let evaluator = Arc::clone(&evaluator);
                tokio::spawn(async move {
                    evaluator
                        .render(&format!("{i}.js"), "", &EvalContext::default())
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().starts_with("<html"));
        }
        assert_eq!(evaluator.jobs.as_ref().unwrap().available_permits(), 1);
    }

    #[test]
    fn test_from_config_writes_worker() {
        let dir = TempDir::new().unwrap();
        let mut config = PrerenderConfig::default();
        config.root = dir.path().to_path_buf();
        config.cache.dir = dir.path().join("cache");
        config.worker.timeout = 5000;
        config.worker.jobs = 2;

        let evaluator = IsolatedEvaluator::from_config(&config).unwrap();
        assert_eq!(evaluator.command.program(), "node");
        let script = Path::new(&evaluator.command.args()[0]);
        assert!(script.starts_with(dir.path().join("cache")));
        assert!(script.exists());
        assert_eq!(evaluator.timeout, Some(Duration::from_millis(5000)));
        assert_eq!(evaluator.jobs.as_ref().unwrap().available_permits(), 2);
    }

    // ========================================================================
    // node worker
    // ========================================================================

    const STUB_REACT: &str = r#"
exports.createElement = (type, props) => ({ $$typeof: "element", type, props: props || {} });
exports.isValidElement = value => !!value && value.$$typeof === "element";
"#;

    const STUB_SERVER: &str = r#"
exports.renderToString = element =>
  typeof element.type === "function" ? String(element.type(element.props)) : "<" + element.type + "/>";
"#;

    fn has_node() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }

    /// Evaluator running the embedded worker under node, against stub
    /// `react` and `react-dom/server` modules in `dir`.
    fn node_evaluator(dir: &Path) -> IsolatedEvaluator {
        fs::write(dir.join("stub-react.js"), STUB_REACT).unwrap();
        fs::write(dir.join("stub-server.js"), STUB_SERVER).unwrap();

        let mut config = PrerenderConfig::default();
        config.root = dir.to_path_buf();
        config.cache.dir = dir.join("cache");
        config.worker.react = "./stub-react.js".into();
        config.worker.server = "./stub-server.js".into();
        config.worker.timeout = 10_000;
        IsolatedEvaluator::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_node_worker_renders_default_export_with_globals() {
        if !has_node() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let evaluator = node_evaluator(dir.path());
        let mut context = EvalContext::default();
        context.globals.insert("title".into(), Value::from("Docs"));

        let source = r#"module.exports = { default: () => "<html><body>" + title + "</body></html>" };"#;
        let markup = evaluator.render("home.js", source, &context).await.unwrap();
        assert_eq!(markup, "<html><body>Docs</body></html>");
    }

    #[tokio::test]
    async fn test_node_worker_renders_sole_named_export() {
        if !has_node() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let evaluator = node_evaluator(dir.path());

        let source = r#"exports.Page = () => "<p>named</p>";"#;
        let markup = evaluator
            .render("page.js", source, &EvalContext::default())
            .await
            .unwrap();
        assert_eq!(markup, "<p>named</p>");
    }

    #[tokio::test]
    async fn test_node_worker_reports_ambiguous_exports() {
        if !has_node() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let evaluator = node_evaluator(dir.path());

        let source = r#"exports.Header = () => "h"; exports.Footer = () => "f";"#;
        match evaluator.render("parts.js", source, &EvalContext::default()).await {
            Err(RenderError::AmbiguousComponent { asset, exports }) => {
                assert_eq!(asset, "parts.js");
                assert_eq!(exports, ["Header", "Footer"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_node_worker_reports_thrown_error() {
        if !has_node() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let evaluator = node_evaluator(dir.path());

        let source = r#"throw new TypeError("window.matchMedia is not a function");"#;
        let err = evaluator
            .render("broken.js", source, &EvalContext::default())
            .await
            .unwrap_err();
        match &err {
            RenderError::Render { asset, cause: RenderCause::Script { name, message, .. } } => {
                assert_eq!(asset, "broken.js");
                assert_eq!(name, "TypeError");
                assert_eq!(message, "window.matchMedia is not a function");
            }
            other => panic!("expected script error, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "File broken.js gave an error: window.matchMedia is not a function"
        );
    }
}

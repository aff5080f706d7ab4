//! The render pass over a compilation.
//!
//! ```text
//! Idle ─► Selecting ─► Rendering { in_flight } ─► Finalizing ─► Idle
//! ```
//!
//! Every eligible chunk's entry script is rendered on its own task. Outcomes
//! are applied to the compilation in chunk order once each task finishes;
//! a failed unit leaves its assets untouched and is recorded as a
//! [`UnitError`].

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::{RUNTIME_CHUNK, RenderOptions, Selection};
use crate::asset::{Asset, Chunk, Compilation, UnitError};
use crate::cache::RenderCache;
use crate::config::PrerenderConfig;
use crate::render::{EvalContext, Evaluate, IsolatedEvaluator, RenderCause, RenderError};
use crate::utils::hash::combined_hash;
use crate::utils::plural_count;
use crate::{debug, log};

/// Where a pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Selecting,
    Rendering { in_flight: usize },
    Finalizing,
}

/// Unit counts of a finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Units rendered by the evaluator.
    pub rendered: usize,
    /// Units served from the cache.
    pub cached: usize,
    pub failed: usize,
}

impl PassReport {
    pub fn succeeded(&self) -> usize {
        self.rendered + self.cached
    }
}

/// One eligible chunk and its entry script.
struct Unit {
    chunk: usize,
    entry: String,
}

/// A unit's markup, and whether it came from the cache.
struct Rendered {
    markup: String,
    cached: bool,
}

/// Renders a compilation's chunks to markup.
///
/// The evaluator only serializes; header injection and post-render
/// transforms from [`RenderOptions`] are applied here, before caching.
pub struct Prerender<E> {
    evaluator: Arc<E>,
    options: Arc<RenderOptions>,
    context: Arc<EvalContext>,
    cache: Option<Arc<RenderCache>>,
    state: Mutex<PassState>,
}

impl Prerender<IsolatedEvaluator> {
    /// Pipeline with worker processes, options and cache from configuration.
    pub fn from_config(config: &PrerenderConfig) -> Result<Self> {
        let options = RenderOptions::from_config(config)?;
        let evaluator = IsolatedEvaluator::from_config(config)?;
        let cache = RenderCache::new(&config.cache.dir, config.cache.ttl());
        Ok(Self::new(evaluator, options).with_cache(cache))
    }
}

impl<E: Evaluate> Prerender<E> {
    pub fn new(evaluator: E, options: RenderOptions) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            context: Arc::new(options.context()),
            options: Arc::new(options),
            cache: None,
            state: Mutex::new(PassState::Idle),
        }
    }

    /// Attach a content cache. It is consulted only when `options.cache` is set.
    pub fn with_cache(mut self, cache: RenderCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn state(&self) -> PassState {
        *self.state.lock()
    }

    fn set_state(&self, state: PassState) {
        *self.state.lock() = state;
    }

    /// Run one pass over `compilation`, then call `done` exactly once.
    ///
    /// Never fails as a whole: unit failures land in `compilation.errors`.
    pub async fn additional_assets(
        &self,
        compilation: &mut Compilation,
        done: impl FnOnce(&PassReport),
    ) -> PassReport {
        self.set_state(PassState::Selecting);
        let units = self.select(compilation);
        let runtime = runtime_source(compilation);
        let settings = self.options.fingerprint();

        let mut report = PassReport::default();
        let mut tasks = Vec::with_capacity(units.len());
        for unit in units {
            let chunk = &compilation.chunks[unit.chunk];
            match compilation.assets.get(&unit.entry) {
                Some(asset) => {
                    let source = with_runtime(runtime.as_deref(), &asset.text());
                    let hash = combined_hash(&[
                        chunk.hash.as_str(),
                        runtime.as_deref().unwrap_or(""),
                        settings.as_str(),
                    ]);
                    let task = self.spawn(unit.entry.clone(), hash, source);
                    tasks.push((unit, task));
                }
                None => {
                    report.failed += 1;
                    compilation.errors.push(UnitError {
                        chunk: chunk.name.clone(),
                        asset: unit.entry.clone(),
                        error: RenderError::MissingAsset { asset: unit.entry },
                    });
                }
            }
        }

        let mut in_flight = tasks.len();
        self.set_state(PassState::Rendering { in_flight });
        for (unit, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(_) => Err(RenderError::render(&unit.entry, RenderCause::Panicked)),
            };
            in_flight -= 1;
            self.set_state(PassState::Rendering { in_flight });

            match outcome {
                Ok(rendered) => {
                    if rendered.cached {
                        report.cached += 1;
                    } else {
                        report.rendered += 1;
                    }
                    self.apply(compilation, &unit, rendered.markup);
                }
                Err(error) => {
                    report.failed += 1;
                    let chunk = compilation.chunks[unit.chunk].name.clone();
                    log!("error"; "chunk `{}`: {}", chunk, error);
                    compilation.errors.push(UnitError {
                        chunk,
                        asset: unit.entry,
                        error,
                    });
                }
            }
        }

        self.set_state(PassState::Finalizing);
        debug!(
            "render";
            "{} rendered, {} cached, {} failed",
            plural_count(report.rendered, "unit"),
            report.cached,
            report.failed
        );
        done(&report);
        self.set_state(PassState::Idle);
        report
    }

    /// Eligible chunks that have an entry script, in chunk order.
    fn select(&self, compilation: &Compilation) -> Vec<Unit> {
        let selection: Selection = self.options.selection();
        compilation
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| selection.is_eligible(&chunk.name))
            .filter_map(|(index, chunk)| match chunk.entry_file() {
                Some(entry) => Some(Unit {
                    chunk: index,
                    entry: entry.to_owned(),
                }),
                None => {
                    debug!("render"; "chunk `{}` has no entry script, skipped", chunk.name);
                    None
                }
            })
            .collect()
    }

    /// Render one unit on its own task. `hash` identifies everything that
    /// shapes the unit's final markup.
    fn spawn(&self, entry: String, hash: String, source: String) -> JoinHandle<Result<Rendered, RenderError>> {
        let evaluator = Arc::clone(&self.evaluator);
        let options = Arc::clone(&self.options);
        let context = Arc::clone(&self.context);
        let cache = self.cache.clone().filter(|_| self.options.cache);

        tokio::spawn(async move {
            let render = async {
                let markup = evaluator.evaluate(&entry, source, &context).await?;
                Ok::<_, RenderError>(options.finish(markup))
            };

            let Some(cache) = cache else {
                let markup = render.await?;
                return Ok(Rendered { markup, cached: false });
            };

            let mut computed = false;
            let markup = cache
                .get_or_compute(&entry, &hash, || {
                    computed = true;
                    render
                })
                .await?;
            Ok::<_, RenderError>(Rendered {
                markup,
                cached: !computed,
            })
        })
    }

    /// Swap the unit's entry script for its markup.
    fn apply(&self, compilation: &mut Compilation, unit: &Unit, markup: String) {
        let html = html_name(&unit.entry);
        debug!("render"; "{} -> {}", unit.entry, html);

        compilation.assets.insert(&html, Asset::from_text(markup));
        compilation.chunks[unit.chunk].replace_file(&unit.entry, html);
        if !self.options.keep_js_file {
            compilation.assets.remove(&unit.entry);
        }
    }
}

/// The runtime script's text: the `runtime` chunk's entry when the build
/// has one, otherwise the first script named like a runtime.
fn runtime_source(compilation: &Compilation) -> Option<String> {
    let from_chunk = compilation
        .chunks
        .iter()
        .filter(|chunk| chunk.name == RUNTIME_CHUNK)
        .find_map(Chunk::entry_file)
        .and_then(|file| Some((file, compilation.assets.get(file)?)));
    let (name, asset) = from_chunk.or_else(|| compilation.assets.find(is_runtime_script))?;

    debug!("render"; "runtime prefix from {}", name);
    Some(asset.text().into_owned())
}

/// `runtime~main.js`, `static/runtime.3f2a.js`; never maps or other assets.
fn is_runtime_script(name: &str) -> bool {
    let file = name.rsplit('/').next().unwrap_or(name);
    file.contains("runtime") && file.contains(".js") && !file.ends_with(".map")
}

/// Entry source with the runtime prepended.
fn with_runtime(runtime: Option<&str>, source: &str) -> String {
    match runtime {
        Some(runtime) => format!("{runtime}\n{source}"),
        None => source.to_owned(),
    }
}

/// `pages/home.js` → `pages/home.html`; the last extension is replaced.
pub fn html_name(asset: &str) -> String {
    let file_start = asset.rfind('/').map_or(0, |i| i + 1);
    let stem = match asset[file_start..].rfind('.') {
        Some(dot) => &asset[..file_start + dot],
        None => asset,
    };
    format!("{stem}.html")
}

//! Library-level render options.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use super::Selection;
use crate::config::{PostRenderRule, PrerenderConfig};
use crate::render::{EvalContext, PostRender, document};
use crate::utils::hash::hex_digest;

/// Options for one [`Prerender`](super::Prerender). Every field is optional.
#[derive(Clone)]
pub struct RenderOptions {
    /// Values merged into each evaluation's global scope.
    pub globals: Map<String, Value>,
    /// Prefix for documents whose markup starts with `<html`.
    pub html_header: String,
    /// Chunks to render; empty renders all.
    pub chunks: Vec<String>,
    /// Chunks never rendered, on top of `runtime`.
    pub excluded_chunks: Vec<String>,
    /// Markup transforms, applied in order.
    pub post_render: Vec<PostRender>,
    pub keep_js_file: bool,
    pub cache: bool,
    /// Folded into every cache hash. Transforms are opaque, so set this
    /// whenever `post_render` changes behavior without changing length.
    pub cache_salt: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            globals: Map::new(),
            html_header: "<!DOCTYPE html>".into(),
            chunks: Vec::new(),
            excluded_chunks: Vec::new(),
            post_render: Vec::new(),
            keep_js_file: false,
            cache: true,
            cache_salt: String::new(),
        }
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("globals", &self.globals)
            .field("html_header", &self.html_header)
            .field("chunks", &self.chunks)
            .field("excluded_chunks", &self.excluded_chunks)
            .field("post_render", &self.post_render.len())
            .field("keep_js_file", &self.keep_js_file)
            .field("cache", &self.cache)
            .field("cache_salt", &self.cache_salt)
            .finish()
    }
}

impl RenderOptions {
    /// Options from the `[render]` section, compiling its post-render rules.
    pub fn from_config(config: &PrerenderConfig) -> Result<Self> {
        let render = &config.render;
        let post_render =
            document::compile_rules(&render.post_render).context("invalid render.post_render rule")?;
        Ok(Self {
            globals: render.globals.clone(),
            html_header: render.html_header.clone(),
            chunks: render.chunks.clone(),
            excluded_chunks: render.excluded_chunks.clone(),
            post_render,
            keep_js_file: render.keep_js_file,
            cache: render.cache,
            cache_salt: rules_salt(&render.post_render),
        })
    }

    pub fn selection(&self) -> Selection {
        Selection::new(&self.chunks, &self.excluded_chunks)
    }

    /// Append a markup transform.
    pub fn post_render(mut self, f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        self.post_render.push(Arc::new(f));
        self
    }

    /// Settings handed to the evaluator for every unit.
    pub fn context(&self) -> EvalContext {
        EvalContext {
            globals: self.globals.clone(),
            html_header: self.html_header.clone(),
        }
    }

    /// Header injection and post-render transforms over serialized markup.
    pub fn finish(&self, markup: String) -> String {
        document::finish(markup, &self.html_header, &self.post_render)
    }

    /// Identity of every setting besides the script that shapes the final
    /// markup. Changes to any of them invalidate cached artifacts.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.html_header.as_bytes());
        hasher.update(&[0]);
        hasher.update(&serde_json::to_vec(&self.globals).unwrap_or_default());
        hasher.update(&[0]);
        hasher.update(&(self.post_render.len() as u64).to_le_bytes());
        hasher.update(self.cache_salt.as_bytes());
        hex_digest(&hasher)
    }
}

/// Text identifying configured rules, for [`RenderOptions::cache_salt`].
fn rules_salt(rules: &[PostRenderRule]) -> String {
    rules
        .iter()
        .map(|rule| format!("{}\0{}\0", rule.find, rule.replace))
        .collect()
}

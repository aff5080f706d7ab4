//! `[render]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [render]
//! html_header = "<!DOCTYPE html>"   # Prefixed to markup starting with <html
//! chunks = ["home", "about"]        # Only these chunks (empty = all)
//! excluded_chunks = ["vendor"]      # Never these ("runtime" is implied)
//! keep_js_file = false              # Keep the script next to its html
//! cache = true                      # Reuse results across builds
//!
//! [render.globals]                  # Injected into every evaluation
//! title = "My site"
//!
//! [[render.post_render]]            # Applied to markup, in order
//! find = "data-reactroot=\"\""
//! replace = ""
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Prefix for documents whose markup starts with `<html`.
    pub html_header: String,

    /// Chunk names to render. Empty renders every chunk.
    pub chunks: Vec<String>,

    /// Chunk names never rendered.
    pub excluded_chunks: Vec<String>,

    /// Keep the original script asset after rendering.
    pub keep_js_file: bool,

    /// Enable the content cache.
    pub cache: bool,

    /// Values merged into the global scope of each evaluation.
    pub globals: serde_json::Map<String, serde_json::Value>,

    /// Regex replacements applied to rendered markup.
    pub post_render: Vec<PostRenderRule>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            html_header: "<!DOCTYPE html>".into(),
            chunks: Vec::new(),
            excluded_chunks: Vec::new(),
            keep_js_file: false,
            cache: true,
            globals: serde_json::Map::new(),
            post_render: Vec::new(),
        }
    }
}

impl RenderConfig {
    pub const CHUNKS: FieldPath = FieldPath::new("render.chunks");
    pub const EXCLUDED_CHUNKS: FieldPath = FieldPath::new("render.excluded_chunks");
    pub const POST_RENDER: FieldPath = FieldPath::new("render.post_render");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.chunks.iter().any(|name| name.trim().is_empty()) {
            diag.warn(Self::CHUNKS, "blank chunk names are ignored");
        }
        if self.excluded_chunks.iter().any(|name| name.trim().is_empty()) {
            diag.warn(Self::EXCLUDED_CHUNKS, "blank chunk names are ignored");
        }
        for rule in &self.post_render {
            if rule.find.is_empty() {
                diag.error(Self::POST_RENDER, "`find` must not be empty");
            } else if let Err(err) = rule.compile() {
                diag.error_with_hint(
                    Self::POST_RENDER,
                    format!("invalid pattern `{}`", rule.find),
                    err.to_string(),
                );
            }
        }
    }
}

/// A find/replace rule applied to rendered markup.
///
/// `replace` supports `$1` / `${name}` capture references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostRenderRule {
    pub find: String,
    pub replace: String,
}

impl PostRenderRule {
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.find)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_render_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.render.html_header, "<!DOCTYPE html>");
        assert!(config.render.chunks.is_empty());
        assert!(config.render.cache);
        assert!(!config.render.keep_js_file);
        assert!(config.render.globals.is_empty());
    }

    #[test]
    fn test_render_config_globals_table() {
        let config = test_parse_config(
            "[render.globals]\ntitle = \"Docs\"\n[render.globals.navigator]\nuserAgent = \"bot\"",
        );
        assert_eq!(config.render.globals["title"], "Docs");
        assert_eq!(config.render.globals["navigator"]["userAgent"], "bot");
    }

    #[test]
    fn test_post_render_rules_keep_order() {
        let config = test_parse_config(
            "[[render.post_render]]\nfind = \"a\"\nreplace = \"b\"\n\
             [[render.post_render]]\nfind = \"b\"\nreplace = \"c\"",
        );
        let finds: Vec<_> = config.render.post_render.iter().map(|r| r.find.as_str()).collect();
        assert_eq!(finds, ["a", "b"]);
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let config = test_parse_config("[[render.post_render]]\nfind = \"(unclosed\"");
        let mut diag = ConfigDiagnostics::new();
        config.render.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(diag.errors()[0].hint.is_some());
    }

    #[test]
    fn test_blank_chunk_names_warn() {
        let config = test_parse_config("[render]\nchunks = [\"home\", \" \"]");
        let mut diag = ConfigDiagnostics::new();
        config.render.validate(&mut diag);
        assert!(diag.is_empty());
        assert_eq!(diag.warnings().len(), 1);
    }
}

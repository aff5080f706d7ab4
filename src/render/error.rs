//! Render failure types.

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Why a unit could not be rendered.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The module exports nothing usable, or several things and no component default.
    #[error("{asset} must have a default or just one component (found: {})", ExportList(.exports))]
    AmbiguousComponent { asset: String, exports: Vec<String> },

    #[error("File {asset} gave an error: {cause}")]
    Render {
        asset: String,
        #[source]
        cause: RenderCause,
    },

    /// The chunk names an entry file the asset set does not contain.
    #[error("{asset} is listed by its chunk but missing from the output")]
    MissingAsset { asset: String },
}

impl RenderError {
    pub fn render(asset: impl Into<String>, cause: RenderCause) -> Self {
        Self::Render {
            asset: asset.into(),
            cause,
        }
    }

    /// Asset the failure belongs to.
    pub fn asset(&self) -> &str {
        match self {
            Self::AmbiguousComponent { asset, .. }
            | Self::Render { asset, .. }
            | Self::MissingAsset { asset } => asset,
        }
    }
}

/// Underlying failure of a render.
#[derive(Debug, Error)]
pub enum RenderCause {
    /// The module threw while evaluating or serializing.
    #[error("{message}")]
    Script {
        name: String,
        message: String,
        stack: Option<String>,
    },

    #[error("failed to start worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("worker i/o failed: {0}")]
    Io(#[source] io::Error),

    #[error("malformed worker message: {0}")]
    Protocol(#[source] serde_json::Error),

    #[error("worker exited ({status}) without a result{}", StderrTail(.stderr))]
    Exited { status: ExitStatus, stderr: String },

    #[error("worker timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("render task panicked")]
    Panicked,
}

struct ExportList<'a>(&'a [String]);

impl fmt::Display for ExportList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no exports");
        }
        f.write_str(&self.0.join(", "))
    }
}

struct StderrTail<'a>(&'a str);

impl fmt::Display for StderrTail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = self.0.trim();
        if tail.is_empty() {
            Ok(())
        } else {
            write!(f, ": {tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_render_error_prefixes_asset() {
        let err = RenderError::render(
            "home.js",
            RenderCause::Script {
                name: "TypeError".into(),
                message: "window.foo is not a function".into(),
                stack: None,
            },
        );
        assert_eq!(
            err.to_string(),
            "File home.js gave an error: window.foo is not a function"
        );
        assert_eq!(err.asset(), "home.js");

        let source = err.source().unwrap().downcast_ref::<RenderCause>().unwrap();
        assert!(matches!(source, RenderCause::Script { name, .. } if name == "TypeError"));
    }

    #[test]
    fn test_ambiguous_lists_exports() {
        let err = RenderError::AmbiguousComponent {
            asset: "about.js".into(),
            exports: vec!["Header".into(), "Footer".into()],
        };
        assert_eq!(
            err.to_string(),
            "about.js must have a default or just one component (found: Header, Footer)"
        );

        let empty = RenderError::AmbiguousComponent {
            asset: "empty.js".into(),
            exports: vec![],
        };
        assert!(empty.to_string().ends_with("(found: no exports)"));
    }

    #[test]
    fn test_timeout_display() {
        let cause = RenderCause::Timeout(Duration::from_millis(1500));
        assert_eq!(cause.to_string(), "worker timed out after 1500ms");
    }
}

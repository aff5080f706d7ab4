//! Export classification.
//!
//! A rendered module must expose exactly one thing to render: a component
//! default, or a single export of any kind.

use serde::{Deserialize, Serialize};

/// What the worker found behind an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Callable: a function or class component.
    Component,
    /// An already-created element.
    Element,
    /// A thenable resolving to either of the above.
    Promise,
    /// Anything else.
    Value,
}

/// One named export of an evaluated module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub name: String,
    pub kind: ExportKind,
}

impl ExportInfo {
    pub fn new(name: impl Into<String>, kind: ExportKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Outcome of [`classify_exports`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportChoice {
    /// Render the component default.
    Default,
    /// Render the only export.
    Sole(String),
    AmbiguousEmpty,
    AmbiguousMultiple,
}

impl ExportChoice {
    /// Export name to render, `None` when ambiguous.
    pub fn export_name(&self) -> Option<&str> {
        match self {
            Self::Default => Some("default"),
            Self::Sole(name) => Some(name),
            Self::AmbiguousEmpty | Self::AmbiguousMultiple => None,
        }
    }
}

/// Pick the export to render.
pub fn classify_exports(exports: &[ExportInfo]) -> ExportChoice {
    let has_component_default = exports
        .iter()
        .any(|e| e.name == "default" && e.kind == ExportKind::Component);

    match exports {
        _ if has_component_default => ExportChoice::Default,
        [] => ExportChoice::AmbiguousEmpty,
        [only] => ExportChoice::Sole(only.name.clone()),
        _ => ExportChoice::AmbiguousMultiple,
    }
}

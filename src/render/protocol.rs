//! Messages exchanged with a worker process.
//!
//! Newline-delimited JSON over the worker's stdin/stdout, one exchange per
//! process:
//!
//! ```text
//! -> {"assetName", "source", "options": {"globals", "htmlHeader"}}
//! <- {"exports": [{"name", "kind"}]}        | {"error": {...}}
//! -> {"render": "<export>"}
//! <- {"renderedFile": "<markup>"}            | {"error": {...}}
//! ```
//!
//! `htmlHeader` travels with the request for workers that want it; the
//! header itself is applied after the exchange.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RenderCause;
use super::exports::ExportInfo;

/// First message: the module to evaluate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest<'a> {
    pub asset_name: &'a str,
    pub source: &'a str,
    pub options: RequestOptions<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions<'a> {
    pub globals: &'a Map<String, Value>,
    pub html_header: &'a str,
}

/// Second message: which export to render.
#[derive(Debug, Serialize)]
pub struct RenderCommand<'a> {
    pub render: &'a str,
}

/// Reply to [`RenderRequest`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExportsReply {
    Exports { exports: Vec<ExportInfo> },
    Error { error: ScriptError },
}

/// Reply to [`RenderCommand`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RenderReply {
    Rendered {
        #[serde(rename = "renderedFile")]
        rendered_file: String,
    },
    Error {
        error: ScriptError,
    },
}

/// An exception raised inside the worker.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScriptError {
    pub name: Option<String>,
    pub message: String,
    pub stack: Option<String>,
}

impl From<ScriptError> for RenderCause {
    fn from(err: ScriptError) -> Self {
        RenderCause::Script {
            name: err.name.unwrap_or_else(|| "Error".into()),
            message: err.message,
            stack: err.stack,
        }
    }
}

/// Serialize `message` as one protocol line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    Ok(line)
}

//! Isolated module evaluation.
//!
//! | Module      | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `command`   | Worker command line and `$PRERENDER_*` variables |
//! | `document`  | Header injection and post-render transforms      |
//! | `error`     | `RenderError` / `RenderCause`                    |
//! | `evaluator` | `Evaluate` trait, process-backed evaluator      |
//! | `exports`   | Choosing the export to render                    |
//! | `protocol`  | Worker wire messages                             |
//! | `worker`    | One-shot process exchange                        |

mod command;
pub mod document;
mod error;
mod evaluator;
pub mod exports;
pub mod protocol;
mod worker;

pub use command::{WorkerCommand, resolve_args, worker_vars};
pub use document::PostRender;
pub use error::{RenderCause, RenderError};
pub use evaluator::{EvalContext, Evaluate, IsolatedEvaluator};
pub use exports::{ExportChoice, ExportInfo, ExportKind, classify_exports};
pub use worker::render_in_worker;

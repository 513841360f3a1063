//! # Stamped Errors
//!
//! Catalog-driven error values with layered debug context, captured call
//! sites and masked public messages.
//!
//! ## Design Philosophy
//!
//! 1. **Errors are declared once** as [`ErrorDefinition`]s: code, string code,
//!    category, message template, masking and formatting policy
//! 2. **Error sites only supply arguments**; everything else is stamped from
//!    the definition into a [`WrappedError`]
//! 3. **Debug data travels with the call**, not with the error: each layer of
//!    a call chain attaches key/value data to its [`Context`], and the error
//!    snapshots the merged view when it is created
//! 4. **Masking is presentation, not data loss**: the public message can hide
//!    internals while [`WrappedError::render_actual`] and the
//!    [`InternalLog`] keep the full detail for operators
//!
//! ## Concurrency
//!
//! Contexts and their data layers are immutable and shared through `Arc`.
//! Many call chains can derive from one parent concurrently; no branch ever
//! observes another branch's attachments, and the data path takes no locks.
//!
//! ## Quick Start
//!
//! ```rust
//! use stamped_errors::{Context, ErrorDefinition, Result, Value, error_data};
//!
//! let query_failed = ErrorDefinition::new(500, "QueryFailed", 5)
//!     .with_message("query on %s failed: %s")
//!     .masked();
//!
//! fn load(ctx: &Context, def: &ErrorDefinition) -> Result<()> {
//!     let ctx = ctx.with_data(error_data! { "table" => "users" });
//!     Err(def.new_error(&ctx, vec![Value::from("users"), Value::from("timeout")]))
//! }
//!
//! let ctx = Context::background().with_data(error_data! { "request_id" => "r-42" });
//! let err = load(&ctx, &query_failed).unwrap_err();
//!
//! // Public message hides the template:
//! assert_eq!(
//!     err.to_string(),
//!     "Sorry, there are internal server error occured, please try again later. (500)"
//! );
//!
//! // Internal detail is still there:
//! assert_eq!(err.render_actual(), "query on users failed: timeout (500)");
//! assert_eq!(
//!     err.data(),
//!     &error_data! { "request_id" => "r-42", "table" => "users" }
//! );
//! ```
//!
//! ## Modules
//!
//! - [`context`]: the per-call [`Context`] (values, cancellation)
//! - [`data`]: layered debug data on a context
//! - [`definition`]: [`ErrorDefinition`] and [`ErrorCategory`]
//! - [`wrapper`]: the [`WrappedError`] instance, [`cast`], [`matches_definition`]
//! - [`convert`](mod@convert): re-stamping under another definition
//! - [`format`]: printf-style template rendering
//! - [`stack`]: call-site capture
//! - [`defaults`]: process-wide defaults
//! - [`logging`]: [`InternalLog`] for internal forensics
//!
//! ## Feature Flags
//!
//! - `trusted_debug`: `InternalLog::format_for_trusted_debug` (debug builds only)
//! - `tokio`: `Context::cancelled().await`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod convenience;
pub mod convert;
pub mod data;
pub mod defaults;
pub mod definition;
pub mod format;
pub mod logging;
pub mod stack;
pub mod wrapper;

pub use context::{CancelHandle, Context};
pub use convert::convert;
pub use data::{attach_data, resolve_data, DataLayer, ErrorData};
pub use defaults::StackTraceMode;
pub use definition::{ErrorCategory, ErrorDefinition, MaskFormatter, MessageFormatter};
pub use logging::InternalLog;
pub use serde_json::Value;
pub use stack::{StackFrame, StackTrace};
pub use wrapper::{cast, cast_boxed, matches_definition, WrappedError};

/// Result alias with [`WrappedError`] as the error.
pub type Result<T> = std::result::Result<T, WrappedError>;

//! Process-wide defaults injected into definitions and traces.
//!
//! Every value here is a plain global with last-write-wins semantics. They are
//! meant to be assigned once during start-up, before any definition is built:
//! [`ErrorDefinition::new`](crate::ErrorDefinition::new) and the `masked*`
//! builders snapshot the values current at the time they run, so a later
//! assignment does not reach definitions that already exist.
//!
//! The store is a `RwLock` so steady-state reads from many threads never race
//! a late write. A poisoned lock is recovered rather than propagated.
//!
//! # Example
//!
//! ```rust
//! use stamped_errors::defaults;
//!
//! assert_eq!(
//!     defaults::mask_message(),
//!     "Sorry, there are internal server error occured, please try again later."
//! );
//! assert!(defaults::package_prefix().is_empty());
//! ```

use crate::definition::{MaskFormatter, MessageFormatter};
use crate::WrappedError;
use std::borrow::Cow;
use std::sync::{Arc, LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Mask text used by [`ErrorDefinition::masked`](crate::ErrorDefinition::masked)
/// until replaced with [`set_mask_message`].
pub const DEFAULT_MASK_MESSAGE: &str =
    "Sorry, there are internal server error occured, please try again later.";

/// Which parts of each call-site frame are kept when a trace is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StackTraceMode {
    /// File, line and function.
    #[default]
    Full,
    /// File and line only.
    LineOnly,
    /// Function path only.
    FuncOnly,
}

struct Defaults {
    mask_message: Cow<'static, str>,
    mask_formatter: MaskFormatter,
    message_formatter: MessageFormatter,
    package_prefix: Cow<'static, str>,
    stack_trace_mode: StackTraceMode,
}

impl Defaults {
    fn initial() -> Self {
        Self {
            mask_message: Cow::Borrowed(DEFAULT_MASK_MESSAGE),
            mask_formatter: Arc::new(default_mask_formatter),
            message_formatter: Arc::new(default_message_formatter),
            package_prefix: Cow::Borrowed(""),
            stack_trace_mode: StackTraceMode::Full,
        }
    }
}

static DEFAULTS: LazyLock<RwLock<Defaults>> = LazyLock::new(|| RwLock::new(Defaults::initial()));

#[inline]
fn read() -> RwLockReadGuard<'static, Defaults> {
    match DEFAULTS.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[inline]
fn write() -> RwLockWriteGuard<'static, Defaults> {
    match DEFAULTS.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// Built-in formatters
// ============================================================================

/// Appends the numeric code: `"<message> (<code>)"`.
pub fn default_message_formatter(message: &str, err: &WrappedError) -> String {
    format!("{} ({})", message, err.code())
}

/// Returns the instance's stored mask text verbatim.
pub fn default_mask_formatter(err: &WrappedError) -> String {
    err.raw_mask_message().to_owned()
}

// ============================================================================
// Accessors
// ============================================================================

/// Current default mask text.
pub fn mask_message() -> Cow<'static, str> {
    read().mask_message.clone()
}

/// Replace the default mask text.
pub fn set_mask_message(message: impl Into<Cow<'static, str>>) {
    write().mask_message = message.into();
}

/// Current default mask formatter.
pub fn mask_formatter() -> MaskFormatter {
    Arc::clone(&read().mask_formatter)
}

/// Replace the default mask formatter.
pub fn set_mask_formatter<F>(formatter: F)
where
    F: Fn(&WrappedError) -> String + Send + Sync + 'static,
{
    write().mask_formatter = Arc::new(formatter);
}

/// Current default message formatter.
pub fn message_formatter() -> MessageFormatter {
    Arc::clone(&read().message_formatter)
}

/// Replace the default message formatter.
pub fn set_message_formatter<F>(formatter: F)
where
    F: Fn(&str, &WrappedError) -> String + Send + Sync + 'static,
{
    write().message_formatter = Arc::new(formatter);
}

/// Substring a frame's function path or file must contain to be kept in a
/// captured trace. Empty disables trimming.
pub fn package_prefix() -> Cow<'static, str> {
    read().package_prefix.clone()
}

/// Replace the trace trimming prefix.
pub fn set_package_prefix(prefix: impl Into<Cow<'static, str>>) {
    write().package_prefix = prefix.into();
}

/// Current capture mode.
pub fn stack_trace_mode() -> StackTraceMode {
    read().stack_trace_mode
}

/// Replace the capture mode.
pub fn set_stack_trace_mode(mode: StackTraceMode) {
    write().stack_trace_mode = mode;
}

/// Restore every default to its built-in value.
pub fn reset() {
    *write() = Defaults::initial();
}

// ============================================================================
// Tests
// ============================================================================

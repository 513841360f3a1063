//! The concrete error value stamped from an [`ErrorDefinition`].
//!
//! # Rendering
//!
//! - [`WrappedError::render_message`] (also `Display`) is the public-facing
//!   text. For a masked instance the template never reaches it.
//! - [`WrappedError::render_actual`] always renders the template with its
//!   arguments, for internal logging.
//!
//! Both go through the instance's message formatter, which by default appends
//! `" (<code>)"`. Masking is a presentation policy: the unmasked content stays
//! retrievable from the instance.
//!
//! # Identity
//!
//! Instances are matched to definitions by code only ([`WrappedError::is`],
//! [`matches_definition`]).
//!
//! # Memory hygiene
//!
//! Owned message text, string arguments and string data values are zeroized
//! when the instance drops.

use crate::data::ErrorData;
use crate::defaults;
use crate::definition::{ErrorCategory, ErrorDefinition, MaskFormatter, MessageFormatter};
use crate::format;
use crate::logging::InternalLog;
use crate::stack::StackTrace;
use serde_json::Value;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::panic::Location;
use zeroize::Zeroize;

/// An error instance: definition fields, arguments, debug data and call site.
#[must_use = "errors should be handled or logged"]
#[derive(Clone)]
pub struct WrappedError {
    code: i64,
    code_string: Cow<'static, str>,
    category: ErrorCategory,
    message: Cow<'static, str>,
    args: Vec<Value>,
    masked: bool,
    mask_message: Cow<'static, str>,
    mask_formatter: Option<MaskFormatter>,
    message_formatter: MessageFormatter,
    data: ErrorData,
    stack_trace: StackTrace,
    origin: &'static Location<'static>,
}

impl WrappedError {
    /// Copy `def`'s fields into a new instance and capture the stack.
    #[inline(never)]
    pub(crate) fn stamp(
        def: &ErrorDefinition,
        data: ErrorData,
        message: Cow<'static, str>,
        args: Vec<Value>,
        origin: &'static Location<'static>,
    ) -> Self {
        Self {
            code: def.code,
            code_string: def.code_string.clone(),
            category: def.category,
            message,
            args,
            masked: def.masked,
            mask_message: def.mask_message.clone(),
            mask_formatter: def.mask_formatter.clone(),
            message_formatter: def.message_formatter.clone(),
            data,
            stack_trace: StackTrace::capture(),
            origin,
        }
    }

    /// Numeric code copied from the definition.
    #[inline]
    pub fn code(&self) -> i64 {
        self.code
    }

    /// String code copied from the definition.
    #[inline]
    pub fn code_string(&self) -> &str {
        &self.code_string
    }

    /// Category copied from the definition.
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Whether the public message is masked.
    #[inline]
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Template before argument substitution.
    #[inline]
    pub fn raw_message(&self) -> &str {
        &self.message
    }

    /// Mask text before the mask formatter runs.
    #[inline]
    pub fn raw_mask_message(&self) -> &str {
        &self.mask_message
    }

    /// Arguments substituted into the template.
    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Debug data resolved from the context at creation.
    #[inline]
    pub fn data(&self) -> &ErrorData {
        &self.data
    }

    /// Call sites captured at creation, innermost first.
    #[inline]
    pub fn stack_trace(&self) -> &StackTrace {
        &self.stack_trace
    }

    /// Source location of the call that created this instance.
    #[inline]
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    /// Public-facing message; masked text when masking is on.
    pub fn render_message(&self) -> String {
        if !self.masked {
            return self.render_actual();
        }
        let text = match &self.mask_formatter {
            Some(formatter) => formatter(self),
            None => defaults::mask_formatter()(self),
        };
        (self.message_formatter)(&text, self)
    }

    /// Template rendered with the arguments, ignoring masking.
    pub fn render_actual(&self) -> String {
        let text = format::sprintf(&self.message, &self.args);
        (self.message_formatter)(&text, self)
    }

    /// Whether this instance was stamped from a definition with `def`'s code.
    #[inline]
    pub fn is(&self, def: &ErrorDefinition) -> bool {
        self.code == def.code()
    }

    /// Borrowed structured view for internal logging.
    ///
    /// The view cannot outlive the error.
    pub fn internal_log(&self) -> InternalLog<'_> {
        InternalLog::new(self)
    }

    /// Run `f` with the internal log view, dropping it right after.
    pub fn with_internal_log<R>(&self, f: impl FnOnce(&InternalLog<'_>) -> R) -> R {
        let log = self.internal_log();
        f(&log)
    }
}

/// True iff both sides are present and the codes are equal.
pub fn matches_definition(err: Option<&WrappedError>, def: Option<&ErrorDefinition>) -> bool {
    match (err, def) {
        (Some(err), Some(def)) => err.is(def),
        _ => false,
    }
}

/// View a generic error as a [`WrappedError`], if it is one.
///
/// ```rust
/// use stamped_errors::{ErrorDefinition, cast};
/// use std::error::Error;
///
/// let def = ErrorDefinition::new(1, "One", 0).with_message("one");
/// let err: Box<dyn Error + Send + Sync> = Box::new(def.new_error_without_context(vec![]));
///
/// assert_eq!(cast(err.as_ref()).map(|e| e.code()), Some(1));
///
/// let io: Box<dyn Error + Send + Sync> = Box::new(std::io::Error::other("io"));
/// assert!(cast(io.as_ref()).is_none());
/// ```
pub fn cast<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a WrappedError> {
    err.downcast_ref::<WrappedError>()
}

/// Owned form of [`cast`]; hands the box back untouched when it holds
/// something else.
pub fn cast_boxed(
    err: Box<dyn Error + Send + Sync>,
) -> Result<Box<WrappedError>, Box<dyn Error + Send + Sync>> {
    err.downcast::<WrappedError>()
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_message())
    }
}

impl fmt::Debug for WrappedError {
    /// Never prints the template, arguments or data values of a masked
    /// instance; data values are omitted for every instance.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("WrappedError");
        out.field("code", &self.code)
            .field("code_string", &self.code_string)
            .field("category", &self.category)
            .field("masked", &self.masked);
        if self.masked {
            out.field("message", &"<REDACTED>")
                .field("args", &"<REDACTED>");
        } else {
            out.field("message", &self.message).field("args", &self.args);
        }
        out.field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Error for WrappedError {}

fn zeroize_value(value: &mut Value) {
    match value {
        Value::String(s) => s.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(zeroize_value),
        Value::Object(map) => map.values_mut().for_each(zeroize_value),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

impl Drop for WrappedError {
    #[inline(never)]
    fn drop(&mut self) {
        if let Cow::Owned(message) = &mut self.message {
            message.zeroize();
        }
        if let Cow::Owned(mask) = &mut self.mask_message {
            mask.zeroize();
        }
        self.args.iter_mut().for_each(zeroize_value);
        self.data.values_mut().for_each(zeroize_value);
    }
}

// ============================================================================
// Tests
// ============================================================================

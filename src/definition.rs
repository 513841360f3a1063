//! Error definitions: reusable templates errors are stamped from.
//!
//! An [`ErrorDefinition`] is built once (typically in a `static`) and then
//! used at every error site. Configuration methods consume and return the
//! definition, so a published definition never changes underneath the
//! instances created from it. Instances copy the definition's fields at stamp
//! time.
//!
//! # Message model
//!
//! The message template belongs to the definition ([`ErrorDefinition::with_message`]);
//! error sites only supply the arguments.
//!
//! # Example
//!
//! ```rust
//! use stamped_errors::{Context, ErrorDefinition, Value, error_data};
//!
//! let not_found = ErrorDefinition::new(404, "UserNotFound", 4)
//!     .with_message("user %s not found");
//!
//! let ctx = Context::background().with_data(error_data! { "tenant" => "acme" });
//! let err = not_found.new_error(&ctx, vec![Value::from("bob")]);
//!
//! assert_eq!(err.to_string(), "user bob not found (404)");
//! assert_eq!(err.data(), &error_data! { "tenant" => "acme" });
//! assert!(err.is(&not_found));
//! ```

use crate::context::Context;
use crate::data::resolve_data;
use crate::defaults;
use crate::format;
use crate::wrapper::WrappedError;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Renders the final message from the (masked or templated) text.
pub type MessageFormatter = Arc<dyn Fn(&str, &WrappedError) -> String + Send + Sync>;

/// Produces the mask text for a masked instance.
pub type MaskFormatter = Arc<dyn Fn(&WrappedError) -> String + Send + Sync>;

/// Opaque classification for the application to interpret, e.g. to map onto
/// transport status codes. No members are predefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ErrorCategory(pub i32);

impl ErrorCategory {
    /// Wrap a raw category value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw category value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for ErrorCategory {
    #[inline]
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Template for a family of errors.
#[derive(Clone)]
pub struct ErrorDefinition {
    pub(crate) code: i64,
    pub(crate) code_string: Cow<'static, str>,
    pub(crate) category: ErrorCategory,
    pub(crate) message: Cow<'static, str>,
    pub(crate) masked: bool,
    pub(crate) mask_message: Cow<'static, str>,
    pub(crate) mask_formatter: Option<MaskFormatter>,
    pub(crate) message_formatter: MessageFormatter,
}

impl ErrorDefinition {
    /// Unmasked definition with an empty template and the current default
    /// message formatter.
    pub fn new(
        code: i64,
        code_string: impl Into<Cow<'static, str>>,
        category: impl Into<ErrorCategory>,
    ) -> Self {
        Self {
            code,
            code_string: code_string.into(),
            category: category.into(),
            message: Cow::Borrowed(""),
            masked: false,
            mask_message: Cow::Borrowed(""),
            mask_formatter: None,
            message_formatter: defaults::message_formatter(),
        }
    }

    /// Set the message template rendered with the instance's arguments.
    pub fn with_message(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.message = template.into();
        self
    }

    /// Mask with the current default mask text and mask formatter.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self.mask_message = defaults::mask_message();
        self.mask_formatter = Some(defaults::mask_formatter());
        self
    }

    /// Mask with `text` and the current default mask formatter.
    pub fn masked_with_message(mut self, text: impl Into<Cow<'static, str>>) -> Self {
        self.masked = true;
        self.mask_message = text.into();
        self.mask_formatter = Some(defaults::mask_formatter());
        self
    }

    /// Mask with text produced by `formatter`.
    ///
    /// Mask text set earlier in the chain is kept and readable through
    /// [`WrappedError::raw_mask_message`].
    pub fn masked_with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&WrappedError) -> String + Send + Sync + 'static,
    {
        self.masked = true;
        self.mask_formatter = Some(Arc::new(formatter));
        self
    }

    /// Replace the formatter applied to both masked and actual text.
    pub fn with_message_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &WrappedError) -> String + Send + Sync + 'static,
    {
        self.message_formatter = Arc::new(formatter);
        self
    }

    /// Numeric code.
    #[inline]
    pub fn code(&self) -> i64 {
        self.code
    }

    /// String code.
    #[inline]
    pub fn code_string(&self) -> &str {
        &self.code_string
    }

    /// Category.
    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Message template.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether stamped instances mask their message.
    #[inline]
    pub fn is_masked(&self) -> bool {
        self.masked
    }

    /// Configured mask text; empty when unmasked or when a mask formatter
    /// supplies the text.
    #[inline]
    pub fn mask_message(&self) -> &str {
        &self.mask_message
    }

    /// Number of arguments the template consumes.
    pub fn arity(&self) -> usize {
        format::directive_count(&self.message)
    }

    /// Stamp an instance carrying `ctx`'s debug data.
    ///
    /// The caller's location becomes the instance's
    /// [`origin`](WrappedError::origin) and the captured trace starts there.
    #[track_caller]
    #[inline(never)]
    pub fn new_error(&self, ctx: &Context, args: Vec<Value>) -> WrappedError {
        WrappedError::stamp(
            self,
            resolve_data(Some(ctx)),
            self.message.clone(),
            args,
            Location::caller(),
        )
    }

    /// Stamp an instance without debug data.
    #[track_caller]
    #[inline(never)]
    pub fn new_error_without_context(&self, args: Vec<Value>) -> WrappedError {
        WrappedError::stamp(
            self,
            resolve_data(None),
            self.message.clone(),
            args,
            Location::caller(),
        )
    }
}

impl fmt::Debug for ErrorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDefinition")
            .field("code", &self.code)
            .field("code_string", &self.code_string)
            .field("category", &self.category)
            .field("message", &self.message)
            .field("masked", &self.masked)
            .field("mask_message", &self.mask_message)
            .field("has_mask_formatter", &self.mask_formatter.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

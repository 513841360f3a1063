//! Structured log entry for internal forensics.
//!
//! # Properties
//!
//! - Borrows from [`WrappedError`] with an explicit lifetime
//! - Cannot outlive the error that created it
//! - Carries the unmasked message even when the public message is masked
//! - The rendered message is zeroized when the entry drops
//!
//! No logging backend is wired in. Hand the entry to whatever logger the
//! application uses, through [`InternalLog::write_to`] or the field accessors.

use crate::data::ErrorData;
use crate::definition::ErrorCategory;
use crate::stack::StackTrace;
use crate::wrapper::WrappedError;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use zeroize::Zeroizing;

/// Maximum length for any individual field in formatted output
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated strings
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Structured log entry borrowed from a [`WrappedError`].
///
/// # Example
///
/// ```rust
/// use stamped_errors::{ErrorDefinition, Value};
///
/// let def = ErrorDefinition::new(500, "DbDown", 5)
///     .with_message("pool %s exhausted")
///     .masked();
/// let err = def.new_error_without_context(vec![Value::from("primary")]);
///
/// err.with_internal_log(|log| {
///     let mut line = String::new();
///     log.write_to(&mut line).unwrap();
///     assert!(line.contains("pool primary exhausted (500)"));
/// });
/// ```
pub struct InternalLog<'a> {
    code: i64,
    code_string: &'a str,
    category: ErrorCategory,
    masked: bool,
    actual: Zeroizing<String>,
    data: &'a ErrorData,
    origin: &'static Location<'static>,
    stack_trace: &'a StackTrace,
}

impl<'a> InternalLog<'a> {
    pub(crate) fn new(err: &'a WrappedError) -> Self {
        Self {
            code: err.code(),
            code_string: err.code_string(),
            category: err.category(),
            masked: err.is_masked(),
            actual: Zeroizing::new(err.render_actual()),
            data: err.data(),
            origin: err.origin(),
            stack_trace: err.stack_trace(),
        }
    }

    /// Format for human-readable logs in trusted debug contexts, stack trace
    /// included.
    ///
    /// Available only with BOTH the `trusted_debug` feature AND debug
    /// assertions, so it cannot end up in a release build by accident.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = String::new();
        let _ = self.write_to(&mut output);
        for line in self.stack_trace.lines() {
            output.push_str("\n    at ");
            output.push_str(&truncate_with_indicator(&line));
        }
        output
    }

    /// Write a single-line record to `f`.
    ///
    /// Every free-form field is truncated to a bounded length.
    ///
    /// Format: `[<code_string> <code>] category=<n> [MASKED] message='..' origin='file:line' key='value'..`
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{} {}] category={}{} message='{}' origin='{}:{}'",
            truncate_with_indicator(self.code_string),
            self.code,
            self.category,
            if self.masked { " [MASKED]" } else { "" },
            truncate_with_indicator(&self.actual),
            self.origin.file(),
            self.origin.line(),
        )?;

        for (key, value) in self.data {
            write!(
                f,
                " {}='{}'",
                truncate_with_indicator(key),
                truncate_with_indicator(&value_text(value))
            )?;
        }

        Ok(())
    }

    /// Numeric code.
    #[inline]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// String code.
    #[inline]
    pub const fn code_string(&self) -> &str {
        self.code_string
    }

    /// Category of the definition.
    #[inline]
    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Whether the public message is masked.
    #[inline]
    pub const fn is_masked(&self) -> bool {
        self.masked
    }

    /// Unmasked rendered message.
    #[inline]
    pub fn actual_message(&self) -> &str {
        &self.actual
    }

    /// Fields are not truncated here; that is up to the consuming logger.
    #[inline]
    pub const fn data(&self) -> &ErrorData {
        self.data
    }

    /// Where the error was stamped.
    #[inline]
    pub const fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    /// Captured call sites.
    #[inline]
    pub const fn stack_trace(&self) -> &StackTrace {
        self.stack_trace
    }
}

impl fmt::Debug for InternalLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalLog")
            .field("code", &self.code)
            .field("code_string", &self.code_string)
            .field("category", &self.category)
            .field("masked", &self.masked)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Truncate a string for display so oversized messages cannot flood logs.
///
/// Returns a Cow<str> to avoid allocation when no truncation is needed.
fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    // Last char boundary at or before the limit
    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error_data, Context, ErrorDefinition};

    fn masked_error() -> WrappedError {
        let ctx = Context::background().with_data(error_data! { "user" => "bob", "attempt" => 3 });
        ErrorDefinition::new(401, "AuthFailed", 4)
            .with_message("bad password for %s")
            .masked()
            .new_error(&ctx, vec![Value::from("bob")])
    }

    #[test]
    fn log_carries_unmasked_detail() {
        let err = masked_error();
        let log = err.internal_log();

        assert_eq!(log.code(), 401);
        assert_eq!(log.code_string(), "AuthFailed");
        assert_eq!(log.category(), ErrorCategory(4));
        assert!(log.is_masked());
        assert_eq!(log.actual_message(), "bad password for bob (401)");
        assert_eq!(log.data(), err.data());
        assert_eq!(log.origin().file(), file!());
        assert!(!err.to_string().contains("bob"));
    }

    #[test]
    fn write_to_renders_single_line() {
        let err = masked_error();
        let line = err.with_internal_log(|log| {
            let mut out = String::new();
            log.write_to(&mut out).expect("write to string");
            out
        });

        assert!(line.starts_with("[AuthFailed 401] category=4 [MASKED] message='bad password for bob (401)'"));
        assert!(line.contains(" attempt='3'"));
        assert!(line.contains(" user='bob'"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn write_to_truncates_oversized_fields() {
        let huge = "x".repeat(MAX_FIELD_OUTPUT_LEN * 2);
        let ctx = Context::background().with_data(error_data! { "blob" => huge.clone() });
        let err = ErrorDefinition::new(1, "Big", 0)
            .with_message("%s")
            .new_error(&ctx, vec![Value::from(huge)]);

        let mut out = String::new();
        err.internal_log().write_to(&mut out).expect("write to string");
        assert_eq!(out.matches(TRUNCATION_INDICATOR).count(), 2);
        assert!(out.len() < MAX_FIELD_OUTPUT_LEN * 3);
    }

    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    #[test]
    fn trusted_debug_includes_stack() {
        let err = masked_error();
        let out = err.internal_log().format_for_trusted_debug();
        assert!(out.contains("bad password for bob"));
        assert!(out.contains("\n    at "));
    }

    #[test]
    fn truncate_ascii() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN + 10);
        let truncated = truncate_with_indicator(&s);

        assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn no_truncate_when_under_limit() {
        let s = "short string";
        let truncated = truncate_with_indicator(s);

        assert!(matches!(truncated, Cow::Borrowed(_)));
        assert_eq!(truncated, s);
    }

    #[test]
    fn truncate_utf8_boundary() {
        let s = "й".repeat(MAX_FIELD_OUTPUT_LEN);
        let truncated = truncate_with_indicator(&s);

        assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn exactly_at_limit() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN);
        let truncated = truncate_with_indicator(&s);

        assert!(matches!(truncated, Cow::Borrowed(_)));
        assert_eq!(truncated.len(), MAX_FIELD_OUTPUT_LEN);
    }

    #[test]
    fn value_text_unquotes_strings_only() {
        assert_eq!(value_text(&Value::from("plain")), "plain");
        assert_eq!(value_text(&serde_json::json!([1, "a"])), "[1,\"a\"]");
        assert_eq!(value_text(&Value::Null), "null");
    }
}

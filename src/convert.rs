//! Re-stamping an instance under another definition.

use crate::context::Context;
use crate::definition::ErrorDefinition;
use crate::wrapper::WrappedError;
use std::panic::Location;

/// Stamp `def` with `err`'s template and arguments.
///
/// `err`'s debug data is attached to `ctx` as one more layer before the new
/// instance resolves its data, so `err`'s keys win over `ctx`'s on collision.
/// Code, category, masking and formatters come from `def`. `err` is left as is.
///
/// ```rust
/// use stamped_errors::{Context, ErrorDefinition, Value, convert, error_data};
///
/// let storage = ErrorDefinition::new(500, "StorageFailed", 5).with_message("read %s");
/// let public = ErrorDefinition::new(503, "Unavailable", 5).masked();
///
/// let err = storage.new_error(
///     &Context::background().with_data(error_data! { "table" => "users" }),
///     vec![Value::from("users")],
/// );
/// let ctx = Context::background().with_data(error_data! { "request" => 7 });
/// let converted = convert(&ctx, &err, &public);
///
/// assert_eq!(converted.code(), 503);
/// assert_eq!(converted.render_actual(), "read users (503)");
/// assert_eq!(converted.data(), &error_data! { "request" => 7, "table" => "users" });
/// ```
#[track_caller]
#[inline(never)]
pub fn convert(ctx: &Context, err: &WrappedError, def: &ErrorDefinition) -> WrappedError {
    let merged = ctx.with_data(err.data().clone());
    WrappedError::stamp(
        def,
        merged.data(),
        err.raw_message().to_owned().into(),
        err.args().to_vec(),
        Location::caller(),
    )
}

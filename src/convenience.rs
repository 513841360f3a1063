//! Convenience macros for declaring definitions and stamping errors.
//!
//! # Usage
//!
//! ```rust
//! use stamped_errors::{Context, define_errors, error_data, new_error};
//!
//! define_errors! {
//!     4 => {
//!         /// Lookup by primary key found nothing.
//!         NOT_FOUND = (404, "NotFound", "%s %d not found"),
//!     }
//!     5 => {
//!         DB_DOWN = (500, "DbDown", "pool %s exhausted").masked(),
//!         CACHE_DOWN = (501, "CacheDown", "cache %s unreachable")
//!             .masked_with_message("temporarily unavailable"),
//!     }
//! }
//!
//! let ctx = Context::background().with_data(error_data! { "shard" => 3 });
//! let err = new_error!(NOT_FOUND, &ctx, "user", 42);
//!
//! assert_eq!(err.to_string(), "user 42 not found (404)");
//! assert_eq!(err.data(), &error_data! { "shard" => 3 });
//!
//! let err = new_error!(CACHE_DOWN; "redis-1");
//! assert_eq!(err.to_string(), "temporarily unavailable (501)");
//! assert_eq!(err.render_actual(), "cache redis-1 unreachable (501)");
//! ```
//!
//! Arguments and data values go through `Value::from`, so anything
//! `serde_json::Value` converts from is accepted as is.

/// Build an [`ErrorData`](crate::ErrorData) map.
///
/// ```rust
/// use stamped_errors::{error_data, Value};
///
/// let data = error_data! { "user" => "bob", "attempt" => 3, "locked" => true };
/// assert_eq!(data["attempt"], Value::from(3));
/// assert!(error_data! {}.is_empty());
/// ```
#[macro_export]
macro_rules! error_data {
    () => {
        $crate::ErrorData::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut data = $crate::ErrorData::new();
        $(
            data.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        data
    }};
}

/// Stamp an error from a definition.
///
/// - `new_error!(DEF, &ctx, args..)` carries `ctx`'s debug data
/// - `new_error!(DEF; args..)` has no debug data
///
/// The macro call site is recorded as the error's origin.
#[macro_export]
macro_rules! new_error {
    ($def:expr; $($arg:expr),* $(,)?) => {
        ($def).new_error_without_context(::std::vec![$($crate::Value::from($arg)),*])
    };
    ($def:expr, $ctx:expr $(, $arg:expr)* $(,)?) => {
        ($def).new_error($ctx, ::std::vec![$($crate::Value::from($arg)),*])
    };
}

/// Declare lazily-built `pub static` definitions grouped by category.
///
/// Each entry is `NAME = (code, "CodeString", "template")` followed by any
/// number of builder calls (`.masked()`, `.masked_with_message(..)`,
/// `.with_message_formatter(..)`, ...). Definitions are built on first use,
/// so they pick up process-wide defaults assigned before that.
#[macro_export]
macro_rules! define_errors {
    ($(
        $category:expr => {
            $(
                $(#[$meta:meta])*
                $name:ident = ($code:expr, $code_string:expr, $message:expr)
                    $(.$modifier:ident($($modifier_arg:expr),* $(,)?))*
            ),+ $(,)?
        }
    )+) => {
        $($(
            $(#[$meta])*
            pub static $name: ::std::sync::LazyLock<$crate::ErrorDefinition> =
                ::std::sync::LazyLock::new(|| {
                    $crate::ErrorDefinition::new($code, $code_string, $category)
                        .with_message($message)
                        $(.$modifier($($modifier_arg),*))*
                });
        )+)+
    };
}

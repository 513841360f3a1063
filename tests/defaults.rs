//! Process-wide defaults.
//!
//! Everything runs inside one test so no other test in this binary can
//! observe the globals mid-change.

use stamped_errors::defaults::{self, StackTraceMode, DEFAULT_MASK_MESSAGE};
use stamped_errors::{ErrorDefinition, Value};

#[test]
fn defaults_are_snapshotted_and_resettable() {
    // ------------------------------------------------------------------
    // Mask text: snapshotted by masked(), not by masked_with_message()
    // ------------------------------------------------------------------
    defaults::set_mask_message("Service unavailable");
    assert_eq!(defaults::mask_message(), "Service unavailable");

    let masked = ErrorDefinition::new(1, "One", 0).with_message("detail").masked();
    let explicit = ErrorDefinition::new(2, "Two", 0)
        .with_message("detail")
        .masked_with_message("explicit");

    defaults::set_mask_message("changed later");
    let err = masked.new_error_without_context(vec![]);
    assert_eq!(err.to_string(), "Service unavailable (1)");
    assert_eq!(
        explicit.new_error_without_context(vec![]).to_string(),
        "explicit (2)"
    );

    // ------------------------------------------------------------------
    // Message formatter: snapshotted by new()
    // ------------------------------------------------------------------
    let before = ErrorDefinition::new(3, "Three", 0).with_message("x=%d");
    defaults::set_message_formatter(|msg, err| format!("{}: {}", err.code_string(), msg));
    let after = ErrorDefinition::new(4, "Four", 0).with_message("x=%d");

    assert_eq!(
        before.new_error_without_context(vec![Value::from(1)]).to_string(),
        "x=1 (3)"
    );
    assert_eq!(
        after.new_error_without_context(vec![Value::from(1)]).to_string(),
        "Four: x=1"
    );

    // ------------------------------------------------------------------
    // Mask formatter
    // ------------------------------------------------------------------
    defaults::set_mask_formatter(|err| format!("ref-{}", err.code()));
    let err = ErrorDefinition::new(5, "Five", 0)
        .masked_with_message("ignored by formatter")
        .new_error_without_context(vec![]);
    assert_eq!(err.to_string(), "Five: ref-5");
    assert_eq!(err.raw_mask_message(), "ignored by formatter");

    // ------------------------------------------------------------------
    // Stack trace mode and prefix
    // ------------------------------------------------------------------
    defaults::set_stack_trace_mode(StackTraceMode::FuncOnly);
    assert_eq!(defaults::stack_trace_mode(), StackTraceMode::FuncOnly);
    let err = ErrorDefinition::new(6, "Six", 0).new_error_without_context(vec![]);
    assert!(!err.stack_trace().is_empty());
    assert!(err
        .stack_trace()
        .iter()
        .all(|f| f.file().is_none() && f.line().is_none()));

    defaults::set_stack_trace_mode(StackTraceMode::Full);
    defaults::set_package_prefix("defaults_are_snapshotted_and_resettable");
    assert_eq!(
        defaults::package_prefix(),
        "defaults_are_snapshotted_and_resettable"
    );
    let err = ErrorDefinition::new(7, "Seven", 0).new_error_without_context(vec![]);
    let lines = err.stack_trace().lines();
    assert!(!lines.is_empty());
    assert!(lines
        .iter()
        .all(|l| l.contains("defaults_are_snapshotted_and_resettable")));
    assert!(lines[0].contains("tests/defaults.rs"));

    defaults::set_package_prefix("no-frame-matches-this-prefix");
    let err = ErrorDefinition::new(8, "Eight", 0).new_error_without_context(vec![]);
    assert!(err.stack_trace().is_empty());

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------
    defaults::reset();
    assert_eq!(defaults::mask_message(), DEFAULT_MASK_MESSAGE);
    assert_eq!(defaults::package_prefix(), "");
    assert_eq!(defaults::stack_trace_mode(), StackTraceMode::Full);

    let err = ErrorDefinition::new(9, "Nine", 0)
        .with_message("back to %s")
        .new_error_without_context(vec![Value::from("normal")]);
    assert_eq!(err.to_string(), "back to normal (9)");
}

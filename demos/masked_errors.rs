use stamped_errors::defaults;
use stamped_errors::{ErrorDefinition, Value};

fn main() {
    println!("--- Masked Errors Example ---\n");

    // Must run before definitions are built to affect them
    defaults::set_mask_message("Something went wrong on our side.");

    let query_failed = ErrorDefinition::new(500, "QueryFailed", 5)
        .with_message("query on table %s failed: %v")
        .masked();

    let quota = ErrorDefinition::new(429, "QuotaExceeded", 4)
        .with_message("tenant %s used %d of %d requests")
        .masked_with_message("Too many requests, slow down.");

    let opaque = ErrorDefinition::new(503, "Upstream", 5)
        .with_message("upstream %s returned %d")
        .masked_with_formatter(|err| format!("Reference: {}-{}", err.code_string(), err.code()));

    let errors = [
        query_failed.new_error_without_context(vec![
            Value::from("payments"),
            Value::from(vec!["timeout", "retry exhausted"]),
        ]),
        quota.new_error_without_context(vec![
            Value::from("acme"),
            Value::from(1000),
            Value::from(1000),
        ]),
        opaque.new_error_without_context(vec![Value::from("billing-api"), Value::from(502)]),
    ];

    for err in &errors {
        println!("public:   {err}");
        println!("internal: {}", err.render_actual());
        println!("debug:    {err:?}\n");
    }

    defaults::reset();
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use stamped_errors::{Context, ErrorData, ErrorDefinition, Value};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();
    let mid = text.char_indices().nth(text.chars().count() / 2).map_or(text.len(), |(i, _)| i);
    let (template, payload) = text.split_at(mid);

    let mut debug = ErrorData::new();
    debug.insert(payload.to_owned(), Value::from(template));
    let ctx = Context::background().with_data(debug);

    let err = ErrorDefinition::new(1, "Fuzz", 0)
        .with_message(template.to_owned())
        .masked()
        .new_error(&ctx, vec![Value::from(payload)]);

    let _ = err.to_string();
    let _ = err.render_actual();
    let _ = format!("{err:?}");

    let mut buffer = String::new();
    let _ = err.internal_log().write_to(&mut buffer);
    assert!(buffer.len() < 8192);
});

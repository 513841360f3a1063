#![no_main]

use libfuzzer_sys::fuzz_target;
use stamped_errors::format::{directive_count, sprintf};
use stamped_errors::Value;

// First byte picks how many arguments, the rest is the template.
fuzz_target!(|data: &[u8]| {
    let Some((&n, rest)) = data.split_first() else {
        return;
    };
    let template = String::from_utf8_lossy(rest);
    let args: Vec<Value> = (0..n % 6)
        .map(|i| match i % 4 {
            0 => Value::from(i64::from(n) - 128),
            1 => Value::from(template.as_ref()),
            2 => Value::from(f64::from(n) / 3.0),
            _ => Value::from(vec![Value::Null, Value::from(true)]),
        })
        .collect();

    let _ = sprintf(&template, &args);
    let _ = directive_count(&template);
});

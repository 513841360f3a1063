use stamped_errors::{define_errors, error_data, new_error, Context, Result};

define_errors! {
    4 => {
        /// Requested configuration file is absent.
        CONFIG_MISSING = (404, "ConfigMissing", "config file %s not found"),
    }
    5 => {
        CONFIG_UNREADABLE = (500, "ConfigUnreadable", "failed to parse %s at line %d").masked(),
    }
}

fn load_configuration(ctx: &Context, path: &str) -> Result<()> {
    let ctx = ctx.with_data(error_data! { "path" => path });

    match path {
        "missing.toml" => Err(new_error!(CONFIG_MISSING, &ctx, path)),
        "bad_config.toml" => Err(new_error!(CONFIG_UNREADABLE, &ctx, path, 42)),
        _ => Ok(()),
    }
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    let ctx = Context::background().with_data(error_data! { "request_id" => "req-7f3a" });

    for path in ["app.toml", "missing.toml", "bad_config.toml"] {
        match load_configuration(&ctx, path) {
            Ok(()) => println!("{path}: loaded"),
            Err(err) => {
                // What a client sees
                println!("{path}: \"{err}\"");

                // What an operator sees
                err.with_internal_log(|log| {
                    println!("   Code:     {} ({})", log.code_string(), log.code());
                    println!("   Category: {}", log.category());
                    println!("   Actual:   {}", log.actual_message());
                    println!("   Origin:   {}", log.origin());
                    for (key, value) in log.data() {
                        println!("   {key:<9} {value}");
                    }
                });

                if err.is(&CONFIG_UNREADABLE) {
                    println!("   -> alerting on-call");
                }
                println!();
            }
        }
    }
}

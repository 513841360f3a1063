use stamped_errors::{
    cast, convert, error_data, new_error, Context, ErrorDefinition, Result, StackTraceMode, Value,
};
use std::error::Error;
use std::sync::LazyLock;

static DISK_READ: LazyLock<ErrorDefinition> = LazyLock::new(|| {
    ErrorDefinition::new(1001, "DiskRead", 3).with_message("read %s failed: %s")
});

static REPORT_FAILED: LazyLock<ErrorDefinition> = LazyLock::new(|| {
    ErrorDefinition::new(500, "ReportFailed", 5).masked()
});

struct UserId(u64);

fn read_block(ctx: &Context, path: &str) -> Result<Vec<u8>> {
    let ctx = ctx.with_data(error_data! { "layer" => "storage", "path" => path });
    Err(new_error!(DISK_READ, &ctx, path, "EIO"))
}

fn build_report(ctx: &Context) -> Result<String> {
    let ctx = ctx.with_data(error_data! { "layer" => "reports", "format" => "pdf" });
    read_block(&ctx, "/data/reports/q3.bin")
        .map(|bytes| format!("{} bytes", bytes.len()))
        .map_err(|err| convert(&ctx, &err, &REPORT_FAILED))
}

fn handle(ctx: &Context) -> std::result::Result<String, Box<dyn Error + Send + Sync>> {
    Ok(build_report(ctx)?)
}

fn main() {
    println!("--- Layered Context Example ---\n");
    stamped_errors::defaults::set_stack_trace_mode(StackTraceMode::LineOnly);

    let request = Context::background()
        .with_value(UserId(42))
        .with_data(error_data! { "request_id" => "r-9c1e", "layer" => "http" });

    let Err(boxed) = handle(&request) else {
        return;
    };

    let Some(err) = cast(boxed.as_ref()) else {
        println!("not one of ours: {boxed}");
        return;
    };

    println!("public:  {err}");
    println!("actual:  {}", err.render_actual());
    println!("matches ReportFailed: {}", err.is(&REPORT_FAILED));
    println!("matches DiskRead:     {}", err.is(&DISK_READ));

    println!("\nmerged data (innermost layer wins):");
    for (key, value) in err.data() {
        println!("  {key} = {value}");
    }
    assert_eq!(err.data()["layer"], Value::from("storage"));

    if let Some(user) = request.value::<UserId>() {
        println!("\nuser on the request context: {}", user.0);
    }

    println!("\nstamped at:");
    println!("{}", err.stack_trace());

    let mut line = String::new();
    if err.internal_log().write_to(&mut line).is_ok() {
        println!("\nlog: {line}");
    }

    stamped_errors::defaults::reset();
}

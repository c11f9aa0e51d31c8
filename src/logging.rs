/// Install the global tracing subscriber and bridge `log::` macros into it.
///
/// Logs go to stderr so stdout stays clean for JSON reports. Calling this
/// more than once is harmless; later calls are no-ops.
pub fn init_tracing_from_env() {
    let _ = tracing_log::LogTracer::init();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

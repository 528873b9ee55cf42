use tracing_subscriber::EnvFilter;

/// Initialise logging. The level is `info` unless `debug` is set, in which
/// case it starts at `debug` and `RUST_LOG` may override it.
/// `debug` comes from the `debugLogging` settings field.
///
/// Output goes to stderr; stdout carries the replay binary's dispatched actions.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. Stdout stays reserved for command output
/// and, in worker mode, for the result frame.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str =
    "warn,gotestwatch=debug,gotestwatch_core=debug,gotestwatch_graph=debug,gotestwatch_daemon=debug";

/// Install the global subscriber. Logs go to stderr so they never interleave
/// with progress lines and `go test` output on stdout.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { VERBOSE_FILTER } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

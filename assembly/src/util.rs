use tracing_forest::{ForestLayer, PrettyPrinter};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// The default `Level` is `INFO`. It can be overridden with `RUST_LOG`.
/// Logs go to stderr, leaving stdout to program output.
/// Calling it more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init_logger() {
    if cfg!(feature = "tracing-profile") || cfg!(feature = "perfetto") {
        // Kept alive for the whole process.
        if let Ok(guard) = tracing_profile::init_tracing() {
            std::mem::forget(guard);
        }
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ForestLayer::from(PrettyPrinter::new().writer(std::io::stderr)))
            .try_init();
    }
}

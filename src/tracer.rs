use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_JSON_ENV: &str = "CORPUS_TALLY_LOG_JSON";

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
/// Setting `CORPUS_TALLY_LOG_JSON` switches to one JSON object per event.
/// Calling it twice is harmless: the second call reports the existing subscriber.
pub fn setup_simple_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if std::env::var_os(LOG_JSON_ENV).is_some() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::General(format!("tracing already initialised: {e}")))
}

//! Log subscriber setup.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,savanna_world=info,savanna=info";

/// Install the global subscriber. Logs go to stderr so they never mix with
/// the frame printed on stdout.
pub fn init_telemetry(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            "info,savanna_world=debug,savanna=debug".into()
        } else {
            DEFAULT_FILTER.into()
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}

//! Console tracing setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to
//! this crate only, keeping dependency spam out of the output.

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

pub fn init(log_level: LogLevel) {
    let level: tracing::Level = log_level.into();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "land_registry_client={level},registry_signer={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

//! Tracing subscriber bootstrap.

use books_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the event filter; `RUST_LOG` takes precedence over the configured filter.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.log_filter)
            .map_err(|e| anyhow::anyhow!("invalid log filter '{}': {}", settings.log_filter, e)),
    }
}

/// Install the global tracing subscriber.
///
/// A subscriber that is already installed (tests, embedding binaries) is left in place.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            target: "books-telemetry",
            format = ?settings.log_format,
            filter = %settings.log_filter,
            "telemetry initialized"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_filter() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let settings = TelemetrySettings {
            log_filter: "books=notalevel".to_string(),
            ..TelemetrySettings::default()
        };
        assert!(env_filter(&settings).is_err());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = TelemetrySettings {
            log_format: LogFormat::Json,
            ..TelemetrySettings::default()
        };
        init(&settings).unwrap();
        init(&TelemetrySettings::default()).unwrap();
    }
}

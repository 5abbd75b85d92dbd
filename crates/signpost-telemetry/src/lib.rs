//! OpenTelemetry integration for signpost.
//!
//! Provides an OTLP tracing layer (feature `telemetry`) and a sampler that
//! keeps every navigation span while thinning out cache and watcher noise.
//!
//! # Activation
//!
//! OTel export activates when standard OTel environment variables are set:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 signpost shell
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to explicitly disable even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

#[cfg(feature = "telemetry")]
pub use otel::{OtelGuard, otel_layer};

/// Failure to set up export.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),

    #[error("failed to start telemetry runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Check whether OTel export should be enabled.
///
/// Returns `true` when standard OTel env vars indicate export is desired:
/// - `OTEL_SDK_DISABLED` is NOT set to `"true"`
/// - AND at least one of:
///   - `OTEL_EXPORTER_OTLP_ENDPOINT` is set
///   - `OTEL_TRACES_EXPORTER` is set (and not `"none"`)
pub fn otel_enabled() -> bool {
    otel_enabled_with(|key| std::env::var(key).ok())
}

fn otel_enabled_with(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }
    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }
    var("OTEL_TRACES_EXPORTER").is_some_and(|exporter| !exporter.eq_ignore_ascii_case("none"))
}

/// Sampling rate for a span name, by prefix.
///
/// | Prefix    | Rate | Why                                    |
/// |-----------|------|----------------------------------------|
/// | `nav.*`   | 100% | One per user action, highest value     |
/// | `cache.*` | 10%  | Every resolution touches the cache     |
/// | `watch.*` |  1%  | Editors emit bursts of file events     |
/// | other     | 10%  | Default for unclassified spans         |
///
/// Errors are always sampled regardless of name.
pub fn sample_rate(span_name: &str) -> f64 {
    if span_name.starts_with("nav.") {
        1.0
    } else if span_name.starts_with("watch.") {
        0.01
    } else {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_otel_enabled_rules() {
        assert!(!otel_enabled_with(env(&[])));
        assert!(otel_enabled_with(env(&[(
            "OTEL_EXPORTER_OTLP_ENDPOINT",
            "http://localhost:4317"
        )])));
        assert!(!otel_enabled_with(env(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("OTEL_SDK_DISABLED", "TRUE"),
        ])));
        assert!(otel_enabled_with(env(&[("OTEL_TRACES_EXPORTER", "otlp")])));
        assert!(!otel_enabled_with(env(&[("OTEL_TRACES_EXPORTER", "none")])));
    }

    #[test]
    fn test_sample_rates() {
        assert_eq!(sample_rate("nav.navigate"), 1.0);
        assert_eq!(sample_rate("nav.back"), 1.0);
        assert_eq!(sample_rate("cache.load"), 0.1);
        assert_eq!(sample_rate("watch.change"), 0.01);
        assert_eq!(sample_rate("navigate"), 0.1);
    }
}

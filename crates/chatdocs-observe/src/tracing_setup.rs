//! Tracing subscriber initialization.
//!
//! Human-readable or JSON log lines on stderr, with an optional
//! OpenTelemetry bridge that exports spans to stdout for local debugging.
//!
//! ```no_run
//! use chatdocs_observe::tracing_setup::{init_tracing, LogOptions};
//!
//! init_tracing(&LogOptions { default_filter: "info".into(), json: true, otel: false }).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Kept so the provider can be flushed on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Emit one JSON object per event instead of styled text.
    pub json: bool,
    /// Bridge spans to OpenTelemetry (stdout exporter).
    pub otel: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_filter: "warn".to_string(),
            json: false,
            otel: false,
        }
    }
}

/// Map the CLI's `-v` count to a default filter directive.
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,chatdocs=info",
        1 => "info,chatdocs=debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `options.default_filter` when set.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(options: &LogOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let fmt_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let otel_layer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("chatdocs");
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Flush buffered spans. No-op when OpenTelemetry was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filters() {
        assert_eq!(filter_for_verbosity(0), "warn,chatdocs=info");
        assert_eq!(filter_for_verbosity(1), "info,chatdocs=debug");
        assert_eq!(filter_for_verbosity(5), "trace");
    }

    #[test]
    fn test_default_options_are_quiet() {
        let options = LogOptions::default();
        assert_eq!(options.default_filter, "warn");
        assert!(!options.json && !options.otel);
    }
}

//! Subscriber setup: filter, console output and optional OTLP export.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "otlp")]
use opentelemetry::trace::TracerProvider as _;

use crate::{TelemetryConfig, TelemetryError};

/// Keeps exporters alive. Dropping it flushes pending spans.
pub struct TracingGuard {
    #[cfg(feature = "otlp")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        #[cfg(feature = "otlp")]
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Error shutting down tracer provider: {:?}", e);
            }
        }
    }
}

/// Parse filter directives such as `info` or `ocpi_gateway=debug,warn`.
pub fn env_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives)
        .map_err(|e| TelemetryError::Filter(format!("{directives:?}: {e}")))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    let filter = env_filter(&config.log_level)?;

    // JSON output for containers/production
    let json_layer = (config.console_output && config.json_logs).then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
    });

    // Pretty output for development
    let pretty_layer = (config.console_output && !config.json_logs)
        .then(|| fmt::layer().with_target(true).with_ansi(true));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer);

    #[cfg(feature = "otlp")]
    let (registry, provider) = {
        let provider = match config.otlp_endpoint.as_deref() {
            Some(endpoint) => Some(otlp::provider(config, endpoint)?),
            None => None,
        };
        let otel_layer = provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
        });
        (registry.with(otel_layer), provider)
    };

    registry
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    #[cfg(not(feature = "otlp"))]
    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::warn!(
            otlp_endpoint = %endpoint,
            "OTLP endpoint set but this build has no otlp support; spans stay local"
        );
    }

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        json = config.json_logs,
        "tracing initialized"
    );

    #[cfg(feature = "otlp")]
    let guard = TracingGuard { provider };
    #[cfg(not(feature = "otlp"))]
    let guard = TracingGuard {};

    Ok(guard)
}

#[cfg(feature = "otlp")]
mod otlp {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{
        runtime,
        trace::{self, RandomIdGenerator, Sampler, TracerProvider},
        Resource,
    };

    use crate::{TelemetryConfig, TelemetryError};

    /// Batch exporter to `endpoint`. Needs a running tokio runtime.
    pub(super) fn provider(
        config: &TelemetryConfig,
        endpoint: &str,
    ) -> Result<TracerProvider, TelemetryError> {
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint);

        opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .with_trace_config(
                trace::Config::default()
                    .with_sampler(Sampler::AlwaysOn)
                    .with_id_generator(RandomIdGenerator::default())
                    .with_resource(Resource::new(vec![
                        KeyValue::new("service.name", config.service_name.clone()),
                        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                        KeyValue::new("deployment.environment", config.environment.clone()),
                    ])),
            )
            .install_batch(runtime::Tokio)
            .map_err(|e| TelemetryError::Exporter(e.to_string()))
    }
}

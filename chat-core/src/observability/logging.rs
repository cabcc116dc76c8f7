use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("failed to initialize OTLP tracer: {0}")]
    Tracer(#[from] opentelemetry::trace::TraceError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Options for [`init_tracing`].
#[derive(Debug, Clone)]
pub struct TracingOptions<'a> {
    pub service_name: &'a str,
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: &'a str,
    /// JSON lines (production) or human-readable output (local runs).
    pub json: bool,
    /// OTLP gRPC collector, e.g. `http://tempo:4317`. Span export is off when `None`.
    pub otlp_endpoint: Option<&'a str>,
}

fn otlp_tracer(service_name: &str, endpoint: &str) -> Result<sdktrace::Tracer, ObservabilityError> {
    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(runtime::Tokio)?;

    Ok(tracer)
}

/// Install the global tracing subscriber.
///
/// Must be called from within a Tokio runtime when an OTLP endpoint is set.
pub fn init_tracing(options: &TracingOptions<'_>) -> Result<(), ObservabilityError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(options.log_level));

    let telemetry = match options.otlp_endpoint {
        Some(endpoint) => {
            let tracer = otlp_tracer(options.service_name, endpoint)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(telemetry);

    if options.json {
        registry
            .with(
                fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .flatten_event(true),
            )
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()?;
    }

    tracing::debug!(
        service = options.service_name,
        otlp = options.otlp_endpoint.is_some(),
        "Tracing initialized"
    );

    Ok(())
}

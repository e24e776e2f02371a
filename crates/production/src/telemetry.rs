//! Logging and OpenTelemetry initialization.
//!
//! Console logging is always installed. OTLP span export is added when an
//! endpoint is configured, so a node without a collector runs unchanged.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
    Resource,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Duration;
use thiserror::Error;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter: {0}")]
    ExporterBuild(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("Failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Invalid sampling ratio {0}, expected 0.0 to 1.0")]
    SamplingRatio(f64),
}

/// Configuration for telemetry.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for OTEL resource attributes.
    pub service_name: String,
    /// OTLP endpoint (e.g., "http://localhost:4317").
    pub otlp_endpoint: Option<String>,
    /// Sampling ratio (0.0 to 1.0).
    pub sampling_ratio: f64,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Additional resource attributes.
    pub resource_attributes: Vec<(String, String)>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "quorum-validator".to_string(),
            otlp_endpoint: None,
            sampling_ratio: 1.0,
            log_filter: "info,quorum=debug".to_string(),
            resource_attributes: vec![],
        }
    }
}

impl TelemetryConfig {
    fn validate(&self) -> Result<(), TelemetryError> {
        if (0.0..=1.0).contains(&self.sampling_ratio) {
            Ok(())
        } else {
            Err(TelemetryError::SamplingRatio(self.sampling_ratio))
        }
    }
}

/// Initialize logging, plus OTLP export when an endpoint is configured.
///
/// The exporter connects lazily; an unavailable collector never blocks or
/// fails startup. Spans buffer in the batch processor and the oldest are
/// dropped if it fills.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    config.validate()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    let (otel_layer, tracer_provider) = if let Some(endpoint) = &config.otlp_endpoint {
        let mut resource_attrs = vec![
            opentelemetry::KeyValue::new(SERVICE_NAME, config.service_name.clone()),
            opentelemetry::KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ];
        for (key, value) in &config.resource_attributes {
            resource_attrs.push(opentelemetry::KeyValue::new(key.clone(), value.clone()));
        }
        let resource = Resource::builder().with_attributes(resource_attrs).build();

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_sampler(Sampler::TraceIdRatioBased(config.sampling_ratio))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource)
            .build();

        let tracer = tracer_provider.tracer("quorum");

        (Some(OpenTelemetryLayer::new(tracer)), Some(tracer_provider))
    } else {
        (None, None)
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(TelemetryGuard { tracer_provider })
}

/// Guard that owns the tracer provider.
///
/// Call `shutdown().await` before exit to flush pending spans.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are exported to a collector.
    pub fn exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Flush pending spans, waiting up to 5 seconds.
    pub async fn shutdown(mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            let _ = tokio::time::timeout(
                Duration::from_secs(5),
                tokio::task::spawn_blocking(move || {
                    let _ = provider.shutdown();
                }),
            )
            .await;
        }
    }
}

//! Tracing subscriber and OpenTelemetry export.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::AppError;

const SERVICE_NAME: &str = "pantry-api";

/// Keeps the tracer provider alive until shutdown.
#[derive(Debug)]
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Installs JSON logging filtered by `RUST_LOG` (default `info`), plus an
    /// OTLP span exporter when `otlp_endpoint` is given.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telemetry` if the exporter cannot be built or a
    /// global subscriber is already installed.
    pub fn init(otlp_endpoint: Option<&str>) -> Result<Self, AppError> {
        let tracer_provider = otlp_endpoint.map(build_tracer_provider).transpose()?;

        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true);
        init_subscriber(fmt_layer, tracer_provider.as_ref())?;

        Ok(Self { tracer_provider })
    }

    /// Flushes pending spans and stops the exporter.
    pub fn shutdown(self) {
        let Some(provider) = self.tracer_provider else {
            return;
        };

        if let Err(e) = provider.shutdown() {
            tracing::error!(error = %e, "failed to shut down tracer provider");
        }
    }
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,h2=warn,hyper=warn,tonic=warn,sqlx=warn"))
}

fn build_tracer_provider(endpoint: &str) -> Result<SdkTracerProvider, AppError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| AppError::Telemetry(format!("failed to build OTLP exporter: {e}")))?;

    Ok(SdkTracerProvider::builder()
        .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
        .with_batch_exporter(exporter)
        .build())
}

fn init_subscriber<L>(
    fmt_layer: L,
    tracer_provider: Option<&SdkTracerProvider>,
) -> Result<(), AppError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter());

    let result = if let Some(provider) = tracer_provider {
        let tracer = provider.tracer(SERVICE_NAME);
        subscriber
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
    } else {
        subscriber.try_init()
    };

    result.map_err(|e| AppError::Telemetry(format!("failed to install subscriber: {e}")))
}

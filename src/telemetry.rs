use anyhow::Context;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self, Tracer};
use opentelemetry_sdk::Resource;
use secrecy::ExposeSecret;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap};
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::configuration::TelemetrySettings;

/// Installs the global subscriber: `RUST_LOG` (or `env_filter`) filtering, a
/// fmt layer writing to `sink`, and OTLP export when telemetry is enabled.
pub fn init_subscriber<Sink>(
    env_filter: String,
    sink: Sink,
    settings: &TelemetrySettings,
) -> anyhow::Result<()>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    LogTracer::init().context("Failed to set logger")?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let export_layer =
        otlp_tracer(settings)?.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let subscriber = Registry::default()
        .with(env_filter)
        .with(export_layer)
        .with(fmt::layer().with_writer(sink));
    set_global_default(subscriber).context("Failed to set subscriber")
}

/// Batch exporter tagged with `service.name`, or `None` when export is off.
pub fn otlp_tracer(settings: &TelemetrySettings) -> anyhow::Result<Option<Tracer>> {
    if !settings.enabled {
        return Ok(None);
    }
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        settings.service_name.clone(),
    )]);
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_metadata(export_metadata(settings)?)
                .with_endpoint(&settings.endpoint)
                .with_tls_config(Default::default()),
        )
        .with_trace_config(trace::config().with_resource(resource))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
        .context("Failed to install the OTLP tracer")?;
    Ok(Some(tracer))
}

fn export_metadata(settings: &TelemetrySettings) -> anyhow::Result<MetadataMap> {
    let mut metadata = MetadataMap::new();
    let api_key = settings.api_key.expose_secret();
    if api_key.is_empty() {
        return Ok(metadata);
    }
    let key = MetadataKey::<Ascii>::from_bytes(settings.api_key_header.as_bytes())
        .with_context(|| format!("Invalid telemetry header name {}", settings.api_key_header))?;
    metadata.insert(key, api_key.parse().context("Failed to parse telemetry api key")?);
    Ok(metadata)
}

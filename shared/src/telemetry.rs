//! Telemetry bootstrap.
//!
//! Wires traces, metrics and logs to an OpenTelemetry collector over OTLP and
//! mirrors every log event to stdout as a JSON line. `tracing` is the only
//! instrumentation API used by the services: spans become OTel spans and
//! events become both span events and OTel log records.

use anyhow::Result;
use opentelemetry::metrics::MeterProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{
    filter::LevelFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::{ExportProtocol, TelemetrySettings};
use crate::middleware::HttpMetrics;

/// Owns the telemetry providers. Dropping it flushes and shuts them down.
pub struct Telemetry {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
    http_metrics: HttpMetrics,
}

impl Telemetry {
    pub fn http_metrics(&self) -> HttpMetrics {
        self.http_metrics.clone()
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {e}");
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("Failed to shut down meter provider: {e}");
        }
        if let Err(e) = self.logger_provider.shutdown() {
            eprintln!("Failed to shut down logger provider: {e}");
        }
    }
}

/// Installs the global `tracing` subscriber and the W3C trace-context propagator.
///
/// Must be called once, from within the tokio runtime, before any request is served.
pub fn init_telemetry(settings: &TelemetrySettings) -> Result<Telemetry> {
    let resource = Resource::builder()
        .with_service_name(settings.service_name.clone())
        .with_attribute(KeyValue::new(
            "deployment.environment",
            settings.app_env.clone(),
        ))
        .build();

    let meter_provider = init_metrics(settings, resource.clone())?;
    let tracer_provider = init_tracing(settings, resource.clone())?;
    let logger_provider = init_logging(settings, resource)?;

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
    install_subscriber(settings, &tracer_provider, &logger_provider)?;

    let http_metrics = HttpMetrics::new(&meter_provider.meter("http-server"));

    Ok(Telemetry {
        tracer_provider,
        meter_provider,
        logger_provider,
        http_metrics,
    })
}

fn init_metrics(settings: &TelemetrySettings, resource: Resource) -> Result<SdkMeterProvider> {
    let mut builder = SdkMeterProvider::builder().with_resource(resource);

    if !settings.otlp_disabled {
        let endpoint = settings.signal_endpoint("metrics");
        let exporter = match settings.otlp_protocol {
            ExportProtocol::Grpc => MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?,
            ExportProtocol::Http => MetricExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()?,
        };
        builder = builder.with_reader(PeriodicReader::builder(exporter).build());
    }

    if settings.console_metrics {
        let exporter = opentelemetry_stdout::MetricExporter::default();
        builder = builder.with_reader(PeriodicReader::builder(exporter).build());
    }

    Ok(builder.build())
}

fn init_tracing(settings: &TelemetrySettings, resource: Resource) -> Result<SdkTracerProvider> {
    let mut builder = SdkTracerProvider::builder().with_resource(resource);

    if !settings.otlp_disabled {
        let endpoint = settings.signal_endpoint("traces");
        let exporter = match settings.otlp_protocol {
            ExportProtocol::Grpc => SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?,
            ExportProtocol::Http => SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()?,
        };
        builder = builder.with_batch_exporter(exporter);
    }

    Ok(builder.build())
}

fn init_logging(settings: &TelemetrySettings, resource: Resource) -> Result<SdkLoggerProvider> {
    let mut builder = SdkLoggerProvider::builder().with_resource(resource);

    if !settings.otlp_disabled {
        let endpoint = settings.signal_endpoint("logs");
        let exporter = match settings.otlp_protocol {
            ExportProtocol::Grpc => LogExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?,
            ExportProtocol::Http => LogExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()?,
        };
        builder = builder.with_batch_exporter(exporter);
    }

    Ok(builder.build())
}

fn install_subscriber(
    settings: &TelemetrySettings,
    tracer_provider: &SdkTracerProvider,
    logger_provider: &SdkLoggerProvider,
) -> Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let span_events = if settings.console_traces {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let console = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_span_events(span_events)
        .with_filter(console_filter);

    // Exporter transports log through `tracing` too; feeding those events back
    // into the exporter would loop.
    let export_filter = EnvFilter::new("info")
        .add_directive("hyper=off".parse()?)
        .add_directive("h2=off".parse()?)
        .add_directive("tonic=off".parse()?)
        .add_directive("tower=off".parse()?)
        .add_directive("reqwest=off".parse()?)
        .add_directive("opentelemetry=off".parse()?);
    let logs = OpenTelemetryTracingBridge::new(logger_provider).with_filter(export_filter);

    let tracer = tracer_provider.tracer(settings.service_name.clone());
    let traces = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(LevelFilter::INFO);

    tracing_subscriber::registry()
        .with(console)
        .with(logs)
        .with(traces)
        .try_init()?;

    Ok(())
}

/// Marks the current span as failed.
///
/// The span must declare `otel.status_code` and `otel.status_description` fields.
pub fn mark_span_error(message: impl std::fmt::Display) {
    let span = tracing::Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_description", message.to_string().as_str());
}

pub fn mark_span_ok() {
    tracing::Span::current().record("otel.status_code", "OK");
}

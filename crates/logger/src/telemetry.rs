// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Result};
use cv_config::AppConfig;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "confidential-value";

/// Parses a configured level such as `info` or `DEBUG`
pub fn parse_level(value: &str) -> Result<Level> {
    Level::from_str(value.trim()).map_err(|_| anyhow!("Unknown log level '{value}'"))
}

/// `RUST_LOG` wins when set, otherwise everything at `log_level` and above
fn filter(log_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy()
}

/// Installs a plain fmt subscriber. Does nothing if one is already installed.
pub fn setup_simple_tracing(log_level: Level) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter(log_level))
        .try_init();
}

/// Installs the fmt subscriber at the configured `log_level` and, when `otel` is configured,
/// an OTLP span exporter
pub fn setup_tracing(config: &AppConfig) -> Result<()> {
    let log_level = parse_level(&config.log_level)?;
    match config.otel.as_deref() {
        Some(endpoint) => {
            let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc)
                .build()?;

            let service_name =
                std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
            let resource = Resource::builder().with_service_name(service_name).build();

            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(otlp_exporter)
                .with_resource(resource)
                .build();

            let tracer = provider.tracer("cv");
            let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(telemetry)
                .with(filter(log_level))
                .try_init()?;
        }
        None => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(filter(log_level))
                .try_init()?;
        }
    }

    Ok(())
}

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::ServiceIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportProtocol {
    Grpc,
    Http,
}

/// Identity and collector settings shared by every service binary.
#[derive(Debug, Clone, Args)]
pub struct TelemetrySettings {
    #[arg(long, env = "APP_ENV")]
    pub app_env: String,

    #[arg(long, env = "SERVICE_NAME")]
    pub service_name: String,

    #[arg(long, env = "OTLP_GRPC_ENDPOINT", default_value = "http://localhost:4317")]
    pub otlp_grpc_endpoint: String,

    #[arg(long, env = "OTLP_HTTP_ENDPOINT", default_value = "http://localhost:4318")]
    pub otlp_http_endpoint: String,

    #[arg(long, env = "OTLP_PROTOCOL", value_enum, default_value_t = ExportProtocol::Grpc)]
    pub otlp_protocol: ExportProtocol,

    #[arg(long, env = "OTLP_DISABLED")]
    pub otlp_disabled: bool,

    #[arg(long, env = "CONSOLE_METRICS")]
    pub console_metrics: bool,

    #[arg(long, env = "CONSOLE_TRACES")]
    pub console_traces: bool,
}

impl TelemetrySettings {
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            service_name: self.service_name.clone(),
            environment: self.app_env.clone(),
        }
    }

    /// Endpoint for one OTLP signal (`traces`, `metrics` or `logs`).
    ///
    /// gRPC exporters take the collector root; HTTP exporters need the full signal path.
    pub fn signal_endpoint(&self, signal: &str) -> String {
        match self.otlp_protocol {
            ExportProtocol::Grpc => self.otlp_grpc_endpoint.clone(),
            ExportProtocol::Http => format!(
                "{}/v1/{}",
                self.otlp_http_endpoint.trim_end_matches('/'),
                signal
            ),
        }
    }
}

/// Loads an env file into the process environment before argument parsing.
///
/// `ENV_FILE` names the file explicitly and must exist. Otherwise
/// `config/<APP_ENV>.env` is tried and skipped when absent. Variables already
/// set in the environment are never overridden.
pub fn load_env_file() -> Result<Option<PathBuf>, dotenvy::Error> {
    if let Ok(path) = std::env::var("ENV_FILE") {
        let path = PathBuf::from(path);
        dotenvy::from_path(&path)?;
        return Ok(Some(path));
    }

    let Ok(app_env) = std::env::var("APP_ENV") else {
        return Ok(None);
    };
    let path = PathBuf::from(format!("config/{app_env}.env"));
    match dotenvy::from_path(&path) {
        Ok(()) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

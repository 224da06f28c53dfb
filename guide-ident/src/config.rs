//! Service configuration
//!
//! Settings resolve command-line → environment → config file → default.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use guide_common::config::{load_toml_config, resolve_string, resolve_u64};

const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_DIRECTORY_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_LISTEN_PORT: u64 = 5810;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROBE_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "guide-ident", about = "Photo identification microservice")]
pub struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the remote photo classifier
    #[arg(long, env = "GUIDE_CLASSIFIER_URL")]
    pub classifier_url: Option<String>,

    /// Base URL of the guide backend serving the landmark catalog
    #[arg(long, env = "GUIDE_DIRECTORY_URL")]
    pub directory_url: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Log filter (e.g. "info", "guide_ident=debug")
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub classifier_url: String,
    pub directory_url: String,
    pub listen_port: u16,
    pub request_timeout: Duration,
    pub probe_addr: String,
    pub probe_interval: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve configuration from all sources
    pub fn resolve(args: &Args) -> guide_common::Result<Self> {
        let toml = load_toml_config(args.config.as_deref())?;

        let classifier_url = resolve_string(
            args.classifier_url.as_deref(),
            "GUIDE_CLASSIFIER_URL",
            toml.classifier_url.as_deref(),
            DEFAULT_CLASSIFIER_URL,
        );
        let directory_url = resolve_string(
            args.directory_url.as_deref(),
            "GUIDE_DIRECTORY_URL",
            toml.directory_url.as_deref(),
            DEFAULT_DIRECTORY_URL,
        );
        let listen_port = resolve_u64(
            args.port.map(u64::from),
            "GUIDE_LISTEN_PORT",
            toml.listen_port.map(u64::from),
            DEFAULT_LISTEN_PORT,
        ) as u16;
        let request_timeout = Duration::from_secs(resolve_u64(
            None,
            "GUIDE_REQUEST_TIMEOUT_SECS",
            toml.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let probe_addr = resolve_string(
            None,
            "GUIDE_PROBE_ADDR",
            toml.probe_addr.as_deref(),
            DEFAULT_PROBE_ADDR,
        );
        let probe_interval = Duration::from_secs(resolve_u64(
            None,
            "GUIDE_PROBE_INTERVAL_SECS",
            toml.probe_interval_secs,
            DEFAULT_PROBE_INTERVAL_SECS,
        ));
        let log_level = resolve_string(
            args.log_level.as_deref(),
            "GUIDE_LOG_LEVEL",
            toml.log_level.as_deref(),
            DEFAULT_LOG_LEVEL,
        );

        Ok(Self {
            classifier_url,
            directory_url,
            listen_port,
            request_timeout,
            probe_addr,
            probe_interval,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            config: Some(PathBuf::from("/nonexistent/guide.toml")),
            classifier_url: None,
            directory_url: None,
            port: None,
            log_level: None,
        }
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let config = ServiceConfig::resolve(&bare_args()).unwrap();
        assert_eq!(config.classifier_url, DEFAULT_CLASSIFIER_URL);
        assert_eq!(config.listen_port, 5810);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn cli_beats_defaults() {
        let mut args = bare_args();
        args.classifier_url = Some("http://classifier.local".to_string());
        args.port = Some(9000);
        let config = ServiceConfig::resolve(&args).unwrap();
        assert_eq!(config.classifier_url, "http://classifier.local");
        assert_eq!(config.listen_port, 9000);
    }
}

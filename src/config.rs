//! Configuration for the radar server
//!
//! CLI arguments with environment variable fallbacks. A `.env` file in the
//! working directory is loaded first by the binary.

use crate::classification::Scheme;
use crate::procurement::DOFFIN_BASE_URL;
use crate::ssb::{ClassificationSource, SsbClient, SSB_BASE_URL};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Norwegian procurement radar: Doffin notices filtered by SSB classifications
#[derive(Parser, Debug, Clone)]
#[command(name = "radar-server")]
#[command(about = "JSON API over Doffin notices and SSB NUTS/STYRK classifications")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "RADAR_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Doffin subscription key. Notice search is disabled without it.
    #[arg(long, env = "DOFFIN_API_KEY", hide_env_values = true)]
    pub doffin_api_key: Option<String>,

    #[arg(long, env = "DOFFIN_BASE_URL", default_value = DOFFIN_BASE_URL)]
    pub doffin_base_url: String,

    /// KLASS versions endpoint
    #[arg(long, env = "SSB_BASE_URL", default_value = SSB_BASE_URL)]
    pub ssb_base_url: String,

    /// KLASS version holding the NUTS classification
    #[arg(long, env = "NUTS_VERSION", default_value_t = Scheme::Geography.default_version())]
    pub nuts_version: u32,

    /// KLASS version holding the STYRK classification
    #[arg(long, env = "STYRK_VERSION", default_value_t = Scheme::Occupation.default_version())]
    pub styrk_version: u32,

    /// Read NUTS from a local KLASS CSV export instead of fetching it
    #[arg(long, env = "NUTS_FILE")]
    pub nuts_file: Option<PathBuf>,

    /// Read STYRK from a local KLASS CSV export instead of fetching it
    #[arg(long, env = "STYRK_FILE")]
    pub styrk_file: Option<PathBuf>,

    /// Seconds between classification refreshes (0 disables refreshing)
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "0")]
    pub refresh_interval_secs: u64,

    /// Timeout for outbound SSB and Doffin requests, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than 0".to_string());
        }

        for (name, file) in [("NUTS_FILE", &self.nuts_file), ("STYRK_FILE", &self.styrk_file)] {
            if let Some(path) = file {
                if !path.is_file() {
                    return Err(format!("{name} {} does not exist", path.display()));
                }
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn doffin_api_key(&self) -> Option<&str> {
        self.doffin_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn version(&self, scheme: Scheme) -> u32 {
        match scheme {
            Scheme::Geography => self.nuts_version,
            Scheme::Occupation => self.styrk_version,
        }
    }

    pub fn file(&self, scheme: Scheme) -> Option<&PathBuf> {
        match scheme {
            Scheme::Geography => self.nuts_file.as_ref(),
            Scheme::Occupation => self.styrk_file.as_ref(),
        }
    }

    /// Local file when configured, otherwise the KLASS version
    pub fn source(&self, scheme: Scheme, client: &SsbClient) -> ClassificationSource {
        match self.file(scheme) {
            Some(path) => ClassificationSource::File(path.clone()),
            None => ClassificationSource::Remote {
                client: client.clone(),
                version: self.version(scheme),
            },
        }
    }
}

//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache byte budget enforced by eviction
    pub max_cache_size: u64,
    /// Default TTL in seconds for cache writes that omit one
    pub default_ttl: u64,
    /// Interval in seconds between expiry sweeps
    pub sweep_interval: u64,
    /// Default retry budget for queued actions
    pub max_retries: u32,
    /// Maximum number of archived exhausted actions
    pub dead_letter_capacity: usize,
    /// Loopback HTTP port
    pub server_port: u16,
    /// Root directory for persisted records
    pub data_dir: String,
    /// Backend base URL used by the HTTP transport
    pub api_base_url: String,
    /// Per-request transport timeout in seconds
    pub transport_timeout: u64,
    /// host:port dialed by the connectivity probe
    pub probe_addr: String,
    /// Interval in seconds between connectivity probes
    pub probe_interval: u64,
    /// Connect timeout in seconds for a single reachability check
    pub probe_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_SIZE` - Cache budget in bytes (default: 50 MB)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 3600)
    /// - `MAX_RETRIES` - Default action retry budget (default: 3)
    /// - `DEAD_LETTER_CAPACITY` - Archived failures kept (default: 100)
    /// - `SERVER_PORT` - HTTP facade port (default: 3000)
    /// - `DATA_DIR` - Storage directory (default: ./offline_data)
    /// - `API_BASE_URL` - Backend base URL (default: http://localhost:8080)
    /// - `TRANSPORT_TIMEOUT` - Request timeout in seconds (default: 30)
    /// - `PROBE_ADDR` - Connectivity probe target (default: localhost:8080)
    /// - `PROBE_INTERVAL` - Probe frequency in seconds (default: 5)
    /// - `PROBE_TIMEOUT` - Connect timeout per check in seconds (default: 2)
    ///
    /// Intervals and timeouts must be positive; a zero value falls back to
    /// the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cache_size: env_parse("MAX_CACHE_SIZE", defaults.max_cache_size),
            default_ttl: env_parse("DEFAULT_TTL", defaults.default_ttl),
            sweep_interval: env_parse_nonzero("SWEEP_INTERVAL", defaults.sweep_interval),
            max_retries: env_parse("MAX_RETRIES", defaults.max_retries),
            dead_letter_capacity: env_parse("DEAD_LETTER_CAPACITY", defaults.dead_letter_capacity),
            server_port: env_parse("SERVER_PORT", defaults.server_port),
            data_dir: env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            transport_timeout: env_parse_nonzero("TRANSPORT_TIMEOUT", defaults.transport_timeout),
            probe_addr: env::var("PROBE_ADDR").unwrap_or(defaults.probe_addr),
            probe_interval: env_parse_nonzero("PROBE_INTERVAL", defaults.probe_interval),
            probe_timeout: env_parse_nonzero("PROBE_TIMEOUT", defaults.probe_timeout),
        }
    }

    /// Default TTL as milliseconds.
    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl.saturating_mul(1000)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_secs(self.transport_timeout)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_size: 50 * 1024 * 1024,
            default_ttl: 3600,
            sweep_interval: 3600,
            max_retries: 3,
            dead_letter_capacity: 100,
            server_port: 3000,
            data_dir: "./offline_data".to_string(),
            api_base_url: "http://localhost:8080".to_string(),
            transport_timeout: 30,
            probe_addr: "localhost:8080".to_string(),
            probe_interval: 5,
            probe_timeout: 2,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parse_nonzero(key: &str, default: u64) -> u64 {
    nonzero_or(key, env_parse(key, default), default)
}

fn nonzero_or(key: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        warn!("{} must be greater than zero, using {}", key, default);
        default
    } else {
        value
    }
}

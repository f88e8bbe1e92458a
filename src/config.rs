//! Gateway configuration, loaded from the process environment (after `.env`).

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_NODE_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_DATA_PATH: &str = "./wallet_data";

/// Payment requests stay pending for 7 days unless settled.
pub const DEFAULT_REQUEST_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_EXPIRY_SWEEP_SECS: u64 = 60 * 60;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid bind address: {0}")]
    InvalidBindAddr(String),
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub node_rpc_url: String,
    pub rpc_timeout: Duration,
    pub mock_fallback: bool,
    pub data_path: String,
    pub request_ttl: Duration,
    pub expiry_sweep_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            node_rpc_url: DEFAULT_NODE_RPC_URL.to_string(),
            rpc_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            mock_fallback: true,
            data_path: DEFAULT_DATA_PATH.to_string(),
            request_ttl: Duration::from_secs(DEFAULT_REQUEST_TTL_SECS),
            expiry_sweep_interval: Duration::from_secs(DEFAULT_EXPIRY_SWEEP_SECS),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep their
    /// defaults; set-but-malformed keys are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidBindAddr(raw))?,
            None => defaults.bind_addr,
        };

        let node_rpc_url = lookup("NODE_RPC_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.node_rpc_url);

        let data_path = lookup("DATA_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.data_path);

        Ok(Self {
            bind_addr,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            node_rpc_url,
            rpc_timeout: parse_period_or(&lookup, "RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?,
            mock_fallback: parse_bool_or(&lookup, "MOCK_FALLBACK", defaults.mock_fallback)?,
            data_path,
            request_ttl: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TTL_SECS",
                DEFAULT_REQUEST_TTL_SECS,
            )?),
            expiry_sweep_interval: parse_period_or(
                &lookup,
                "EXPIRY_SWEEP_SECS",
                DEFAULT_EXPIRY_SWEEP_SECS,
            )?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

/// Whole seconds that must be non-zero (timer periods and timeouts).
fn parse_period_or<F>(lookup: &F, key: &'static str, default_secs: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default_secs)? {
        0 => Err(ConfigError::InvalidValue { key, value: "0".to_string() }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_bool_or<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = GatewayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.node_rpc_url, "http://localhost:8545");
        assert!(config.mock_fallback);
        assert_eq!(config.request_ttl, Duration::from_secs(604_800));
        assert_eq!(config.expiry_sweep_interval, Duration::from_secs(3600));
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("PORT", "7070"),
            ("BIND_ADDR", "127.0.0.1"),
            ("NODE_RPC_URL", "http://node:9000"),
            ("MOCK_FALLBACK", "off"),
            ("REQUEST_TTL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:7070");
        assert_eq!(config.node_rpc_url, "http://node:9000");
        assert!(!config.mock_fallback);
        assert_eq!(config.request_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue { key: "PORT", value: "eighty".to_string() }
        );

        let err = GatewayConfig::from_lookup(lookup_from(&[("MOCK_FALLBACK", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MOCK_FALLBACK", .. }));

        let err = GatewayConfig::from_lookup(lookup_from(&[("BIND_ADDR", "localhost:1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr(_)));
    }

    #[test]
    fn test_zero_periods_are_rejected() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("EXPIRY_SWEEP_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "EXPIRY_SWEEP_SECS", .. }));

        let err = GatewayConfig::from_lookup(lookup_from(&[("RPC_TIMEOUT_SECS", " 0 ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "RPC_TIMEOUT_SECS", .. }));

        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("EXPIRY_SWEEP_SECS", "5"),
            ("RPC_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.expiry_sweep_interval, Duration::from_secs(5));
        assert_eq!(config.rpc_timeout, Duration::from_secs(3));
    }
}

// =============================================================================
// CN DASHBOARD — config.rs
// Environment configuration
// =============================================================================
//
//   CN_BIND_ADDR          listen address            (0.0.0.0:8080)
//   CN_NATIONS_SOURCE     nation stats path or URL  (unset)
//   CN_WARS_SOURCE        war stats path or URL     (unset)
//   CN_SNAPSHOT_TTL_SECS  snapshot freshness window (3600)
//   CN_DOWNLOAD_ATTEMPTS  download retries          (3)
// =============================================================================

use crate::snapshot::DEFAULT_SNAPSHOT_TTL_SECS;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DOWNLOAD_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid CN_BIND_ADDR '{0}'")]
    BindAddr(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub nations: Option<String>,
    pub wars: Option<String>,
    pub download_attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub sources: SourceConfig,
    pub snapshot_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("CN_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::BindAddr(raw_addr.clone()))?;

        let source = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(AppConfig {
            bind_addr,
            sources: SourceConfig {
                nations: source("CN_NATIONS_SOURCE"),
                wars: source("CN_WARS_SOURCE"),
                download_attempts: parse_or_default(
                    &lookup,
                    "CN_DOWNLOAD_ATTEMPTS",
                    DEFAULT_DOWNLOAD_ATTEMPTS,
                ),
            },
            snapshot_ttl_secs: parse_or_default(
                &lookup,
                "CN_SNAPSHOT_TTL_SECS",
                DEFAULT_SNAPSHOT_TTL_SECS,
            ),
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("{} ignored (not a number): {}; using {}", key, raw, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.sources.nations, None);
        assert_eq!(cfg.sources.download_attempts, DEFAULT_DOWNLOAD_ATTEMPTS);
        assert_eq!(cfg.snapshot_ttl_secs, DEFAULT_SNAPSHOT_TTL_SECS);
    }

    #[test]
    fn test_overrides() {
        let cfg = config_from(&[
            ("CN_BIND_ADDR", "127.0.0.1:9000"),
            ("CN_NATIONS_SOURCE", " https://example.org/nations.zip "),
            ("CN_WARS_SOURCE", ""),
            ("CN_SNAPSHOT_TTL_SECS", "120"),
            ("CN_DOWNLOAD_ATTEMPTS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.sources.nations.as_deref(), Some("https://example.org/nations.zip"));
        assert_eq!(cfg.sources.wars, None);
        assert_eq!(cfg.snapshot_ttl_secs, 120);
        assert_eq!(cfg.sources.download_attempts, 5);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let cfg = config_from(&[("CN_SNAPSHOT_TTL_SECS", "soon")]).unwrap();
        assert_eq!(cfg.snapshot_ttl_secs, DEFAULT_SNAPSHOT_TTL_SECS);
    }

    #[test]
    fn test_bad_bind_addr() {
        assert_eq!(
            config_from(&[("CN_BIND_ADDR", "nowhere")]),
            Err(ConfigError::BindAddr("nowhere".into()))
        );
    }
}

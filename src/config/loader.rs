//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::TrackerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: {:?}", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<TrackerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => TrackerConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut TrackerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let port: u16 = parse_env("PORT", &port)?;
        let host = config
            .server
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind_address = format!("{}:{}", host, port);
    }
    if let Some(url) = lookup("PORT_OF_LONDON") {
        config.upstreams.vessels_url = url;
    }
    if let Some(url) = lookup("TOWER_BRIDGE") {
        config.upstreams.bridge_url = url;
    }
    if let Some(addr) = lookup("REDIS_ADDRESS") {
        config.cache.redis_address = addr;
    }
    if let Some(size) = lookup("FALLBACK_CACHE_SIZE") {
        config.cache.fallback_size = parse_env("FALLBACK_CACHE_SIZE", &size)?;
    }
    if let Some(ttl) = lookup("FALLBACK_CACHE_TTL_SECONDS") {
        config.cache.fallback_ttl_secs = parse_env("FALLBACK_CACHE_TTL_SECONDS", &ttl)?;
    }
    if let Some(max) = lookup("CB_MAX_FAILURES") {
        config.circuit_breaker.max_failures = parse_env("CB_MAX_FAILURES", &max)?;
    }
    if let Some(secs) = lookup("CB_COOL_OFF_SECONDS") {
        config.circuit_breaker.cool_off_secs = parse_env("CB_COOL_OFF_SECONDS", &secs)?;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_toml() {
        let config: TrackerConfig = toml::from_str(
            r#"
            [upstreams]
            vessels_url = "https://pla.example/api"
            bridge_url = "https://bridge.example/lifts"

            [cache]
            fallback_size = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.fallback_size, 42);
        assert_eq!(config.cache.bridge_ttl_secs, 900);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.filter.threshold, 4);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("REDIS_ADDRESS", ""),
            ("CB_MAX_FAILURES", "7"),
            ("TOWER_BRIDGE", "https://bridge.example/"),
        ]
        .into_iter()
        .collect();

        let mut config = TrackerConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.cache.redis_address, "");
        assert_eq!(config.circuit_breaker.max_failures, 7);
        assert_eq!(config.upstreams.bridge_url, "https://bridge.example/");
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = TrackerConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == "FALLBACK_CACHE_SIZE").then(|| "lots".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, ConfigError::Env { var: "FALLBACK_CACHE_SIZE", .. }));
    }
}

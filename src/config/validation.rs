//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes > 0, percentile within (0, 1])
//! - Check upstream URLs and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrackerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::TrackerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("filter.percentile must be within (0, 1], got {0}")]
    Percentile(f64),

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0}")]
    LogFormat(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &TrackerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "upstreams.vessels_url", &config.upstreams.vessels_url);
    check_url(&mut errors, "upstreams.bridge_url", &config.upstreams.bridge_url);

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positive = [
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("upstreams.request_timeout_secs", config.upstreams.request_timeout_secs),
        ("upstreams.max_bridge_pages", config.upstreams.max_bridge_pages as u64),
        ("cache.fallback_size", config.cache.fallback_size as u64),
        ("cache.fallback_ttl_secs", config.cache.fallback_ttl_secs),
        ("cache.bridge_ttl_secs", config.cache.bridge_ttl_secs),
        ("cache.vessels_ttl_secs", config.cache.vessels_ttl_secs),
        ("circuit_breaker.max_failures", config.circuit_breaker.max_failures as u64),
        ("retry.max_attempts", config.retry.max_attempts as u64),
        ("filter.max_count", config.filter.max_count as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let p = config.filter.percentile;
    if !(p > 0.0 && p <= 1.0) {
        errors.push(ValidationError::Percentile(p));
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::LogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Missing { field });
    } else if Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.upstreams.vessels_url = "https://pla.example/api/ships".into();
        config.upstreams.bridge_url = "https://bridge.example/lift-times".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_default_config_requires_upstream_urls() {
        let errors = validate_config(&TrackerConfig::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::Missing { field: "upstreams.vessels_url" }));
        assert!(errors.contains(&ValidationError::Missing { field: "upstreams.bridge_url" }));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid();
        config.cache.fallback_size = 0;
        config.filter.percentile = 1.5;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::Zero { field: "cache.fallback_size" }));
        assert!(errors.contains(&ValidationError::Percentile(1.5)));
    }
}

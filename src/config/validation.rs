//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and addresses
//! - Decode every route's environment rules and compile their patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::context::{ConfigMapper, JsonMapper};
use crate::environment::ResolveError;

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("route name must not be empty")]
    EmptyRouteName,

    #[error("duplicate route name `{0}`")]
    DuplicateRoute(String),

    #[error("resolver.default_environment must not be empty")]
    EmptyDefaultEnvironment,

    #[error("resolver.regex_size_limit must be greater than zero")]
    ZeroRegexSizeLimit,

    #[error("route `{route}`: {source}")]
    Environment {
        route: String,
        #[source]
        source: ResolveError,
    },
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.resolver.default_environment.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultEnvironment);
    }

    if config.resolver.regex_size_limit == 0 {
        errors.push(ValidationError::ZeroRegexSizeLimit);
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName);
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        let Some(raw) = &route.environment else {
            continue;
        };

        let rules = match JsonMapper.to_resolver_configuration(raw) {
            Ok(decoded) => decoded.rules(),
            Err(e) => {
                errors.push(ValidationError::Environment {
                    route: route.name.clone(),
                    source: ResolveError::ConfigurationDecode(e),
                });
                continue;
            }
        };

        // Zero limit is reported above; skip compiling against it.
        if config.resolver.regex_size_limit == 0 {
            continue;
        }

        for rule in rules {
            if let Err(source) = rule.compile(config.resolver.regex_size_limit) {
                errors.push(ValidationError::Environment {
                    route: route.name.clone(),
                    source,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

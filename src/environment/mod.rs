//! Request environment resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, headers, path) + route's raw configuration
//!     → resolver.rs (write default, decode via Context mapper)
//!     → config.rs (validity checks, lower to ordered rules)
//!     → rule.rs (read input, case-insensitive search, extract group)
//!     → patterns.rs (compiled patterns reused across requests)
//!     → attributes.rs (ARCHURA_REQUEST_ENVIRONMENT overwritten per match)
//! ```
//!
//! # Design Decisions
//! - Rules run host → header → path; every match overwrites, so path wins
//! - The default sentinel is written first and is never removed
//! - Broken route setup (decode, regex, unknown group) is an error, not a default

pub mod attributes;
pub mod config;
pub mod error;
pub mod patterns;
pub mod resolver;
pub mod rule;

pub use attributes::{Attributes, ATTRIBUTE_ENVIRONMENT};
pub use config::{HeaderRule, HostRule, PathRule, RawConfiguration, ResolverConfiguration};
pub use error::ResolveError;
pub use patterns::PatternCache;
pub use resolver::{
    EnvironmentResolver, Resolution, ResolverSettings, DEFAULT_ENVIRONMENT,
    DEFAULT_REGEX_SIZE_LIMIT,
};
pub use rule::{RequestFacts, Rule, RuleKind, RuleSource};

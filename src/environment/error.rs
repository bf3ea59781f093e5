//! Resolver error definitions.

use thiserror::Error;

use crate::environment::rule::RuleKind;

/// Errors surfaced by [`EnvironmentResolver::resolve`].
///
/// All of them point at a broken route setup. Missing inputs and
/// non-matching rules are not errors.
///
/// [`EnvironmentResolver::resolve`]: crate::environment::EnvironmentResolver::resolve
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Raw configuration could not be converted to `ResolverConfiguration`.
    #[error("invalid environment configuration: {0}")]
    ConfigurationDecode(#[source] serde_json::Error),

    /// An operator-supplied pattern failed to compile.
    #[error("{rule} rule regex `{pattern}` is invalid: {source}")]
    RegexCompile {
        rule: RuleKind,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `groupName` names a capture group the pattern does not declare.
    #[error("{rule} rule regex has no capture group named `{group}`")]
    UnknownGroup { rule: RuleKind, group: String },
}

//! Resolver configuration model.
//!
//! The gateway hands the resolver an untyped key/value table per route. It is
//! decoded into [`ResolverConfiguration`] on every request through the
//! context's [`ConfigMapper`](crate::context::ConfigMapper).
//!
//! Every field is optional at the serde level so that a partially filled
//! sub-rule decodes fine and is then skipped by the validity checks below,
//! instead of failing the whole request.

use serde::{Deserialize, Serialize};

use crate::environment::rule::{Rule, RuleSource};

/// Untyped resolver configuration as carried by a route.
pub type RawConfiguration = serde_json::Map<String, serde_json::Value>;

/// Structured resolver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfiguration {
    /// Rule matched against the `Host` header.
    #[serde(default)]
    pub host: Option<HostRule>,

    /// Rule matched against the first value of a named header.
    #[serde(default)]
    pub header: Option<HeaderRule>,

    /// Rule matched against the request path (query excluded).
    #[serde(default)]
    pub path: Option<PathRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HostRule {
    #[serde(default)]
    pub regex: Option<String>,

    /// Empty means "use the whole match".
    #[serde(default, alias = "group_name")]
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeaderRule {
    /// Header whose first value is matched.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub regex: Option<String>,

    #[serde(default, alias = "group_name")]
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PathRule {
    #[serde(default)]
    pub regex: Option<String>,

    #[serde(default, alias = "group_name")]
    pub group_name: Option<String>,
}

fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

impl HostRule {
    pub fn is_valid(&self) -> bool {
        matches!(
            (&self.regex, &self.group_name),
            (Some(regex), Some(_)) if not_blank(regex)
        )
    }
}

impl HeaderRule {
    pub fn is_valid(&self) -> bool {
        matches!(
            (&self.name, &self.regex, &self.group_name),
            (Some(name), Some(regex), Some(_)) if not_blank(name) && not_blank(regex)
        )
    }
}

impl PathRule {
    pub fn is_valid(&self) -> bool {
        matches!(
            (&self.regex, &self.group_name),
            (Some(regex), Some(_)) if not_blank(regex)
        )
    }
}

impl ResolverConfiguration {
    /// Lower the configuration into rule descriptors in evaluation order
    /// (host, header, path). Invalid sub-rules are left out.
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules = Vec::with_capacity(3);

        if let Some(host) = self.host.as_ref().filter(|h| h.is_valid()) {
            rules.push(Rule::new(
                RuleSource::Host,
                host.regex.clone().unwrap_or_default(),
                host.group_name.clone().unwrap_or_default(),
            ));
        }

        if let Some(header) = self.header.as_ref().filter(|h| h.is_valid()) {
            rules.push(Rule::new(
                RuleSource::Header(header.name.clone().unwrap_or_default()),
                header.regex.clone().unwrap_or_default(),
                header.group_name.clone().unwrap_or_default(),
            ));
        }

        if let Some(path) = self.path.as_ref().filter(|p| p.is_valid()) {
            rules.push(Rule::new(
                RuleSource::Path,
                path.regex.clone().unwrap_or_default(),
                path.group_name.clone().unwrap_or_default(),
            ));
        }

        rules
    }
}

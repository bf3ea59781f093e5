//! Rule descriptors and the matching routine shared by all rule kinds.

use std::fmt;

use axum::http::{HeaderMap, Request, Uri};
use regex::{Regex, RegexBuilder};

use crate::environment::error::ResolveError;
use crate::environment::patterns::PatternCache;

/// Header carrying the request host.
pub const HOST_HEADER_NAME: &str = "host";

/// Which rule produced a value. Used for errors, logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Host,
    Header,
    Path,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Host => "host",
            RuleKind::Header => "header",
            RuleKind::Path => "path",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a rule reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Host,
    Header(String),
    Path,
}

impl RuleSource {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleSource::Host => RuleKind::Host,
            RuleSource::Header(_) => RuleKind::Header,
            RuleSource::Path => RuleKind::Path,
        }
    }
}

/// Immutable request facts the rules read from.
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    headers: &'a HeaderMap,
    uri: &'a Uri,
}

impl<'a> RequestFacts<'a> {
    pub fn new(headers: &'a HeaderMap, uri: &'a Uri) -> Self {
        Self { headers, uri }
    }

    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self::new(req.headers(), req.uri())
    }

    /// Input string for `source`, or `None` when the request does not carry it.
    /// Header values that are not valid UTF-8 count as absent.
    pub fn input(&self, source: &RuleSource) -> Option<&'a str> {
        match source {
            RuleSource::Host => self.host(),
            RuleSource::Header(name) => self.first_header(name),
            RuleSource::Path => Some(self.path()),
        }
    }

    /// First `Host` header value, else the URI authority. HTTP/2 requests
    /// carry the host only as `:authority`.
    pub fn host(&self) -> Option<&'a str> {
        self.first_header(HOST_HEADER_NAME)
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
    }

    /// Request path without the query string.
    pub fn path(&self) -> &'a str {
        self.uri.path()
    }

    fn first_header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A single extraction rule: read an input, search it, pull out a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    source: RuleSource,
    regex: String,
    group_name: String,
}

impl Rule {
    pub fn new(source: RuleSource, regex: impl Into<String>, group_name: impl Into<String>) -> Self {
        Self {
            source,
            regex: regex.into(),
            group_name: group_name.into(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.source.kind()
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// Named group to extract, or `None` for the whole match.
    pub fn group(&self) -> Option<&str> {
        if self.group_name.trim().is_empty() {
            None
        } else {
            Some(self.group_name.as_str())
        }
    }

    /// Compile the pattern case-insensitively within `size_limit` and check
    /// that the requested group exists.
    pub fn compile(&self, size_limit: usize) -> Result<Regex, ResolveError> {
        let regex = RegexBuilder::new(&self.regex)
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()
            .map_err(|source| ResolveError::RegexCompile {
                rule: self.kind(),
                pattern: self.regex.clone(),
                source,
            })?;

        self.check_group(&regex)?;
        Ok(regex)
    }

    /// Fail when the requested group is not declared by `regex`.
    pub fn check_group(&self, regex: &Regex) -> Result<(), ResolveError> {
        match self.group() {
            Some(group) if !regex.capture_names().flatten().any(|name| name == group) => {
                Err(ResolveError::UnknownGroup {
                    rule: self.kind(),
                    group: group.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Evaluate against the request. `Ok(None)` when the input is absent,
    /// nothing matches, or the named group did not take part in the match.
    pub fn evaluate(
        &self,
        facts: &RequestFacts<'_>,
        patterns: &PatternCache,
    ) -> Result<Option<String>, ResolveError> {
        let Some(input) = facts.input(&self.source) else {
            return Ok(None);
        };

        let regex = patterns.get_or_compile(self)?;
        let Some(captures) = regex.captures(input) else {
            return Ok(None);
        };

        let matched = match self.group() {
            Some(group) => captures.name(group),
            None => captures.get(0),
        };
        Ok(matched.map(|m| m.as_str().to_string()))
    }
}

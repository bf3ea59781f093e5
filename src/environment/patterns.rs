//! Compiled rule patterns shared across requests.
//!
//! # Design Decisions
//! - Keyed by pattern source; compilation is case-insensitive for every rule,
//!   so the source alone identifies the compiled program
//! - Compile errors are never stored; a broken pattern fails on every request
//! - Bounded: past [`MAX_CACHED_PATTERNS`] entries new patterns are compiled
//!   per call instead of stored

use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;

use crate::environment::error::ResolveError;
use crate::environment::resolver::DEFAULT_REGEX_SIZE_LIMIT;
use crate::environment::rule::Rule;

/// Upper bound on distinct stored patterns.
pub const MAX_CACHED_PATTERNS: usize = 1024;

/// Memo of compiled patterns, cheap to clone.
#[derive(Debug, Clone)]
pub struct PatternCache {
    size_limit: usize,
    inner: Arc<DashMap<String, Regex>>,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_REGEX_SIZE_LIMIT)
    }
}

impl PatternCache {
    pub fn new(size_limit: usize) -> Self {
        Self {
            size_limit,
            inner: Arc::new(DashMap::new()),
        }
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Compiled pattern for `rule`, reusing an earlier compilation.
    ///
    /// The capture group is checked on every call since two rules may share
    /// a pattern but name different groups.
    pub fn get_or_compile(&self, rule: &Rule) -> Result<Regex, ResolveError> {
        let cached = self.inner.get(rule.regex()).map(|entry| entry.value().clone());
        if let Some(regex) = cached {
            rule.check_group(&regex)?;
            return Ok(regex);
        }

        let regex = rule.compile(self.size_limit)?;
        if self.inner.len() < MAX_CACHED_PATTERNS {
            self.inner.insert(rule.regex().to_string(), regex.clone());
        }
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

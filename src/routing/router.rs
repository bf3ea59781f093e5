//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Hand the route's environment rules to the resolver
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical route counts)
//! - Explicit no-match; the resolver then runs without configuration

use std::sync::Arc;

use crate::config::RouteConfig;
use crate::environment::{RawConfiguration, RequestFacts};
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub priority: u32,
    matcher: AndMatcher,
    environment: Option<Arc<RawConfiguration>>,
}

impl Route {
    /// Environment rules shared by every request on this route.
    pub fn environment(&self) -> Option<&RawConfiguration> {
        self.environment.as_deref()
    }
}

/// Priority-ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile routes, highest priority first. Ties keep declaration order.
    pub fn from_config(configs: Vec<RouteConfig>) -> Self {
        let mut routes: Vec<Route> = configs
            .into_iter()
            .map(|config| {
                let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
                if let Some(host) = config.host {
                    matchers.push(Box::new(HostMatcher::new(host)));
                }
                if let Some(prefix) = config.path_prefix {
                    matchers.push(Box::new(PathPrefixMatcher::new(prefix)));
                }
                Route {
                    name: config.name,
                    priority: config.priority,
                    matcher: AndMatcher::new(matchers),
                    environment: config.environment.map(Arc::new),
                }
            })
            .collect();

        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes }
    }

    /// First route whose conditions all hold.
    pub fn match_request(&self, facts: &RequestFacts<'_>) -> Option<&Route> {
        self.routes.iter().find(|route| route.matcher.matches(facts))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

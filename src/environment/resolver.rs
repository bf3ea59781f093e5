//! Environment resolution.
//!
//! # Responsibilities
//! - Write the default environment before anything else
//! - Decode the route's raw configuration through the context mapper
//! - Evaluate host, header and path rules in that order
//! - Overwrite the attribute on every match (last matching rule wins)
//!
//! # Design Decisions
//! - Stateless: only the settings and compiled patterns survive between
//!   calls, and compiled patterns never change a result
//! - Decode and regex errors propagate; missing inputs and misses do not
//! - The attribute is set even when an error is returned

use axum::http::Request;

use crate::context::Context;
use crate::environment::attributes::{Attributes, ATTRIBUTE_ENVIRONMENT};
use crate::environment::config::RawConfiguration;
use crate::environment::error::ResolveError;
use crate::environment::patterns::PatternCache;
use crate::environment::rule::{RequestFacts, RuleKind};

/// Environment label used when nothing else applies.
pub const DEFAULT_ENVIRONMENT: &str = "DEFAULT";

/// Default budget for a compiled rule pattern, in bytes. Matches the regex
/// crate's own default so bounded Unicode classes such as `\w{1,63}` fit.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Resolver tunables, fixed for the lifetime of the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Sentinel written before any rule runs.
    pub default_environment: String,

    /// Upper bound on the compiled size of operator-supplied patterns.
    pub regex_size_limit: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            default_environment: DEFAULT_ENVIRONMENT.to_string(),
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Final environment label, as stored in the attribute bag.
    pub environment: String,

    /// Rule that wrote the final value, `None` when the default stands.
    pub matched_by: Option<RuleKind>,
}

/// Derives the request environment and stores it under
/// [`ATTRIBUTE_ENVIRONMENT`].
#[derive(Debug, Clone)]
pub struct EnvironmentResolver {
    settings: ResolverSettings,
    patterns: PatternCache,
}

impl Default for EnvironmentResolver {
    fn default() -> Self {
        Self::new(ResolverSettings::default())
    }
}

impl EnvironmentResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        let patterns = PatternCache::new(settings.regex_size_limit);
        Self { settings, patterns }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Patterns compiled so far.
    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    /// Resolve the environment for `request` into `attributes`.
    pub fn resolve<B>(
        &self,
        ctx: &Context,
        request: &Request<B>,
        attributes: &mut Attributes,
        configuration: Option<&RawConfiguration>,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_facts(ctx, RequestFacts::from_request(request), attributes, configuration)
    }

    /// Same as [`resolve`](Self::resolve) over already extracted request facts.
    pub fn resolve_facts(
        &self,
        ctx: &Context,
        facts: RequestFacts<'_>,
        attributes: &mut Attributes,
        configuration: Option<&RawConfiguration>,
    ) -> Result<Resolution, ResolveError> {
        let logger = ctx.logger();
        logger.debug(format_args!("configuration: {:?}", configuration));

        let default = self.settings.default_environment.as_str();
        attributes.insert(ATTRIBUTE_ENVIRONMENT, default);
        let mut resolution = Resolution {
            environment: default.to_string(),
            matched_by: None,
        };

        if let Some(raw) = configuration {
            let config = ctx.mapper().to_resolver_configuration(raw).map_err(|e| {
                logger.error(format_args!("cannot decode environment configuration: {}", e));
                ResolveError::ConfigurationDecode(e)
            })?;
            logger.debug(format_args!("resolver configuration: {:?}", config));

            for rule in config.rules() {
                logger.debug(format_args!("{} configuration is valid", rule.kind()));

                if let Some(environment) = rule.evaluate(&facts, &self.patterns)? {
                    logger.debug(format_args!(
                        "{} rule set environment to: {}",
                        rule.kind(),
                        environment
                    ));
                    attributes.insert(ATTRIBUTE_ENVIRONMENT, environment.as_str());
                    resolution = Resolution {
                        environment,
                        matched_by: Some(rule.kind()),
                    };
                }
            }
        }

        logger.debug(format_args!(
            "environment resolved to: {}",
            resolution.environment
        ));
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConfigMapper, JsonMapper, Logger};
    use crate::environment::config::ResolverConfiguration;
    use axum::body::Body;
    use serde::de::Error as _;
    use serde_json::{json, Value};
    use std::fmt;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for RecordingLogger {
        fn info(&self, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push(format!("INFO {}", args));
        }
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push(format!("DEBUG {}", args));
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push(format!("ERROR {}", args));
        }
    }

    struct UnreadableMapper;

    impl ConfigMapper for UnreadableMapper {
        fn to_resolver_configuration(
            &self,
            _raw: &RawConfiguration,
        ) -> Result<ResolverConfiguration, serde_json::Error> {
            Err(serde_json::Error::custom("unreadable configuration"))
        }
    }

    fn raw(value: Value) -> RawConfiguration {
        value.as_object().cloned().unwrap()
    }

    fn request(host: &str, header: Option<&str>, uri: &str) -> Request<Body> {
        let mut builder = Request::builder().uri(uri).header("host", host);
        if let Some(value) = header {
            builder = builder.header("X-Archura-Environment", value);
        }
        builder.body(Body::default()).unwrap()
    }

    fn resolve(config: Option<Value>, req: &Request<Body>) -> (Result<Resolution, ResolveError>, Attributes) {
        let resolver = EnvironmentResolver::default();
        let mut attributes = Attributes::new();
        let config = config.map(raw);
        let result = resolver.resolve(&Context::default(), req, &mut attributes, config.as_ref());
        (result, attributes)
    }

    #[test]
    fn test_default_without_configuration() {
        let req = request("test.archura.io", None, "/");
        let (result, attributes) = resolve(None, &req);

        let resolution = result.unwrap();
        assert_eq!(resolution.matched_by, None);
        assert_eq!(attributes.environment(), Some(DEFAULT_ENVIRONMENT));
    }

    #[test]
    fn test_default_with_empty_configuration() {
        let req = request("test.archura.io", None, "/");
        let (result, attributes) = resolve(Some(json!({})), &req);

        assert!(result.is_ok());
        assert_eq!(attributes.environment(), Some(DEFAULT_ENVIRONMENT));
    }

    #[test]
    fn test_host_whole_match() {
        let req = request("test.archura.io", None, "/");
        let config = json!({ "host": { "regex": ".*", "groupName": "" } });
        let (result, attributes) = resolve(Some(config), &req);

        assert_eq!(result.unwrap().matched_by, Some(RuleKind::Host));
        assert_eq!(attributes.environment(), Some("test.archura.io"));
    }

    #[test]
    fn test_host_named_group() {
        let req = request("test.archura.io", None, "/");
        let config = json!({
            "host": { "regex": r"(?<environment>.*)\.archura\.io", "groupName": "environment" }
        });
        let (_, attributes) = resolve(Some(config), &req);
        assert_eq!(attributes.environment(), Some("test"));
    }

    #[test]
    fn test_header_whole_match() {
        let req = request("test.archura.io", Some("test-archura-io"), "/");
        let config = json!({
            "header": { "name": "X-Archura-Environment", "regex": ".*", "groupName": "" }
        });
        let (_, attributes) = resolve(Some(config), &req);
        assert_eq!(attributes.environment(), Some("test-archura-io"));
    }

    #[test]
    fn test_header_named_group() {
        let req = request("test.archura.io", Some("test-archura-io"), "/");
        let config = json!({
            "header": {
                "name": "X-Archura-Environment",
                "regex": "(?<environment>.*)-archura-io",
                "groupName": "environment"
            }
        });
        let (_, attributes) = resolve(Some(config), &req);
        assert_eq!(attributes.environment(), Some("test"));
    }

    #[test]
    fn test_path_first_segment() {
        let req = request("test.archura.io", None, "/test/some/other/987/index.html?a=1&b=2");
        let config = json!({ "path": { "regex": "(?:[^/]|//)+", "groupName": "" } });
        let (result, attributes) = resolve(Some(config), &req);

        assert_eq!(result.unwrap().matched_by, Some(RuleKind::Path));
        assert_eq!(attributes.environment(), Some("test"));
    }

    #[test]
    fn test_bounded_word_classes_fit_default_limit() {
        let req = request("test.archura.io", Some("staging-archura-io"), "/");
        let config = json!({
            "host": { "regex": r"(?<environment>\w{1,63})\.archura\.io", "groupName": "environment" }
        });
        let (result, attributes) = resolve(Some(config), &req);
        assert_eq!(result.unwrap().matched_by, Some(RuleKind::Host));
        assert_eq!(attributes.environment(), Some("test"));

        let config = json!({
            "header": {
                "name": "X-Archura-Environment",
                "regex": r"^(?<environment>\w{1,32})-",
                "groupName": "environment"
            }
        });
        let (result, attributes) = resolve(Some(config), &req);
        assert_eq!(result.unwrap().matched_by, Some(RuleKind::Header));
        assert_eq!(attributes.environment(), Some("staging"));
    }

    #[test]
    fn test_host_from_authority_without_host_header() {
        let req = Request::builder()
            .uri("https://test.archura.io/index.html")
            .body(Body::default())
            .unwrap();
        let config = json!({
            "host": { "regex": r"(?<environment>[^.]+)\.archura\.io", "groupName": "environment" }
        });
        let (result, attributes) = resolve(Some(config), &req);
        assert_eq!(result.unwrap().matched_by, Some(RuleKind::Host));
        assert_eq!(attributes.environment(), Some("test"));
    }

    #[test]
    fn test_patterns_compiled_once_across_requests() {
        let config = raw(json!({
            "host": { "regex": r"(?<environment>[^.]+)\.archura\.io", "groupName": "environment" },
            "path": { "regex": "[0-9]+", "groupName": "" }
        }));
        let resolver = EnvironmentResolver::default();
        let ctx = Context::default();

        for host in ["a.archura.io", "b.archura.io", "c.archura.io"] {
            let req = request(host, None, "/");
            let mut attributes = Attributes::new();
            resolver.resolve(&ctx, &req, &mut attributes, Some(&config)).unwrap();
            assert_eq!(attributes.environment(), host.split('.').next());
        }
        assert_eq!(resolver.patterns().len(), 2);
    }

    #[test]
    fn test_path_beats_header_beats_host() {
        let req = request("host.archura.io", Some("header-archura-io"), "/path/index.html");
        let host = json!({ "regex": r"(?<environment>[^.]+)\.archura\.io", "groupName": "environment" });
        let header = json!({
            "name": "X-Archura-Environment",
            "regex": "(?<environment>.*)-archura-io",
            "groupName": "environment"
        });
        let path = json!({ "regex": "[^/]+", "groupName": "" });

        let (_, attributes) = resolve(Some(json!({ "host": host, "header": header, "path": path })), &req);
        assert_eq!(attributes.environment(), Some("path"));

        let (_, attributes) = resolve(Some(json!({ "host": host, "header": header })), &req);
        assert_eq!(attributes.environment(), Some("header"));
    }

    #[test]
    fn test_later_miss_keeps_earlier_match() {
        let req = request("test.archura.io", None, "/");
        let config = json!({
            "host": { "regex": "^[a-z]+", "groupName": "" },
            "header": { "name": "X-Archura-Environment", "regex": ".*", "groupName": "" },
            "path": { "regex": "[0-9]+", "groupName": "" }
        });
        let (result, attributes) = resolve(Some(config), &req);

        assert_eq!(result.unwrap().matched_by, Some(RuleKind::Host));
        assert_eq!(attributes.environment(), Some("test"));
    }

    #[test]
    fn test_invalid_header_rule_is_skipped() {
        let req = request("test.archura.io", Some("test-archura-io"), "/");
        let config = json!({ "header": { "name": "X-Archura-Environment", "regex": ".*" } });
        let (result, attributes) = resolve(Some(config), &req);

        assert!(result.is_ok());
        assert_eq!(attributes.environment(), Some(DEFAULT_ENVIRONMENT));
    }

    #[test]
    fn test_decode_failure_keeps_default() {
        let req = request("test.archura.io", None, "/");
        let (result, attributes) = resolve(Some(json!({ "host": true })), &req);

        assert!(matches!(result, Err(ResolveError::ConfigurationDecode(_))));
        assert_eq!(attributes.environment(), Some(DEFAULT_ENVIRONMENT));
    }

    #[test]
    fn test_unreadable_configuration_is_reported() {
        let logger = Arc::new(RecordingLogger::default());
        let ctx = Context::new(logger.clone(), Arc::new(UnreadableMapper));
        let req = request("test.archura.io", None, "/");
        let mut attributes = Attributes::new();

        let result = EnvironmentResolver::default().resolve(
            &ctx,
            &req,
            &mut attributes,
            Some(&RawConfiguration::new()),
        );

        assert!(matches!(result, Err(ResolveError::ConfigurationDecode(_))));
        assert_eq!(attributes.environment(), Some(DEFAULT_ENVIRONMENT));
        let lines = logger.lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.starts_with("ERROR") && l.contains("unreadable")));
    }

    #[test]
    fn test_regex_error_propagates() {
        let req = request("test.archura.io", None, "/");
        let config = json!({ "host": { "regex": "[a-", "groupName": "" } });
        let (result, _) = resolve(Some(config), &req);
        assert!(matches!(result, Err(ResolveError::RegexCompile { rule: RuleKind::Host, .. })));
    }

    #[test]
    fn test_unknown_group_propagates() {
        let req = request("test.archura.io", None, "/some/path");
        let config = json!({ "path": { "regex": "[^/]+", "groupName": "environment" } });
        let (result, attributes) = resolve(Some(config), &req);

        assert!(matches!(result, Err(ResolveError::UnknownGroup { .. })));
        assert_eq!(attributes.environment(), Some(DEFAULT_ENVIRONMENT));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let req = request("test.archura.io", None, "/");
        let config = raw(json!({
            "host": { "regex": r"(?<environment>.*)\.archura\.io", "groupName": "environment" }
        }));
        let resolver = EnvironmentResolver::default();
        let ctx = Context::default();
        let mut attributes = Attributes::new();

        let first = resolver.resolve(&ctx, &req, &mut attributes, Some(&config)).unwrap();
        let second = resolver.resolve(&ctx, &req, &mut attributes, Some(&config)).unwrap();
        assert_eq!(first, second);
        assert_eq!(attributes.environment(), Some("test"));
    }

    #[test]
    fn test_other_attributes_untouched() {
        let req = request("test.archura.io", None, "/");
        let mut attributes = Attributes::new();
        attributes.insert("TRACE_ID", "abc");

        EnvironmentResolver::default()
            .resolve(&Context::default(), &req, &mut attributes, None)
            .unwrap();

        assert_eq!(attributes.get_str("TRACE_ID"), Some("abc"));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_custom_default_environment() {
        let resolver = EnvironmentResolver::new(ResolverSettings {
            default_environment: "production".into(),
            ..ResolverSettings::default()
        });
        let req = request("test.archura.io", None, "/");
        let mut attributes = Attributes::new();
        let ctx = Context::new(Arc::new(RecordingLogger::default()), Arc::new(JsonMapper));

        resolver.resolve(&ctx, &req, &mut attributes, None).unwrap();
        assert_eq!(attributes.environment(), Some("production"));
    }
}

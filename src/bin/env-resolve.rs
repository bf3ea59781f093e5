use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};
use clap::Parser;

use env_gateway::config::ObservabilityConfig;
use env_gateway::context::Context;
use env_gateway::environment::{
    Attributes, EnvironmentResolver, RawConfiguration, RequestFacts, ResolverSettings,
    DEFAULT_ENVIRONMENT, DEFAULT_REGEX_SIZE_LIMIT,
};
use env_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "env-resolve")]
#[command(about = "Evaluate environment rules against request facts", long_about = None)]
struct Cli {
    /// Resolver rules as JSON, or TOML when the file ends in `.toml`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host header value
    #[arg(long)]
    host: Option<String>,

    /// Extra request header, as NAME=VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Request path, query string allowed
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Label used when no rule matches
    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    default: String,

    /// Log level for resolver diagnostics
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))
}

fn load_rules(path: &Path) -> Result<RawConfiguration, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let rules: RawConfiguration = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(rules)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let rules = cli.config.as_deref().map(load_rules).transpose()?;

    let mut headers = HeaderMap::new();
    if let Some(host) = &cli.host {
        headers.insert("host", HeaderValue::from_str(host)?);
    }
    for (name, value) in &cli.headers {
        headers.append(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }
    let uri: Uri = cli.path.parse()?;

    let resolver = EnvironmentResolver::new(ResolverSettings {
        default_environment: cli.default,
        regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
    });
    let mut attributes = Attributes::new();
    let resolution = resolver.resolve_facts(
        &Context::default(),
        RequestFacts::new(&headers, &uri),
        &mut attributes,
        rules.as_ref(),
    )?;

    let rule = resolution.matched_by.map(|k| k.as_str()).unwrap_or("default");
    println!("{}\t({})", resolution.environment, rule);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&ObservabilityConfig {
        log_level: cli.log_level.clone(),
        ..ObservabilityConfig::default()
    });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! Multi-tenant gateway with request environment resolution.

pub mod cache;
pub mod config;
pub mod context;
pub mod environment;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use context::Context;
pub use environment::{EnvironmentResolver, ResolveError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

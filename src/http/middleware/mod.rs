//! Request pipeline stages.

pub mod environment;

pub use environment::{environment_middleware, MatchedRoute};

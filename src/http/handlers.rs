//! Terminal handler reporting what the pipeline resolved.

use axum::{extract::Extension, http::Uri, Json};
use serde::Serialize;

use crate::environment::Attributes;
use crate::http::middleware::MatchedRoute;

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub environment: Option<String>,
    pub route: Option<String>,
    pub path: String,
}

pub async fn echo_handler(
    Extension(attributes): Extension<Attributes>,
    Extension(MatchedRoute(route)): Extension<MatchedRoute>,
    uri: Uri,
) -> Json<EchoResponse> {
    Json(EchoResponse {
        environment: attributes.environment().map(str::to_string),
        route,
        path: uri.path().to_string(),
    })
}

//! Environment resolution middleware.
//! First pipeline stage: every later stage sees a resolved environment.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::environment::{Attributes, RequestFacts};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Name of the route that served the request, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchedRoute(pub Option<String>);

pub async fn environment_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut attributes = req
        .extensions_mut()
        .remove::<Attributes>()
        .unwrap_or_default();

    let facts = RequestFacts::from_request(&req);
    let route = state.router.match_request(&facts);
    let route_name = route.map(|r| r.name.clone());

    let result = state.resolver.resolve_facts(
        &state.context,
        facts,
        &mut attributes,
        route.and_then(|r| r.environment()),
    );

    match result {
        Ok(resolution) => {
            metrics::record_resolution(resolution.matched_by);
            tracing::debug!(
                route = route_name.as_deref().unwrap_or("none"),
                environment = %resolution.environment,
                rule = resolution.matched_by.map(|k| k.as_str()).unwrap_or("default"),
                "Environment resolved"
            );
        }
        Err(e) => {
            let route = route_name.as_deref().unwrap_or("none");
            metrics::record_resolution_error(route);
            tracing::error!(route = %route, error = %e, "Environment resolution failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid environment configuration",
            )
                .into_response();
        }
    }

    req.extensions_mut().insert(attributes);
    req.extensions_mut().insert(MatchedRoute(route_name));
    next.run(req).await
}

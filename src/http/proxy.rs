//! Upstream forwarding for matched proxy routes.
//!
//! # Responsibilities
//! - Build the upstream URL from the route target and the request path
//! - Stream the request body up and the response body back
//! - Run the route's response hook on upstream headers
//! - Map upstream failures to `502 Bad Gateway`
//!
//! # Design Decisions
//! - No retries; an unreachable upstream is the caller's problem
//! - Targets are validated lazily, per request

use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    http::{uri::PathAndQuery, Request, StatusCode},
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::routing::CompiledRoute;
use crate::security::headers::{strip_hop_by_hop, upstream_request_headers};

/// Error type for forwarding a single request.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream target {target:?}: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// HTTP clients for upstream traffic, one per certificate policy.
#[derive(Debug, Clone)]
pub struct UpstreamClients {
    verified: reqwest::Client,
    insecure: reqwest::Client,
}

impl UpstreamClients {
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            verified: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .no_proxy()
                .build()?,
            insecure: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .no_proxy()
                .danger_accept_invalid_certs(true)
                .build()?,
        })
    }

    /// Client honoring the route's `secure` flag.
    pub fn for_route(&self, route: &CompiledRoute) -> &reqwest::Client {
        if route.secure {
            &self.verified
        } else {
            &self.insecure
        }
    }
}

/// Join a target base URL and the original path and query.
///
/// `http://api:9000/base/` + `/users?id=1` → `http://api:9000/base/users?id=1`.
pub fn upstream_url(target: &str, path_and_query: Option<&PathAndQuery>) -> Result<url::Url, ForwardError> {
    let suffix = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
    let joined = format!("{}{}", target.trim_end_matches('/'), suffix);
    url::Url::parse(&joined).map_err(|source| ForwardError::InvalidTarget {
        target: target.to_string(),
        source,
    })
}

/// Forward `request` through `route` and return the upstream response.
pub async fn forward(clients: &UpstreamClients, route: &CompiledRoute, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = request.uri().path().to_string();

    match send_upstream(clients, route, request).await {
        Ok(response) => {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                upstream = %route.target,
                status = %response.status(),
                "Proxied request"
            );
            metrics::record_proxy_request(response.status().as_u16(), start);
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Upstream error");
            metrics::record_proxy_request(StatusCode::BAD_GATEWAY.as_u16(), start);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

async fn send_upstream(
    clients: &UpstreamClients,
    route: &CompiledRoute,
    request: Request<Body>,
) -> Result<Response, ForwardError> {
    let (parts, body) = request.into_parts();
    let url = upstream_url(&route.target, parts.uri.path_and_query())?;

    let mut upstream = clients
        .for_route(route)
        .request(parts.method.clone(), url)
        .headers(upstream_request_headers(&parts.headers));
    if body.size_hint().exact() != Some(0) {
        upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }
    let upstream = upstream.send().await?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    route.apply_response_hook(&parts.headers, &mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

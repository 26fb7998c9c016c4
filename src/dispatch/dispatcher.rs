//! Registry-backed request dispatcher.

use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use thiserror::Error;

use crate::http::request::UserPrincipal;
use crate::http::response;
use crate::observability::metrics;
use crate::registry::{RegistryClient, RegistryError, ServiceRecord};
use crate::resilience::CircuitBreaker;

/// Buffered bodies are capped; backends serving larger payloads belong
/// behind a streaming proxy, not this gateway.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Failure modes of one guarded dispatch unit.
#[derive(Debug, Error)]
enum DispatchFailure {
    #[error("registry lookup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("upstream request failed: {0}")]
    Connect(String),

    #[error("{status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("failed to read upstream body: {0}")]
    BodyRead(String),
}

enum DispatchOutcome {
    /// No record matched the prefix; reported to the breaker as success.
    NotFound,
    /// Upstream answered below 500; relayed verbatim.
    Proxied {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Produced by the breaker fallback; becomes a 502.
    Failed(String),
}

/// Resolves a prefix to a registered backend and proxies one request.
pub struct Dispatcher {
    registry: Arc<RegistryClient>,
    breaker: Arc<CircuitBreaker>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RegistryClient>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { registry, breaker }
    }

    /// Dispatch one inbound request and produce the response to relay.
    pub async fn dispatch(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let uri_path = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| request.uri().path().to_owned());
        let (prefix, remainder) = split_route(&uri_path);
        tracing::debug!(path = %uri_path, prefix = %prefix, remainder = %remainder, "Dispatching request");

        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return response::bad_request(&format!("failed to read request body: {}", e))
            }
        };
        let principal = parts.extensions.get::<UserPrincipal>().cloned();

        let outcome = self
            .breaker
            .execute_with_fallback(
                || {
                    self.guarded_dispatch(
                        &prefix,
                        &remainder,
                        &parts.method,
                        &parts.headers,
                        principal.as_ref(),
                        body,
                    )
                },
                |err| DispatchOutcome::Failed(err.to_string()),
            )
            .await;

        let response = match outcome {
            Ok(DispatchOutcome::NotFound) => response::not_found(),
            Ok(DispatchOutcome::Proxied {
                status,
                headers,
                body,
            }) => proxied_response(status, headers, body),
            Ok(DispatchOutcome::Failed(message)) => response::bad_gateway(&message),
            Err(err) => response::bad_gateway(&err.to_string()),
        };

        metrics::record_dispatch(
            parts.method.as_str(),
            response.status().as_u16(),
            &prefix,
            start,
        );
        metrics::record_breaker_state(self.breaker.name(), self.breaker.state());
        response
    }

    /// The circuit-breaker-guarded unit: list, match, forward, classify.
    async fn guarded_dispatch(
        &self,
        prefix: &str,
        remainder: &str,
        method: &Method,
        headers: &HeaderMap,
        principal: Option<&UserPrincipal>,
        body: Bytes,
    ) -> Result<DispatchOutcome, DispatchFailure> {
        let records = self.registry.list(ServiceRecord::is_http_endpoint).await?;
        let target = records
            .into_iter()
            .find(|record| record.metadata.api_name == prefix);
        let Some(record) = target else {
            tracing::warn!(prefix = %prefix, "No backend registered for prefix, unable to dispatch");
            return Ok(DispatchOutcome::NotFound);
        };

        // lease released on drop, on every path out of this scope
        let handle = self.registry.get_connection(&record);
        tracing::debug!(
            backend = %record.authority(),
            path = %remainder,
            "Forwarding request to backend"
        );

        let uri = outbound_uri(&record, remainder)?;
        let mut builder = Request::builder().method(method.clone()).uri(uri);
        if let Some(out_headers) = builder.headers_mut() {
            for (name, value) in headers {
                out_headers.insert(name.clone(), value.clone());
            }
            if let Some(principal) = principal {
                if let Ok(value) = HeaderValue::from_str(principal.as_str()) {
                    out_headers.insert("user-principal", value);
                }
            }
        }
        let outbound = builder
            .body(Body::from(body))
            .map_err(|e| DispatchFailure::Connect(e.to_string()))?;

        let upstream = handle
            .client()
            .request(outbound)
            .await
            .map_err(|e| DispatchFailure::Connect(e.to_string()))?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let body = axum::body::to_bytes(Body::new(upstream.into_body()), MAX_BODY_BYTES)
            .await
            .map_err(|e| DispatchFailure::BodyRead(e.to_string()))?;

        if status.as_u16() >= 500 {
            return Err(DispatchFailure::UpstreamStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(DispatchOutcome::Proxied {
            status,
            headers,
            body,
        })
    }
}

/// Split a request URI into the routing prefix (first path segment) and the
/// remainder forwarded to the backend (rest of the path plus query).
fn split_route(uri_path: &str) -> (String, String) {
    let trimmed = uri_path.strip_prefix('/').unwrap_or(uri_path);
    let end = trimmed
        .find(['/', '?'])
        .unwrap_or(trimmed.len());
    let prefix = &trimmed[..end];
    let remainder = &uri_path[uri_path.len().min(1 + prefix.len())..];
    (prefix.to_string(), remainder.to_string())
}

/// Join the stripped remainder onto the record's mount point.
fn outbound_uri(record: &ServiceRecord, remainder: &str) -> Result<Uri, DispatchFailure> {
    let mount = record.root_path.trim_end_matches('/');
    let path = match remainder {
        "" => "/".to_string(),
        r if r.starts_with('?') => format!("/{}", r),
        r => r.to_string(),
    };
    format!("http://{}{}{}", record.authority(), mount, path)
        .parse::<Uri>()
        .map_err(|e| DispatchFailure::Connect(e.to_string()))
}

/// Relay an upstream response: status and headers copied, hop-by-hop
/// framing headers stripped, content type forced to JSON.
fn proxied_response(status: StatusCode, headers: HeaderMap, body: Bytes) -> Response<Body> {
    let mut builder = Response::builder().status(status);
    if let Some(out) = builder.headers_mut() {
        for (name, value) in &headers {
            out.insert(name.clone(), value.clone());
        }
        out.remove(header::TRANSFER_ENCODING);
        out.remove(header::CONNECTION);
        out.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(response::JSON_UTF8),
        );
    }
    builder
        .body(Body::from(body))
        .unwrap_or_else(|_| response::internal_error("failed to assemble upstream response"))
}

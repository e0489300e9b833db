//! Per-request middleware dispatch.
//!
//! # State machine
//! ```text
//! PENDING ──(no match)──────────────────────────────▶ FALLTHROUGH ─▶ static resolver
//!    │
//!    └─(matches)─▶ RUNNING ──(every handler proceeds)─▶ FALLTHROUGH ─▶ static resolver
//!                     │
//!                     ├─(response sent)───────────────▶ HANDLED
//!                     ├─(no proceed)──────────────────▶ HANDLED
//!                     └─(error / panic)───────────────▶ HANDLED
//! ```
//!
//! Exactly one of the two terminal paths runs for every request. A handler
//! error never reaches the transport: it is logged and the response is
//! whatever the handler had written so far. Headers set by handlers that
//! proceeded are carried onto the static response; the resolver's own
//! headers win on conflict.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::http::middleware::{IncomingRequest, Next, ResponseWriter};
use crate::http::static_files::StaticResolver;
use crate::routing::MiddlewareRegistry;

/// Result of running the middleware chain.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A handler took the response.
    Handled(Response<Body>),
    /// No handler claimed the request. Carries the headers set along the way.
    Fallthrough(HeaderMap),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled(_))
    }
}

/// Runs matching middleware in order, falling back to static files.
pub struct Dispatcher {
    registry: Arc<MiddlewareRegistry>,
    resolver: StaticResolver,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(registry: Arc<MiddlewareRegistry>, resolver: StaticResolver, max_body_bytes: usize) -> Self {
        Self {
            registry,
            resolver,
            max_body_bytes,
        }
    }

    /// Handle one HTTP request end to end.
    pub async fn dispatch(&self, request: Request<Body>) -> Response<Body> {
        let (parts, body) = request.into_parts();
        let body: Bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to buffer request body");
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        };

        let request = Arc::new(IncomingRequest::from_parts(parts, body));
        match self.run_chain(request.clone()).await {
            DispatchOutcome::Handled(response) => response,
            DispatchOutcome::Fallthrough(headers) => {
                let requested = request.uri().to_string();
                let mut response = self.resolver.serve(request.path(), &requested).await;
                merge_headers(&mut response, headers);
                response
            }
        }
    }

    /// Run the handlers that match the request path, in registration order.
    pub async fn run_chain(&self, request: Arc<IncomingRequest>) -> DispatchOutcome {
        let matched = self.registry.all_matching(request.path());
        if matched.is_empty() {
            return DispatchOutcome::Fallthrough(HeaderMap::new());
        }

        let response = ResponseWriter::new();
        for entry in matched {
            let next = Next::new();
            let call = entry
                .handler()
                .call(request.clone(), response.clone(), next.clone());

            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        route = %entry.route(),
                        path = %request.path(),
                        error = %e,
                        "Middleware failed; halting chain"
                    );
                    return DispatchOutcome::Handled(response.to_response());
                }
                Err(panic) => {
                    tracing::error!(
                        route = %entry.route(),
                        path = %request.path(),
                        panic = %panic_message(&*panic),
                        "Middleware panicked; halting chain"
                    );
                    return DispatchOutcome::Handled(response.to_response());
                }
            }

            if response.is_sent() {
                if next.is_invoked() {
                    tracing::debug!(
                        route = %entry.route(),
                        path = %request.path(),
                        "Response already sent; ignoring continuation"
                    );
                }
                return DispatchOutcome::Handled(response.to_response());
            }

            if !next.is_invoked() {
                return DispatchOutcome::Handled(response.to_response());
            }
        }

        DispatchOutcome::Fallthrough(response.headers())
    }
}

/// Layer `headers` under the ones already on `response`.
fn merge_headers(response: &mut Response<Body>, mut headers: HeaderMap) {
    let resolved = std::mem::take(response.headers_mut());
    headers.extend(resolved);
    *response.headers_mut() = headers;
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

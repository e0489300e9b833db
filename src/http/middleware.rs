//! Middleware contract.
//!
//! A middleware is any async function taking the request, a response
//! writer and a continuation:
//!
//! ```no_run
//! use std::sync::Arc;
//! use devserve::http::middleware::{IncomingRequest, MiddlewareResult, Next, ResponseWriter};
//!
//! async fn api(req: Arc<IncomingRequest>, res: ResponseWriter, next: Next) -> MiddlewareResult {
//!     if req.method() == "GET" {
//!         res.set_header("content-type", "application/json")?;
//!         res.send(r#"{"ok":true}"#);
//!     } else {
//!         next.proceed();
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Sending a response stops the chain. Calling [`Next::proceed`] without
//! sending lets the next matching handler (or the static resolver) run.
//! If both happen, the sent response wins and the continuation is ignored.

use axum::body::{Body, Bytes};
use axum::http::{
    header::{HeaderName, HeaderValue},
    request::Parts,
    HeaderMap, Method, Response, StatusCode, Uri,
};
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Error type returned by middleware handlers.
pub type MiddlewareError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by middleware handlers.
pub type MiddlewareResult = Result<(), MiddlewareError>;

/// A request handler registered on the dev server.
pub trait Middleware: Send + Sync + 'static {
    fn call(
        &self,
        req: Arc<IncomingRequest>,
        res: ResponseWriter,
        next: Next,
    ) -> BoxFuture<'static, MiddlewareResult>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Arc<IncomingRequest>, ResponseWriter, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    fn call(
        &self,
        req: Arc<IncomingRequest>,
        res: ResponseWriter,
        next: Next,
    ) -> BoxFuture<'static, MiddlewareResult> {
        Box::pin((self)(req, res, next))
    }
}

/// Read-only view of the incoming request with its body fully buffered,
/// so every handler in the chain sees the same bytes.
#[derive(Debug)]
pub struct IncomingRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl IncomingRequest {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    pub(crate) fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self::new(parts.method, parts.uri, parts.headers, body)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path component only.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

#[derive(Debug, Default)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

/// Shared handle a handler uses to build and send the response.
///
/// The response is "sent" once [`ResponseWriter::send`] has been called;
/// later sends and header changes are ignored.
#[derive(Debug, Clone, Default)]
pub struct ResponseWriter {
    state: Arc<Mutex<ResponseState>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ResponseState> {
        self.state.lock().expect("response writer mutex poisoned")
    }

    pub fn set_status(&self, status: StatusCode) {
        let mut state = self.lock();
        if state.body.is_none() {
            state.status = status;
        }
    }

    /// Set a header, replacing any previous value.
    pub fn set_header<K, V>(&self, name: K, value: V) -> Result<(), MiddlewareError>
    where
        K: TryInto<HeaderName>,
        K::Error: std::error::Error + Send + Sync + 'static,
        V: TryInto<HeaderValue>,
        V::Error: std::error::Error + Send + Sync + 'static,
    {
        let name = name.try_into()?;
        let value = value.try_into()?;
        let mut state = self.lock();
        if state.body.is_none() {
            state.headers.insert(name, value);
        }
        Ok(())
    }

    /// Send the body and mark the response as sent.
    ///
    /// Returns false if a response had already been sent.
    pub fn send(&self, body: impl Into<Bytes>) -> bool {
        let mut state = self.lock();
        if state.body.is_some() {
            tracing::warn!("Response already sent; ignoring second send");
            return false;
        }
        state.body = Some(body.into());
        true
    }

    pub fn is_sent(&self) -> bool {
        self.lock().body.is_some()
    }

    pub fn status(&self) -> StatusCode {
        self.lock().status
    }

    /// Headers set so far.
    pub fn headers(&self) -> HeaderMap {
        self.lock().headers.clone()
    }

    /// Build the HTTP response from whatever has been written so far.
    pub(crate) fn to_response(&self) -> Response<Body> {
        let state = self.lock();
        let mut response = Response::new(Body::from(state.body.clone().unwrap_or_default()));
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers.clone();
        response
    }
}

/// The continuation passed to a handler. Calling [`Next::proceed`] lets the
/// chain continue after the handler returns.
#[derive(Debug, Clone, Default)]
pub struct Next {
    invoked: Arc<AtomicBool>,
}

impl Next {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proceed(&self) {
        self.invoked.store(true, Ordering::SeqCst);
    }

    pub fn is_invoked(&self) -> bool {
        self.invoked.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_marks_response_sent_once() {
        let res = ResponseWriter::new();
        assert!(!res.is_sent());
        assert!(res.send("first"));
        assert!(res.is_sent());
        assert!(!res.send("second"));
    }

    #[test]
    fn test_status_and_headers_frozen_after_send() {
        let res = ResponseWriter::new();
        res.set_status(StatusCode::CREATED);
        res.set_header("x-test", "yes").unwrap();
        res.send("body");
        res.set_status(StatusCode::IM_A_TEAPOT);
        res.set_header("x-late", "no").unwrap();

        let response = res.to_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-test"], "yes");
        assert!(response.headers().get("x-late").is_none());
    }

    #[test]
    fn test_invalid_header_is_an_error() {
        let res = ResponseWriter::new();
        assert!(res.set_header("bad header", "v").is_err());
    }

    #[test]
    fn test_unsent_response_defaults_to_empty_ok() {
        let response = ResponseWriter::new().to_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_next_clones_share_state() {
        let next = Next::new();
        let clone = next.clone();
        clone.proceed();
        assert!(next.is_invoked());
    }
}

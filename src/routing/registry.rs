//! Ordered middleware registry.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::http::middleware::Middleware;
use crate::routing::matcher::{RouteCompilationError, RouteMatcher};

/// A registered handler together with its compiled route.
pub struct MiddlewareEntry {
    route: String,
    matcher: RouteMatcher,
    handler: Arc<dyn Middleware>,
}

impl MiddlewareEntry {
    /// The route spec as supplied at registration.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }

    pub fn handler(&self) -> &Arc<dyn Middleware> {
        &self.handler
    }
}

impl std::fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("route", &self.route)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// Append-only list of middleware entries. Insertion order is evaluation order.
///
/// Readers take a snapshot, so a registration that lands while a request is
/// being dispatched is only seen by later requests.
#[derive(Default)]
pub struct MiddlewareRegistry {
    entries: ArcSwap<Vec<Arc<MiddlewareEntry>>>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `route` and append the handler.
    pub fn register(
        &self,
        handler: Arc<dyn Middleware>,
        route: &str,
    ) -> Result<(), RouteCompilationError> {
        let matcher = RouteMatcher::compile(route)?;
        let entry = Arc::new(MiddlewareEntry {
            route: route.to_string(),
            matcher,
            handler,
        });

        self.entries.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(entry.clone());
            next
        });

        tracing::debug!(route = %route, "Middleware registered");
        Ok(())
    }

    /// Entries whose route accepts `path`, in registration order.
    pub fn all_matching(&self, path: &str) -> Vec<Arc<MiddlewareEntry>> {
        self.entries
            .load()
            .iter()
            .filter(|entry| entry.matcher.matches(path))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

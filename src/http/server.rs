//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Hold the middleware registry and the live-reload channel
//! - Load the MIME table and build the static resolver at start
//! - Create the Axum router: live-reload routes + catch-all dispatcher
//! - Wire up tower-http layers (request ID, tracing)
//! - Bind, serve, and stop

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use notify::RecommendedWatcher;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{validate_config, ServerConfig, ValidationError};
use crate::http::dispatcher::Dispatcher;
use crate::http::inject::HtmlInjector;
use crate::http::middleware::Middleware;
use crate::http::static_files::StaticResolver;
use crate::lifecycle::Shutdown;
use crate::livereload::socket::{client_script, live_reload_socket};
use crate::livereload::{LiveReload, LiveReloadState, SiteWatcher};
use crate::mime::{load_base_table, MimeError, MimeTable};
use crate::routing::{MiddlewareRegistry, RouteCompilationError, MATCH_ALL};

/// Errors raised while starting or stopping the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0:?}")]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Mime(#[from] MimeError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start site watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A handler plus the route it is scoped to, for bulk registration.
#[derive(Clone)]
pub struct MiddlewareConfig {
    pub handler: Arc<dyn Middleware>,
    /// Route spec; `None` means every path.
    pub route: Option<String>,
}

impl MiddlewareConfig {
    pub fn new(handler: impl Middleware, route: impl Into<String>) -> Self {
        Self {
            handler: Arc::new(handler),
            route: Some(route.into()),
        }
    }

    pub fn global(handler: impl Middleware) -> Self {
        Self {
            handler: Arc::new(handler),
            route: None,
        }
    }
}

/// Application state injected into the catch-all handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
}

/// Local development server.
pub struct DevServer {
    config: ServerConfig,
    registry: Arc<MiddlewareRegistry>,
    live_reload: Arc<LiveReload>,
}

impl DevServer {
    /// Create a server with no middleware.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(MiddlewareRegistry::new()),
            live_reload: Arc::new(LiveReload::new()),
        }
    }

    /// Create a server and register `middlewares` in order.
    pub fn with_middlewares(
        config: ServerConfig,
        middlewares: Vec<MiddlewareConfig>,
    ) -> Result<Self, RouteCompilationError> {
        let server = Self::new(config);
        for middleware in middlewares {
            let route = middleware.route.as_deref().unwrap_or(MATCH_ALL);
            server.registry.register(middleware.handler, route)?;
        }
        Ok(server)
    }

    /// Register `handler` for paths accepted by `route`.
    ///
    /// Registration is meant to happen before traffic starts; a request
    /// already being dispatched keeps the list it started with.
    pub fn register(&self, handler: impl Middleware, route: &str) -> Result<(), RouteCompilationError> {
        self.registry.register(Arc::new(handler), route)
    }

    /// Register `handler` for every path.
    pub fn register_global(&self, handler: impl Middleware) -> Result<(), RouteCompilationError> {
        self.register(handler, MATCH_ALL)
    }

    /// Tell every connected browser to reload. Returns how many were reached.
    pub fn broadcast_reload(&self) -> usize {
        self.live_reload.broadcast_reload()
    }

    /// The live-reload channel, for triggering reloads from other tasks.
    pub fn live_reload(&self) -> Arc<LiveReload> {
        self.live_reload.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<MiddlewareRegistry> {
        &self.registry
    }

    /// Base MIME list merged with the configured additions.
    pub fn load_mime_table(&self) -> Result<MimeTable, MimeError> {
        let base = load_base_table(self.config.mime_types_file.as_deref())?;
        Ok(MimeTable::merge(base, &self.config.additional_mime_types))
    }

    /// Static resolver for the configured root, with injection if enabled.
    pub fn static_resolver(&self, mime: MimeTable) -> StaticResolver {
        let resolver = StaticResolver::new(
            self.config.root_directory.clone(),
            self.config.subfolder.clone(),
            Arc::new(mime),
        );

        let reload = &self.config.live_reload;
        if reload.inject {
            resolver.with_injector(HtmlInjector::new(
                reload.client_path.clone(),
                reload.endpoint.clone(),
            ))
        } else {
            resolver
        }
    }

    /// Build the Axum router with all layers.
    pub fn router(&self, resolver: StaticResolver, shutdown: Arc<Shutdown>) -> Router {
        let dispatcher = Arc::new(Dispatcher::new(
            self.registry.clone(),
            resolver,
            self.config.max_body_bytes,
        ));

        let reload = Router::new()
            .route(&self.config.live_reload.endpoint, get(live_reload_socket))
            .route(&self.config.live_reload.client_path, get(client_script))
            .with_state(LiveReloadState {
                channel: self.live_reload.clone(),
                shutdown,
            });

        Router::new()
            .fallback(dispatch_request)
            .with_state(AppState { dispatcher })
            .merge(reload)
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Load the MIME table, bind, and start serving in the background.
    pub async fn start(&self) -> Result<ServerHandle, ServerError> {
        validate_config(&self.config).map_err(ServerError::Config)?;

        let mime = self.load_mime_table()?;
        tracing::info!(entries = mime.len(), "MIME table loaded");

        let resolver = self.static_resolver(mime);
        let watch_root = resolver.root_dir();
        let shutdown = Arc::new(Shutdown::new());
        let app = self.router(resolver, shutdown.clone());

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let watcher = if self.config.live_reload.watch {
            let debounce = Duration::from_millis(self.config.live_reload.debounce_ms);
            Some(SiteWatcher::new(&watch_root, debounce, self.live_reload.clone()).run()?)
        } else {
            None
        };

        let server_shutdown = shutdown.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.wait().await })
                .await
        });

        tracing::info!(
            address = %local_addr,
            root = %self.config.root_directory,
            middlewares = self.registry.len(),
            live_reload = self.config.live_reload.inject,
            "Dev server listening"
        );

        Ok(ServerHandle {
            local_addr,
            shutdown,
            task,
            grace: Duration::from_secs(self.config.shutdown_grace_secs),
            _watcher: watcher,
        })
    }
}

/// Catch-all handler: middleware chain, then static files.
async fn dispatch_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.dispatch(request).await
}

/// A running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<Shutdown>,
    task: JoinHandle<std::io::Result<()>>,
    grace: Duration,
    _watcher: Option<RecommendedWatcher>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listener and live-reload sockets, then wait up to the grace
    /// period for in-flight requests. Requests still running are left to finish.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();

        match tokio::time::timeout(self.grace, self.task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
            Err(_) => tracing::warn!(
                grace_secs = self.grace.as_secs(),
                "Requests still in flight after grace period; detaching"
            ),
        }

        tracing::info!(address = %self.local_addr, "Dev server stopped");
        Ok(())
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per static endpoint plus the
//!   dynamic mount
//! - Wire up middleware (tracing, request ID, auth, CORS)
//! - Bind server to listener, with or without TLS
//! - Shut down gracefully and drain bridge sessions

use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use axum::{middleware, routing::any, Router};
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::bridge::Bridge;
use crate::config::validation::join_errors;
use crate::config::{validate_config, AuthKind, ProxyConfig, ValidationError};
use crate::http::handler::{dynamic_endpoint, static_endpoint};
use crate::lifecycle::Shutdown;
use crate::net::{tls, Dialer, SessionTracker};
use crate::routing::{DynamicRoute, Resolver, RoutingTable};
use crate::security::{basic_auth_middleware, BasicAuth, Htpasswd, HtpasswdError};

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error("invalid bind address: {0}")]
    Bind(#[from] AddrParseError),

    #[error("authentication: {0}")]
    Auth(#[from] HtpasswdError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub dialer: Arc<Dialer>,
    pub bridge: Bridge,
    pub sessions: SessionTracker,
}

/// HTTP server for the bridge.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    sessions: SessionTracker,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// TLS backends are verified against the system trust store.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let dialer = Dialer::new(config.timeouts.connect());
        Self::with_dialer(config, dialer)
    }

    /// Create a server that dials backends with `dialer`.
    pub fn with_dialer(config: ProxyConfig, dialer: Dialer) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ServerError::Config)?;
        tls::ensure_crypto_provider();

        let resolver = Resolver::new(
            RoutingTable::new(config.endpoints.iter().cloned()),
            config.dynamic_path.as_deref().map(DynamicRoute::new),
        );
        let auth = match (config.auth.kind, &config.auth.htpasswd) {
            (AuthKind::Basic, Some(path)) => {
                let htpasswd = Htpasswd::load(path)?;
                tracing::info!(users = htpasswd.len(), realm = %config.auth.realm, "Basic authentication enabled");
                Some(BasicAuth::new(htpasswd, &config.auth.realm))
            }
            _ => None,
        };

        let sessions = SessionTracker::new();
        let state = AppState {
            resolver: Arc::new(resolver),
            dialer: Arc::new(dialer),
            bridge: Bridge::new(config.bridge.buffer_size, config.bridge.close_grace()),
            sessions: sessions.clone(),
        };

        let router = Self::build_router(&config, state, auth);
        Ok(Self {
            router,
            config,
            sessions,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState, auth: Option<BasicAuth>) -> Router {
        let mut router = Router::new();

        for endpoint in &config.endpoints {
            tracing::info!(path = %endpoint.path, endpoint = %endpoint, "Static endpoint");
            router = router.route(&endpoint.path, any(static_endpoint));
        }
        if let Some(dynamic) = state.resolver.dynamic() {
            let mount = match dynamic.prefix() {
                "" => "/",
                prefix => prefix,
            };
            tracing::info!(mount = %mount, "Dynamic endpoint");
            router = router
                .route(mount, any(dynamic_endpoint))
                .route(&dynamic.route_pattern(), any(dynamic_endpoint));
            // The catch-all never matches an empty remainder.
            if !dynamic.prefix().is_empty() {
                router = router.route(&format!("{mount}/"), any(dynamic_endpoint));
            }
        }

        let mut router = router.with_state(state);
        if let Some(auth) = auth {
            router = router.layer(middleware::from_fn_with_state(auth, basic_auth_middleware));
        }
        let router = router
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.cors.enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The fully layered router, for serving on a custom listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Shutdown coordinator bound to this server's sessions and grace period.
    pub fn shutdown(&self) -> Shutdown {
        Shutdown::new(self.sessions.clone(), self.config.timeouts.graceful_shutdown())
    }

    /// Serve until `signal` resolves, then shut down gracefully.
    pub async fn run<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown();
        self.run_with(shutdown, signal).await
    }

    /// Like [`run`](Self::run), driving the given coordinator.
    pub async fn run_with<F>(self, shutdown: Shutdown, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.listener.socket_addr()?;
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                signal.await;
                shutdown.trigger();
            }
        });

        match &self.config.listener.tls {
            Some(tls_config) => {
                let rustls = tls::load_tls_config(
                    Path::new(&tls_config.cert_path),
                    Path::new(&tls_config.key_path),
                )
                .await?;
                tracing::info!(address = %addr, tls = true, "HTTP server starting");
                axum_server::bind_rustls(addr, rustls)
                    .handle(shutdown.handle())
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!(address = %addr, tls = false, "HTTP server starting");
                axum_server::bind(addr)
                    .handle(shutdown.handle())
                    .serve(app)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        shutdown.drain().await;
        Ok(())
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all resource handlers
//! - Wire up the middleware chain in its contractual order
//! - Spawn background tasks (rate-limit sweep) and run with graceful shutdown
//!
//! # Middleware order (outermost first)
//! ```text
//! security headers → request logging → rate limit → CORS → trusted host
//!     → timeout / body limit / panic boundary → handlers
//! ```
//! Security headers are outermost so they reach rejected requests too;
//! the logging stage sees every outcome, including panics the inner
//! boundary turned into 500s; rate limiting runs before the handler and
//! picks its tier from the HTTP method alone.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Response},
    middleware,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::{AppConfig, SecurityConfig};
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::notify::{spawn_mailer, Mailer};
use crate::observability::logging::request_logging_middleware;
use crate::security::admin::AdminGuard;
use crate::security::headers::security_headers_middleware;
use crate::security::host::{trusted_host_middleware, TrustedHosts};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiterState};
use crate::store::DbPool;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub mailer: Mailer,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    limiters: Arc<RateLimiterState>,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and pool.
    pub fn new(config: AppConfig, pool: DbPool) -> Self {
        let shutdown = Shutdown::new();
        let mailer = spawn_mailer(&config.email, shutdown.subscribe());
        let limiters = Arc::new(RateLimiterState::new(&config.rate_limit));

        let state = AppState {
            pool,
            config: Arc::new(config.clone()),
            mailer,
        };

        let router = Self::build_router(&config, state, limiters.clone());
        Self {
            router,
            config,
            limiters,
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later sit further out, so the additions below run in
    /// reverse of the contractual order.
    fn build_router(
        config: &AppConfig,
        state: AppState,
        limiters: Arc<RateLimiterState>,
    ) -> Router {
        let hosts = TrustedHosts::new(&config.security);
        let admin = AdminGuard::new(&config.admin);

        api::router(admin)
            .with_state(state)
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn_with_state(
                hosts,
                trusted_host_middleware,
            ))
            .layer(build_cors(&config.security))
            .layer(middleware::from_fn_with_state(
                limiters,
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn(request_logging_middleware))
            .layer(middleware::from_fn(security_headers_middleware))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Periodic eviction of idle rate-limit identifiers.
        if self.config.rate_limit.enabled {
            let limiters = self.limiters.clone();
            let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs.max(1));
            let mut shutdown_rx = self.shutdown.subscribe();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => limiters.sweep(Instant::now()),
                        _ = shutdown_rx.recv() => break,
                    }
                }
            });
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.shutdown.trigger();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Build the CORS layer from configured origins.
///
/// A wildcard origin cannot be combined with credentials, so "*" switches
/// to the permissive credential-less mode.
fn build_cors(security: &SecurityConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

    if security.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(methods)
            .allow_headers(AnyOrigin)
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    }
}

/// Convert a handler panic into the generic 500 body; the panic payload
/// stays in the server-side log.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = detail, "Handler panicked");

    Response::builder()
        .status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"detail":"Internal server error"}"#))
        .expect("static response")
}

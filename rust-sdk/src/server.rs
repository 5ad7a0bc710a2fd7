//! Agent server bootstrap.
//!
//! [`AgentServer`] owns the configuration and the single query handler slot.
//! The slot is filled during setup; building the router (or starting the
//! server) consumes the builder, so the handler cannot change while traffic
//! is being served.

use std::future::Future;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::handler::{panic_message, QueryHandler, SharedHandler};
use crate::web::{health, is_signature_verification_enabled, query, AppState};
use crate::Config;

pub const HEALTH_PATH: &str = "/health";
pub const QUERY_PATH: &str = "/query";

type RouterMap = Box<dyn FnOnce(Router) -> Router + Send>;

/// Webhook server answering marketplace queries.
///
/// ```no_run
/// use agent_sdk::{AgentServer, Config, Query, QueryResult};
///
/// # async fn run() -> anyhow::Result<()> {
/// let mut server = AgentServer::new(Config::from_env());
/// server.on_query(|query: Query| async move {
///     Ok::<_, anyhow::Error>(QueryResult::new(format!("You asked: {}", query.text)))
/// });
/// server.start().await
/// # }
/// ```
pub struct AgentServer {
    config: Config,
    handler: Option<SharedHandler>,
    routes: Vec<(String, MethodRouter)>,
    extra_routers: Vec<Router>,
    router_maps: Vec<RouterMap>,
}

impl AgentServer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: None,
            routes: Vec::new(),
            extra_routers: Vec::new(),
            router_maps: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the query handler. A later call replaces the earlier handler.
    pub fn on_query<H: QueryHandler>(&mut self, handler: H) -> &mut Self {
        if self.handler.is_some() {
            warn!("query_handler_replaced");
        }
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Register a route ahead of the built-in endpoints.
    ///
    /// A route on `/health` or `/query` replaces that built-in endpoint
    /// entirely; any other path is served alongside them.
    pub fn route(&mut self, path: impl Into<String>, method_router: MethodRouter) -> &mut Self {
        self.routes.push((path.into(), method_router));
        self
    }

    /// Mount a router after the built-in endpoints.
    ///
    /// A merged route that overlaps `/health`, `/query` or another caller
    /// route makes [`AgentServer::into_router`] fail.
    pub fn merge(&mut self, routes: Router) -> &mut Self {
        self.extra_routers.push(routes);
        self
    }

    /// Apply arbitrary composition (layers, nesting, fallbacks) to the
    /// finished router. Maps run in registration order.
    pub fn map_router<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.router_maps.push(Box::new(f));
        self
    }

    /// Build the fully composed router.
    ///
    /// Conflicting caller routes are reported as an error instead of
    /// aborting the process.
    pub fn into_router(self) -> Result<Router> {
        let AgentServer {
            config,
            handler,
            routes,
            extra_routers,
            router_maps,
        } = self;

        let serve_health = !routes.iter().any(|(path, _)| path == HEALTH_PATH);
        let serve_query = !routes.iter().any(|(path, _)| path == QUERY_PATH);
        if !serve_health {
            info!(path = HEALTH_PATH, "builtin_route_overridden");
        }
        if !serve_query {
            info!(path = QUERY_PATH, "builtin_route_overridden");
        }

        let state = AppState::new(config, handler);

        let build = move || {
            let mut builtin: Router<AppState> = Router::new();
            if serve_health {
                builtin = builtin.route(HEALTH_PATH, get(health));
            }
            if serve_query {
                builtin = builtin.route(QUERY_PATH, post(query));
            }

            let mut app: Router = builtin.with_state(state);

            for (path, method_router) in routes {
                app = app.route(&path, method_router);
            }

            for routes in extra_routers {
                app = app.merge(routes);
            }

            let mut app = app.layer(TraceLayer::new_for_http());

            for map in router_maps {
                app = map(app);
            }

            app
        };

        // axum reports route conflicts by panicking.
        catch_unwind(AssertUnwindSafe(build)).map_err(|panic| {
            let message = panic_message(panic.as_ref())
                .unwrap_or_else(|| "conflicting routes".to_string());
            error!(error = %message, "router_composition_failed");
            anyhow!("failed to compose agent router: {}", message)
        })
    }

    /// Bind `0.0.0.0:<port>` and serve until SIGINT or SIGTERM.
    pub async fn start(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr)
            .await
            .context("Failed to bind to address")?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an existing listener until `shutdown` resolves.
    pub async fn serve<S>(self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        info!(
            agent = %self.config.agent_id,
            port = self.config.port,
            handler_registered = self.handler.is_some(),
            signature_verification_configured =
                is_signature_verification_enabled(&self.config.webhook_secret),
            require_signature = self.config.require_signature,
            "agent_server_starting"
        );

        let app = self.into_router()?;

        let addr = listener.local_addr().context("Failed to read local address")?;
        info!(address = %addr, "agent_server_listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")?;

        info!("agent_server_shutdown_complete");

        Ok(())
    }
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_install_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_install_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("agent_server_shutting_down");
}

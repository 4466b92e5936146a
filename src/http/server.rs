//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router around the application `Router`
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Hand every request to the dispatcher

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::Response,
    routing::any,
    Router as AxumRouter,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::request::{RequestIdMaker, X_REQUEST_ID};
use crate::routing::Router;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
}

/// HTTP server for the application.
pub struct HttpServer {
    app: AxumRouter,
}

impl HttpServer {
    pub fn new(router: Router) -> Self {
        let state = AppState {
            router: Arc::new(router),
        };
        Self {
            app: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> AxumRouter {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        AxumRouter::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, RequestIdMaker))
    }

    /// The fully layered service, for driving without a socket.
    pub fn app(&self) -> AxumRouter {
        self.app.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.router.dispatch(request).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

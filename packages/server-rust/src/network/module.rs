//! Network module with deferred startup.
//!
//! `new()` allocates shared state, `start()` binds the listener and returns
//! the bound port, `serve()` accepts connections until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    catalog_handler, complete_handler, health_handler, index_handler, invoke_handler,
    liveness_handler, missing_run_id_handler, pending_handler, readiness_handler,
    run_status_handler, v1_health_handler, AppState,
};
use super::middleware::{admit_request, build_http_layers, request_timeout_layer};
use super::shutdown::ShutdownController;
use crate::StepRpc;

/// Owns the HTTP server lifecycle for one [`StepRpc`] instance.
pub struct NetworkModule {
    config: NetworkConfig,
    rpc: StepRpc,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    #[must_use]
    pub fn new(config: NetworkConfig, rpc: StepRpc) -> Self {
        Self {
            config,
            rpc,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles routes and middleware.
    ///
    /// API routes, all under `base_path`:
    /// - `GET /` and `GET /v1/`
    /// - `GET /v1/catalog`
    /// - `POST /v1/invoke`
    /// - `GET /v1/runs/{runId}`
    /// - `GET /v1/bridge/pending` and `POST /v1/bridge/complete`
    ///
    /// Probes `/health`, `/health/live` and `/health/ready` sit at the root
    /// and bypass admission control. Every route except `/v1/invoke` is
    /// bounded by `request_timeout`.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            rpc: self.rpc.clone(),
            shutdown: Arc::clone(&self.shutdown),
            start_time: Instant::now(),
        };
        let base = self.config.normalized_base_path();
        let at = |path: &str| format!("{base}{path}");

        let mut api = Router::new()
            .route(&at("/v1"), get(v1_health_handler))
            .route(&at("/v1/"), get(v1_health_handler))
            .route(&at("/v1/catalog"), get(catalog_handler))
            .route(&at("/v1/runs"), get(missing_run_id_handler))
            .route(&at("/v1/runs/"), get(missing_run_id_handler))
            .route(&at("/v1/runs/{run_id}"), get(run_status_handler))
            .route(&at("/v1/bridge/pending"), get(pending_handler))
            .route(&at("/v1/bridge/complete"), post(complete_handler))
            .route(&at("/"), get(index_handler));
        if !base.is_empty() {
            api = api.route(&base, get(index_handler));
        }
        let api = api
            .route_layer(request_timeout_layer(&self.config))
            .route(&at("/v1/invoke"), post(invoke_handler))
            .route_layer(axum::middleware::from_fn_with_state(
                Arc::clone(&self.shutdown),
                admit_request,
            ));

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route_layer(request_timeout_layer(&self.config))
            .merge(api)
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the listener. Returns the bound port, which differs from the
    /// configured one when that is 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        info!(host = %self.config.host, port, "listener bound");
        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves or the controller's
    /// [`trigger_shutdown`](ShutdownController::trigger_shutdown) is called,
    /// then drains in-flight requests for up to `drain_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when called before [`start`](Self::start) or on a
    /// fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener.take() else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = self.build_router();
        let controller = Arc::clone(&self.shutdown);

        controller.set_ready();
        info!("serving Step RPC API");

        let signal_controller = Arc::clone(&controller);
        let mut triggered = controller.shutdown_receiver();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let triggered_elsewhere = async {
                    if !*triggered.borrow_and_update() {
                        // A closed channel means the controller is gone.
                        let _ = triggered.changed().await;
                    }
                };
                tokio::select! {
                    () = shutdown => signal_controller.trigger_shutdown(),
                    () = triggered_elsewhere => {}
                }
            })
            .await?;

        controller.trigger_shutdown();
        if controller.wait_for_drain(self.config.drain_timeout).await {
            info!("all in-flight requests drained");
        } else {
            warn!(
                in_flight = controller.in_flight_count(),
                "drain timeout expired with requests in flight"
            );
        }
        Ok(())
    }
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the configured role
//! - Wire up middleware (request ID, request timeout, tracing)
//! - Share one drain coordinator, sequencer and in-flight tracker across
//!   every handler of the instance
//! - Serve until told to shut down, then finish in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Role, ServiceConfig};
use crate::drain::DrainCoordinator;
use crate::error::ChainError;
use crate::health::HealthReporter;
use crate::http::{leaf, probes, relay};
use crate::identity::Identity;
use crate::lifecycle::inflight::{InFlightGuard, InFlightTracker};
use crate::lifecycle::sequencer::TerminationSequencer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::upstream::{InvalidDownstream, UpstreamCaller};
use crate::work::SyntheticWork;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub role: Role,
    pub identity: Arc<Identity>,
    pub coordinator: Arc<DrainCoordinator>,
    pub health: HealthReporter,
    pub sequencer: TerminationSequencer,
    pub inflight: InFlightTracker,
    pub work: Arc<SyntheticWork>,
}

impl AppState {
    /// Admission check for a new unit of work.
    ///
    /// Only the state at admission time matters: work admitted just before
    /// drain begins is allowed to finish.
    pub fn admit(&self) -> Result<InFlightGuard, ChainError> {
        if self.coordinator.is_draining() {
            metrics::record_admission(self.role.as_str(), false);
            tracing::info!(
                service = %self.identity.service,
                hostname = %self.identity.hostname,
                "Rejected new work, instance is draining"
            );
            return Err(ChainError::AdmissionRejected);
        }
        metrics::record_admission(self.role.as_str(), true);
        Ok(self.inflight.track())
    }
}

/// State for relay routes: the shared state plus the outbound client.
#[derive(Clone)]
pub struct RelayState {
    pub app: AppState,
    pub caller: Arc<UpstreamCaller>,
}

// Headroom between an inner deadline and the server-side request timeout.
const PRESTOP_MARGIN: Duration = Duration::from_secs(5);
const HANDLER_MARGIN: Duration = Duration::from_secs(1);

/// Server-side bound for `/health` and `/prestop`. The pre-stop hook blocks
/// for the convergence delay.
fn probe_timeout(config: &ServiceConfig) -> Duration {
    config
        .listener
        .request_timeout()
        .max(config.drain.convergence_delay() + PRESTOP_MARGIN)
}

/// Server-side bound for the work routes. It never fires before the
/// handler's own deadlines, so a stalled downstream still surfaces as 504.
fn work_timeout(config: &ServiceConfig) -> Duration {
    let inner = match config.role {
        Role::Relay => {
            config.downstream.connect_timeout() + config.downstream.response_timeout()
        }
        Role::Leaf => Duration::from_millis(config.work.max_ms),
    };
    config.listener.request_timeout().max(inner + HANDLER_MARGIN)
}

/// HTTP server for one service instance.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, InvalidDownstream> {
        let coordinator = DrainCoordinator::shared();
        let identity = Arc::new(Identity::from_config(&config));
        let state = AppState {
            role: config.role,
            health: HealthReporter::new(Arc::clone(&coordinator)),
            sequencer: TerminationSequencer::new(
                Arc::clone(&coordinator),
                Arc::clone(&identity),
                config.drain.convergence_delay(),
            ),
            identity,
            coordinator,
            inflight: InFlightTracker::new(),
            work: Arc::new(SyntheticWork::new(&config.work)),
        };

        let caller = match config.role {
            Role::Relay => Some(Arc::new(UpstreamCaller::new(&config.downstream)?)),
            Role::Leaf => None,
        };

        let router = Self::build_router(&config, state.clone(), caller);
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        caller: Option<Arc<UpstreamCaller>>,
    ) -> Router {
        let probe_routes = Router::new()
            .route("/health", get(probes::health_handler))
            .route("/prestop", get(probes::prestop_handler))
            .with_state(state.clone())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::SERVICE_UNAVAILABLE,
                probe_timeout(config),
            ));

        let work_routes = match caller {
            Some(caller) => Router::new()
                .route("/", get(relay::call_handler))
                .route("/call", get(relay::call_handler))
                .with_state(RelayState { app: state, caller }),
            None => Router::new()
                .route("/process", get(leaf::process_handler))
                .with_state(state),
        };
        let work_routes = work_routes.layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            work_timeout(config),
        ));

        probe_routes
            .merge(work_routes)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server on `listener` until `shutdown` fires, then wait for
    /// in-flight requests to finish.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            role = %self.state.role,
            service = %self.state.identity.service,
            hostname = %self.state.identity.hostname,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

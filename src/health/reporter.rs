//! Readiness/liveness probe responses derived from drain state.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::drain::{DrainCoordinator, DrainState};

/// Probe response for one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub status: StatusCode,
    pub body: &'static str,
}

impl HealthReport {
    pub fn for_state(state: DrainState) -> Self {
        match state {
            DrainState::Active => Self {
                status: StatusCode::OK,
                body: "ok",
            },
            DrainState::Draining => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "draining",
            },
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

/// Stateless view over the coordinator; every report reads it fresh.
#[derive(Debug, Clone)]
pub struct HealthReporter {
    coordinator: Arc<DrainCoordinator>,
}

impl HealthReporter {
    pub fn new(coordinator: Arc<DrainCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn report(&self) -> HealthReport {
        HealthReport::for_state(self.coordinator.query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_drain_state() {
        let coordinator = DrainCoordinator::shared();
        let reporter = HealthReporter::new(Arc::clone(&coordinator));

        assert_eq!(reporter.report(), HealthReport { status: StatusCode::OK, body: "ok" });

        coordinator.begin_drain();
        let report = reporter.report();
        assert_eq!(report.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.body, "draining");
    }
}

//! Termination sequencing.
//!
//! # States
//! ```text
//! Idle → Converging: pre-stop trigger; convergence timer scheduled
//! Converging → Drained: timer fires; begin_drain() called
//! Idle → Drained: termination signal before any pre-stop trigger
//! Drained: terminal; further triggers are no-ops
//! ```
//!
//! The convergence wait runs on its own spawned task. Callers of `pre_stop`
//! only await a completion handle, so a dropped hook connection cannot cancel
//! the sequence, and request handlers are never blocked by it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::drain::DrainCoordinator;
use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Converging,
    Drained,
}

/// What a pre-stop trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreStopOutcome {
    /// This trigger started the sequence and waited out the convergence delay.
    Converged,
    /// A sequence was already converging; this trigger waited for it.
    Joined,
    /// Drain had already begun; nothing to do.
    AlreadyDrained,
}

/// What the termination signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// No pre-stop trigger had arrived; drained without a convergence delay.
    DrainedImmediately,
    /// A convergence was in progress; waited for it to complete.
    AwaitedConvergence,
    /// Drain had already begun.
    AlreadyDrained,
}

struct Inner {
    coordinator: Arc<DrainCoordinator>,
    identity: Arc<Identity>,
    convergence_delay: Duration,
    state: watch::Sender<SequencerState>,
}

impl Inner {
    /// Claim the sequence. Only one caller ever sees `true`.
    fn claim(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == SequencerState::Idle {
                *state = SequencerState::Converging;
                true
            } else {
                false
            }
        })
    }

    /// Drain, then publish `Drained`. Order matters: anyone who observes
    /// `Drained` must also observe the coordinator draining.
    fn finish(&self) {
        if self.coordinator.begin_drain() {
            tracing::info!(
                service = %self.identity.service,
                hostname = %self.identity.hostname,
                "Drain started, new work will be rejected"
            );
        }
        self.state.send_replace(SequencerState::Drained);
    }
}

/// One-shot coordinator for an instance's termination.
#[derive(Clone)]
pub struct TerminationSequencer {
    inner: Arc<Inner>,
}

impl TerminationSequencer {
    pub fn new(
        coordinator: Arc<DrainCoordinator>,
        identity: Arc<Identity>,
        convergence_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SequencerState::Idle);
        Self {
            inner: Arc::new(Inner {
                coordinator,
                identity,
                convergence_delay,
                state,
            }),
        }
    }

    pub fn state(&self) -> SequencerState {
        *self.inner.state.borrow()
    }

    /// Pre-termination trigger. Resolves once drain has begun.
    pub async fn pre_stop(&self) -> PreStopOutcome {
        if self.inner.claim() {
            tracing::info!(
                service = %self.inner.identity.service,
                hostname = %self.inner.identity.hostname,
                delay_ms = self.inner.convergence_delay.as_millis() as u64,
                "Pre-stop hook fired, waiting for routing convergence"
            );
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(inner.convergence_delay).await;
                inner.finish();
                tracing::info!(
                    service = %inner.identity.service,
                    hostname = %inner.identity.hostname,
                    "Pre-stop complete, drain flag is set"
                );
            });
            self.wait_drained().await;
            return PreStopOutcome::Converged;
        }

        match self.state() {
            SequencerState::Drained => PreStopOutcome::AlreadyDrained,
            _ => {
                tracing::debug!(
                    service = %self.inner.identity.service,
                    hostname = %self.inner.identity.hostname,
                    "Pre-stop trigger joined an in-progress convergence"
                );
                self.wait_drained().await;
                PreStopOutcome::Joined
            }
        }
    }

    /// Termination-signal path. When this returns the coordinator is draining.
    pub async fn on_termination_signal(&self) -> SignalOutcome {
        if self.inner.claim() {
            tracing::warn!(
                service = %self.inner.identity.service,
                hostname = %self.inner.identity.hostname,
                "Termination signal arrived before pre-stop hook, draining without convergence delay"
            );
            self.inner.finish();
            return SignalOutcome::DrainedImmediately;
        }

        match self.state() {
            SequencerState::Drained => SignalOutcome::AlreadyDrained,
            _ => {
                tracing::info!(
                    service = %self.inner.identity.service,
                    hostname = %self.inner.identity.hostname,
                    "Termination signal arrived mid-convergence, letting it complete"
                );
                self.wait_drained().await;
                SignalOutcome::AwaitedConvergence
            }
        }
    }

    async fn wait_drained(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot close early.
        let _ = rx.wait_for(|state| *state == SequencerState::Drained).await;
    }
}

impl std::fmt::Debug for TerminationSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationSequencer")
            .field("identity", &self.inner.identity)
            .field("state", &self.state())
            .field("convergence_delay", &self.inner.convergence_delay)
            .finish()
    }
}

//! Host biometric service contract
//!
//! The adapter never talks to a sensor itself. Whatever the host offers
//! (fprintd, Windows Hello, a mobile OS prompt behind an FFI layer, a test
//! double) is wrapped in a [`BiometricService`] and handed to
//! [`crate::adapter::BiometricAdapter`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::BiometricResult;
use crate::models::{Availability, AuthOutcome, BiometricKind, PromptConfig};

/// Outcome delivered when a service drops its completion without using it
pub const DROPPED_COMPLETION: &str = "completion dropped by service";

/// Host-side biometric authentication service
#[async_trait]
pub trait BiometricService: Send + Sync {
    /// Query hardware presence and enrollment.
    ///
    /// `Err` means the security subsystem itself could not be queried.
    async fn probe(&self) -> BiometricResult<Availability>;

    /// Modality of the sensor. Must not block or show any UI.
    fn kind(&self) -> BiometricKind;

    /// Start one challenge and eventually consume `completion`.
    ///
    /// Implementations may complete inline or move `completion` into a
    /// callback that fires later.
    async fn evaluate(&self, prompt: PromptConfig, completion: Completion);
}

/// Single-use handle for delivering an [`AuthOutcome`]
///
/// Dropping it unused delivers a system error instead, so the waiting
/// caller always gets exactly one result. An adapter's in-flight flag rides
/// along with the handle and is cleared just before the outcome is sent.
#[derive(Debug)]
pub struct Completion {
    tx: Option<oneshot::Sender<AuthOutcome>>,
    in_flight: Option<Arc<AtomicBool>>,
}

impl Completion {
    /// Create a completion and the receiver it resolves
    pub fn channel() -> (Self, oneshot::Receiver<AuthOutcome>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            tx: Some(tx),
            in_flight: None,
        };
        (completion, rx)
    }

    /// Keep `flag` set until this completion is used or dropped
    pub(crate) fn holding(mut self, flag: Arc<AtomicBool>) -> Self {
        self.in_flight = Some(flag);
        self
    }

    /// Deliver the outcome
    pub fn complete(mut self, outcome: AuthOutcome) {
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: AuthOutcome) {
        if let Some(flag) = self.in_flight.take() {
            flag.store(false, Ordering::Release);
        }
        if let Some(tx) = self.tx.take() {
            // Receiver gone means the caller stopped waiting
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("Biometric service dropped its completion without a result");
        }
        self.finish(AuthOutcome::system_error(DROPPED_COMPLETION));
    }
}

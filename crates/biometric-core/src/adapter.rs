//! Biometric adapter facade
//!
//! Translates three calls (availability, one challenge, sensor kind) into
//! calls on a host [`BiometricService`]. There is no retry, queue or timer:
//! one attempt runs until the host completes it.
//!
//! Only one attempt may be in flight per adapter. A second call made while
//! the first is pending is rejected with a system error and never reaches
//! the host.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{AuthOutcome, BiometricKind, PromptConfig};
use crate::service::{BiometricService, Completion};

/// Outcome detail for a call rejected because another one is pending
pub const ALREADY_IN_PROGRESS: &str = "authentication already in progress";

/// Facade over the host biometric service
#[derive(Clone)]
pub struct BiometricAdapter {
    service: Arc<dyn BiometricService>,
    in_flight: Arc<AtomicBool>,
}

/// Holds the in-flight flag until the attempt ends before reaching the
/// host, or until it is handed to the host's [`Completion`]
struct InFlightGuard {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: flag.clone(),
                armed: true,
            })
    }

    /// Pass ownership of the flag to `completion`
    fn hand_off(mut self, completion: Completion) -> Completion {
        self.armed = false;
        completion.holding(self.flag.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(false, Ordering::Release);
        }
    }
}

impl BiometricAdapter {
    pub fn new(service: Arc<dyn BiometricService>) -> Self {
        Self {
            service,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True only when hardware is present, a template is enrolled, and the
    /// host answered the query without error
    pub async fn is_available(&self) -> bool {
        match self.service.probe().await {
            Ok(availability) => availability.is_ready(),
            Err(e) => {
                debug!("Biometric probe failed, reporting unavailable: {}", e);
                false
            }
        }
    }

    /// Best-effort sensor modality; never prompts
    pub fn biometric_kind(&self) -> BiometricKind {
        self.service.kind()
    }

    /// Whether an attempt is currently pending
    pub fn is_authenticating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one challenge with the given prompt strings
    pub async fn authenticate(
        &self,
        title: &str,
        subtitle: &str,
        cancel_label: &str,
    ) -> AuthOutcome {
        self.authenticate_prompt(PromptConfig::new(title, subtitle, cancel_label))
            .await
    }

    /// Run one challenge and resolve to its outcome
    pub async fn authenticate_prompt(&self, prompt: PromptConfig) -> AuthOutcome {
        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("Rejected authentication request: another attempt is pending");
            return AuthOutcome::system_error(ALREADY_IN_PROGRESS);
        };

        let attempt = Uuid::new_v4();
        debug!(%attempt, title = %prompt.title, "Starting biometric authentication");

        match self.service.probe().await {
            Ok(availability) if availability.is_ready() => {}
            Ok(availability) => {
                info!(
                    %attempt,
                    hardware_present = availability.hardware_present,
                    enrolled = availability.enrolled,
                    "Biometric authentication unavailable"
                );
                return AuthOutcome::Unavailable;
            }
            Err(e) => {
                warn!(%attempt, "Biometric probe failed: {}", e);
                return AuthOutcome::system_error(e.to_string());
            }
        }

        // From here the flag is cleared by the host completing, not by the caller
        let (completion, rx) = Completion::channel();
        let completion = guard.hand_off(completion);
        self.service.evaluate(prompt, completion).await;

        let outcome = rx
            .await
            .unwrap_or_else(|e| AuthOutcome::system_error(e.to_string()));
        info!(%attempt, result = outcome.code(), "Biometric authentication finished");
        outcome
    }

    /// Callback form of [`Self::authenticate_prompt`]
    ///
    /// Spawns the attempt on the current tokio runtime; `on_complete` runs
    /// exactly once with the outcome.
    pub fn authenticate_with<F>(&self, prompt: PromptConfig, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(AuthOutcome) + Send + 'static,
    {
        let adapter = self.clone();
        tokio::spawn(async move {
            let outcome = adapter.authenticate_prompt(prompt).await;
            on_complete(outcome);
        })
    }
}

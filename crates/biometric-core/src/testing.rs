//! Scriptable in-memory biometric service for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{BiometricError, BiometricResult};
use crate::models::{Availability, AuthOutcome, BiometricKind, PromptConfig};
use crate::service::{BiometricService, Completion};

/// How the fake answers a challenge
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Complete immediately with this outcome
    Complete(AuthOutcome),
    /// Drop the completion without using it
    Drop,
    /// Hold the completion until [`FakeService::release`] is called
    Hold,
}

/// Test double standing in for the host service
pub struct FakeService {
    probe: Result<Availability, String>,
    kind: BiometricKind,
    response: FakeResponse,
    held: Mutex<Option<Completion>>,
    prompts: Mutex<Vec<PromptConfig>>,
    probe_calls: AtomicUsize,
    evaluate_calls: AtomicUsize,
    evaluating: Notify,
}

impl FakeService {
    pub fn new(
        probe: Result<Availability, String>,
        kind: BiometricKind,
        response: FakeResponse,
    ) -> Self {
        Self {
            probe,
            kind,
            response,
            held: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            probe_calls: AtomicUsize::new(0),
            evaluate_calls: AtomicUsize::new(0),
            evaluating: Notify::new(),
        }
    }

    /// Enrolled face sensor that always verifies
    pub fn face_success() -> Self {
        Self::new(
            Ok(Availability::ready()),
            BiometricKind::Face,
            FakeResponse::Complete(AuthOutcome::Success),
        )
    }

    /// Fingerprint hardware with nothing enrolled
    pub fn not_enrolled() -> Self {
        let availability = Availability {
            hardware_present: true,
            enrolled: false,
        };
        Self::new(
            Ok(availability),
            BiometricKind::Fingerprint,
            FakeResponse::Complete(AuthOutcome::Unavailable),
        )
    }

    /// Enrolled sensor answering with `outcome`
    pub fn responding(outcome: AuthOutcome) -> Self {
        Self::new(
            Ok(Availability::ready()),
            BiometricKind::Fingerprint,
            FakeResponse::Complete(outcome),
        )
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn evaluate_calls(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<PromptConfig> {
        self.prompts.lock().unwrap().clone()
    }

    /// Wait until a challenge has reached the fake
    pub async fn wait_for_evaluate(&self) {
        self.evaluating.notified().await;
    }

    /// Complete a held challenge. Returns false if nothing was held.
    pub fn release(&self, outcome: AuthOutcome) -> bool {
        match self.held.lock().unwrap().take() {
            Some(completion) => {
                completion.complete(outcome);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl BiometricService for FakeService {
    async fn probe(&self) -> BiometricResult<Availability> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.clone().map_err(BiometricError::ProbeFailed)
    }

    fn kind(&self) -> BiometricKind {
        self.kind
    }

    async fn evaluate(&self, prompt: PromptConfig, completion: Completion) {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt);

        match &self.response {
            FakeResponse::Complete(outcome) => completion.complete(outcome.clone()),
            FakeResponse::Drop => drop(completion),
            FakeResponse::Hold => {
                *self.held.lock().unwrap() = Some(completion);
            }
        }
        self.evaluating.notify_one();
    }
}

//! Observable authentication state for a UI layer
//!
//! Wraps an adapter and records what a screen needs to render: whether
//! biometrics are available, whether a prompt is up, and the last result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::adapter::BiometricAdapter;
use crate::models::{AuthOutcome, PromptConfig};

/// Snapshot of session state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// None until availability has been checked
    pub available: Option<bool>,
    pub authenticating: bool,
    pub last_outcome: Option<AuthOutcome>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Adapter plus the state a screen observes
#[derive(Clone)]
pub struct AuthSession {
    adapter: BiometricAdapter,
    state: Arc<RwLock<SessionState>>,
}

impl AuthSession {
    pub fn new(adapter: BiometricAdapter) -> Self {
        Self {
            adapter,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn adapter(&self) -> &BiometricAdapter {
        &self.adapter
    }

    /// Refresh the availability flag
    pub async fn check_availability(&self) -> bool {
        let available = self.adapter.is_available().await;
        self.state.write().await.available = Some(available);
        available
    }

    /// Run one attempt, recording progress and result
    pub async fn authenticate(&self, prompt: PromptConfig) -> AuthOutcome {
        {
            let mut state = self.state.write().await;
            state.authenticating = true;
            state.last_outcome = None;
        }

        let outcome = self.adapter.authenticate_prompt(prompt).await;

        let mut state = self.state.write().await;
        state.authenticating = false;
        state.last_outcome = Some(outcome.clone());
        state.completed_at = Some(Utc::now());
        outcome
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;
    use crate::models::BiometricKind;
    use crate::testing::{FakeResponse, FakeService};

    #[tokio::test]
    async fn test_initial_state() {
        let adapter = BiometricAdapter::new(Arc::new(FakeService::face_success()));
        let session = AuthSession::new(adapter);
        let state = session.snapshot().await;
        assert_eq!(state.available, None);
        assert!(!state.authenticating);
        assert!(state.last_outcome.is_none());
    }

    #[tokio::test]
    async fn test_check_availability() {
        let adapter = BiometricAdapter::new(Arc::new(FakeService::not_enrolled()));
        let session = AuthSession::new(adapter);
        assert!(!session.check_availability().await);
        assert_eq!(session.snapshot().await.available, Some(false));
    }

    #[tokio::test]
    async fn test_authenticate_records_outcome() {
        let session = AuthSession::new(BiometricAdapter::new(Arc::new(FakeService::responding(
            AuthOutcome::Cancelled,
        ))));

        let outcome = session.authenticate(PromptConfig::default()).await;
        assert_eq!(outcome, AuthOutcome::Cancelled);

        let state = session.snapshot().await;
        assert!(!state.authenticating);
        assert_eq!(state.last_outcome, Some(AuthOutcome::Cancelled));
        assert!(state.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_authenticating_flag_while_pending() {
        let fake = Arc::new(FakeService::new(
            Ok(Availability::ready()),
            BiometricKind::Face,
            FakeResponse::Hold,
        ));
        let session = AuthSession::new(BiometricAdapter::new(fake.clone()));

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.authenticate(PromptConfig::default()).await })
        };
        fake.wait_for_evaluate().await;

        let state = session.snapshot().await;
        assert!(state.authenticating);
        assert!(state.last_outcome.is_none());

        fake.release(AuthOutcome::Success);
        assert!(pending.await.unwrap().is_success());
        assert_eq!(session.snapshot().await.last_outcome, Some(AuthOutcome::Success));
    }
}

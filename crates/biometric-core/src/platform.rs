//! Host biometric services
//!
//! Platform-specific implementations of [`BiometricService`]:
//! - Linux: fprintd via its command line helpers
//! - Windows: Windows Hello via `UserConsentVerifier`
//! - Everything else: a service that reports no hardware

use std::path::Path;
use std::process::Output;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{BiometricConfig, FprintdConfig, ServiceBackend};
use crate::error::{BiometricError, BiometricResult};
use crate::models::{Availability, AuthOutcome, BiometricKind, PromptConfig};
use crate::service::{BiometricService, Completion};

/// Build the service selected by the configuration
pub fn system_service(config: &BiometricConfig) -> Arc<dyn BiometricService> {
    match config.backend {
        ServiceBackend::System => native_service(config),
        ServiceBackend::Fprintd => Arc::new(FprintdService::from_config(&config.fprintd)),
        ServiceBackend::WindowsHello => windows_hello_service(),
        ServiceBackend::Unsupported => Arc::new(UnsupportedService),
    }
}

#[cfg(target_os = "linux")]
fn native_service(config: &BiometricConfig) -> Arc<dyn BiometricService> {
    Arc::new(FprintdService::from_config(&config.fprintd))
}

#[cfg(target_os = "windows")]
fn native_service(_config: &BiometricConfig) -> Arc<dyn BiometricService> {
    windows_hello_service()
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn native_service(_config: &BiometricConfig) -> Arc<dyn BiometricService> {
    Arc::new(UnsupportedService)
}

#[cfg(target_os = "windows")]
fn windows_hello_service() -> Arc<dyn BiometricService> {
    Arc::new(windows_hello::WindowsHelloService)
}

#[cfg(not(target_os = "windows"))]
fn windows_hello_service() -> Arc<dyn BiometricService> {
    warn!("Windows Hello requested on a non-Windows platform");
    Arc::new(UnsupportedService)
}

/// Host without biometric support
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedService;

#[async_trait]
impl BiometricService for UnsupportedService {
    async fn probe(&self) -> BiometricResult<Availability> {
        Ok(Availability::default())
    }

    fn kind(&self) -> BiometricKind {
        BiometricKind::None
    }

    async fn evaluate(&self, _prompt: PromptConfig, completion: Completion) {
        completion.complete(AuthOutcome::Unavailable);
    }
}

/// fprintd, driven through `fprintd-list` and `fprintd-verify`
#[derive(Debug, Clone)]
pub struct FprintdService {
    user: String,
    list_program: String,
    verify_program: String,
}

impl FprintdService {
    pub fn from_config(config: &FprintdConfig) -> Self {
        let user = config
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default();

        Self {
            user,
            list_program: config.list_program.clone(),
            verify_program: config.verify_program.clone(),
        }
    }

    async fn run(&self, program: &str) -> std::io::Result<Output> {
        let mut cmd = Command::new(program);
        if !self.user.is_empty() {
            cmd.arg(&self.user);
        }
        cmd.kill_on_drop(true).output().await
    }
}

#[async_trait]
impl BiometricService for FprintdService {
    async fn probe(&self) -> BiometricResult<Availability> {
        match self.run(&self.list_program).await {
            Ok(output) => Ok(parse_list_output(&combined_output(&output))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not installed", self.list_program);
                Ok(Availability::default())
            }
            Err(e) => Err(BiometricError::ProbeFailed(format!(
                "{}: {}",
                self.list_program, e
            ))),
        }
    }

    fn kind(&self) -> BiometricKind {
        if program_on_path(&self.verify_program) {
            BiometricKind::Fingerprint
        } else {
            BiometricKind::None
        }
    }

    async fn evaluate(&self, prompt: PromptConfig, completion: Completion) {
        // fprintd has no dialog of its own
        info!("{}", prompt.reason());

        let outcome = match self.run(&self.verify_program).await {
            Ok(output) => parse_verify_output(output.status.success(), &combined_output(&output)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AuthOutcome::Unavailable,
            Err(e) => AuthOutcome::system_error(format!("{}: {}", self.verify_program, e)),
        };
        completion.complete(outcome);
    }
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Interpret `fprintd-list <user>` output
pub fn parse_list_output(text: &str) -> Availability {
    if text.contains("No devices available") {
        return Availability::default();
    }

    let hardware_present = text.contains("Using device")
        || text.contains("Device at")
        || text.contains("Fingerprints for user")
        || text.contains("no fingers enrolled");
    let enrolled = text
        .lines()
        .any(|line| line.trim_start().starts_with("- #"));

    Availability {
        hardware_present,
        enrolled: hardware_present && enrolled,
    }
}

/// Interpret `fprintd-verify <user>` output
pub fn parse_verify_output(exited_ok: bool, text: &str) -> AuthOutcome {
    if text.contains("verify-no-match") {
        AuthOutcome::Failed
    } else if text.contains("verify-match") {
        AuthOutcome::Success
    } else if text.contains("verify-disconnected")
        || text.contains("No devices available")
        || text.contains("no fingers enrolled")
    {
        AuthOutcome::Unavailable
    } else if let Some(line) = text.lines().find(|l| l.contains("verify-unknown-error")) {
        AuthOutcome::system_error(line.trim())
    } else if exited_ok {
        AuthOutcome::system_error("fprintd-verify returned no result")
    } else {
        AuthOutcome::system_error(
            text.lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("fprintd-verify failed")
                .trim(),
        )
    }
}

/// Whether `program` resolves to a file, either directly or on PATH
fn program_on_path(program: &str) -> bool {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file();
    }

    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(target_os = "windows")]
mod windows_hello {
    use super::*;
    use windows::core::HSTRING;
    use windows::Security::Credentials::UI::{
        UserConsentVerificationResult, UserConsentVerifier, UserConsentVerifierAvailability,
    };

    /// Windows Hello through `UserConsentVerifier`
    pub struct WindowsHelloService;

    fn check_availability() -> BiometricResult<Availability> {
        let availability = UserConsentVerifier::CheckAvailabilityAsync()
            .and_then(|op| op.get())
            .map_err(|e| {
                BiometricError::ProbeFailed(format!("Hello availability check failed: {}", e))
            })?;

        match availability {
            UserConsentVerifierAvailability::Available => Ok(Availability::ready()),
            UserConsentVerifierAvailability::DeviceNotPresent => Ok(Availability::default()),
            UserConsentVerifierAvailability::NotConfiguredForUser
            | UserConsentVerifierAvailability::DisabledByPolicy => Ok(Availability {
                hardware_present: true,
                enrolled: false,
            }),
            other => Err(BiometricError::ProbeFailed(format!(
                "Windows Hello availability: {:?}",
                other
            ))),
        }
    }

    fn request_verification(reason: String) -> AuthOutcome {
        let message = HSTRING::from(reason);
        let result =
            UserConsentVerifier::RequestVerificationAsync(&message).and_then(|op| op.get());

        match result {
            Ok(UserConsentVerificationResult::Verified) => AuthOutcome::Success,
            Ok(UserConsentVerificationResult::Canceled) => AuthOutcome::Cancelled,
            Ok(UserConsentVerificationResult::RetriesExhausted) => AuthOutcome::Failed,
            Ok(UserConsentVerificationResult::DeviceNotPresent)
            | Ok(UserConsentVerificationResult::NotConfiguredForUser)
            | Ok(UserConsentVerificationResult::DisabledByPolicy) => AuthOutcome::Unavailable,
            Ok(UserConsentVerificationResult::DeviceBusy) => {
                AuthOutcome::system_error("Windows Hello device busy")
            }
            Ok(other) => AuthOutcome::system_error(format!("Windows Hello result: {:?}", other)),
            Err(e) => AuthOutcome::system_error(format!("Hello request failed: {}", e)),
        }
    }

    #[async_trait]
    impl BiometricService for WindowsHelloService {
        async fn probe(&self) -> BiometricResult<Availability> {
            tokio::task::spawn_blocking(check_availability)
                .await
                .map_err(|e| BiometricError::ProbeFailed(e.to_string()))?
        }

        // Hello does not say which sensor backs it without prompting
        fn kind(&self) -> BiometricKind {
            BiometricKind::Face
        }

        async fn evaluate(&self, prompt: PromptConfig, completion: Completion) {
            debug!(cancel_label = %prompt.cancel_label, "Windows Hello uses its own cancel label");
            let reason = prompt.reason();
            let outcome = tokio::task::spawn_blocking(move || request_verification(reason))
                .await
                .unwrap_or_else(|e| AuthOutcome::system_error(e.to_string()));
            completion.complete(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_ENROLLED: &str = "found 1 devices
Device at /net/reactivated/Fprint/Device/0
Using device /net/reactivated/Fprint/Device/0
Fingerprints for user alice on Synaptics Sensors (press):
 - #0: right-index-finger
";

    const LIST_EMPTY: &str = "found 1 devices
Device at /net/reactivated/Fprint/Device/0
Using device /net/reactivated/Fprint/Device/0
User alice has no fingers enrolled for Synaptics Sensors.
";

    #[test]
    fn test_list_enrolled() {
        assert_eq!(parse_list_output(LIST_ENROLLED), Availability::ready());
    }

    #[test]
    fn test_list_not_enrolled() {
        let availability = parse_list_output(LIST_EMPTY);
        assert!(availability.hardware_present);
        assert!(!availability.enrolled);
    }

    #[test]
    fn test_list_no_device() {
        assert_eq!(parse_list_output("No devices available\n"), Availability::default());
    }

    #[test]
    fn test_verify_results() {
        let prefix = "Using device /net/reactivated/Fprint/Device/0\nListing enrolled fingers:\n";
        assert_eq!(
            parse_verify_output(true, &format!("{prefix}Verify result: verify-match (done)\n")),
            AuthOutcome::Success
        );
        assert_eq!(
            parse_verify_output(false, &format!("{prefix}Verify result: verify-no-match (done)\n")),
            AuthOutcome::Failed
        );
        assert_eq!(
            parse_verify_output(false, "Verify result: verify-disconnected (done)\n"),
            AuthOutcome::Unavailable
        );
        assert_eq!(
            parse_verify_output(false, "No devices available\n"),
            AuthOutcome::Unavailable
        );
    }

    #[test]
    fn test_verify_unrecognised_output() {
        let outcome = parse_verify_output(false, "GDBus.Error: permission denied\n");
        assert_eq!(outcome, AuthOutcome::system_error("GDBus.Error: permission denied"));

        let outcome = parse_verify_output(false, "");
        assert_eq!(outcome, AuthOutcome::system_error("fprintd-verify failed"));
    }

    #[tokio::test]
    async fn test_unsupported_service() {
        let service = UnsupportedService;
        assert!(!service.probe().await.unwrap().is_ready());
        assert_eq!(service.kind(), BiometricKind::None);

        let (completion, rx) = Completion::channel();
        service.evaluate(PromptConfig::default(), completion).await;
        assert_eq!(rx.await.unwrap(), AuthOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_fprintd_missing_binaries() {
        let service = FprintdService::from_config(&FprintdConfig {
            user: Some("nobody".to_string()),
            list_program: "bioauth-test-no-such-list".to_string(),
            verify_program: "bioauth-test-no-such-verify".to_string(),
        });

        assert_eq!(service.probe().await.unwrap(), Availability::default());
        assert_eq!(service.kind(), BiometricKind::None);

        let (completion, rx) = Completion::channel();
        service.evaluate(PromptConfig::default(), completion).await;
        assert_eq!(rx.await.unwrap(), AuthOutcome::Unavailable);
    }

    #[test]
    fn test_unsupported_backend_selected() {
        let config = BiometricConfig {
            backend: ServiceBackend::Unsupported,
            ..Default::default()
        };
        assert_eq!(system_service(&config).kind(), BiometricKind::None);
    }
}

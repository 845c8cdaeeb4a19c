//! Data models for prompts, outcomes and sensor kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BiometricError;

/// Prompt strings shown by the host authentication UI
///
/// Passed through verbatim; no validation or localization happens here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    /// Dialog title
    pub title: String,
    /// Secondary line under the title
    pub subtitle: String,
    /// Label of the cancel / negative button
    pub cancel_label: String,
}

impl PromptConfig {
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        cancel_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            cancel_label: cancel_label.into(),
        }
    }

    /// Single reason string for hosts that only take one line of text
    pub fn reason(&self) -> String {
        if self.subtitle.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.subtitle)
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            title: "Biometric Authentication".to_string(),
            subtitle: "Please authenticate to continue".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

/// Outcome of one authentication attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuthOutcome {
    /// The user was verified
    Success,
    /// The user dismissed the prompt
    Cancelled,
    /// The sensor was read but did not match
    Failed,
    /// No hardware, nothing enrolled, or the sensor is off
    Unavailable,
    /// The host reported an error (lockout, busy device, internal failure)
    SystemError {
        detail: String,
    },
}

impl AuthOutcome {
    pub const SUCCESS: &'static str = "SUCCESS";
    pub const USER_CANCELED: &'static str = "USER_CANCELED";
    pub const NOT_AVAILABLE: &'static str = "NOT_AVAILABLE";
    pub const FAILED: &'static str = "FAILED";
    pub const ERROR: &'static str = "ERROR";

    pub fn system_error(detail: impl Into<String>) -> Self {
        AuthOutcome::SystemError {
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success)
    }

    /// Wire code used by the string bridge
    pub fn code(&self) -> &'static str {
        match self {
            AuthOutcome::Success => Self::SUCCESS,
            AuthOutcome::Cancelled => Self::USER_CANCELED,
            AuthOutcome::Failed => Self::FAILED,
            AuthOutcome::Unavailable => Self::NOT_AVAILABLE,
            AuthOutcome::SystemError { .. } => Self::ERROR,
        }
    }

    /// Parse a wire code, treating anything unrecognised as a system error
    pub fn from_code(code: &str) -> Self {
        code.parse()
            .unwrap_or_else(|e: BiometricError| AuthOutcome::system_error(e.to_string()))
    }
}

impl FromStr for AuthOutcome {
    type Err = BiometricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::SUCCESS => Ok(AuthOutcome::Success),
            Self::USER_CANCELED => Ok(AuthOutcome::Cancelled),
            Self::NOT_AVAILABLE => Ok(AuthOutcome::Unavailable),
            Self::FAILED => Ok(AuthOutcome::Failed),
            Self::ERROR => Ok(AuthOutcome::system_error("host reported an error")),
            other => Err(BiometricError::UnknownCode(other.to_string())),
        }
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Success => write!(f, "Authentication successful"),
            AuthOutcome::Cancelled => write!(f, "Authentication canceled"),
            AuthOutcome::Failed => write!(f, "Authentication failed"),
            AuthOutcome::Unavailable => write!(f, "Biometric authentication not available"),
            AuthOutcome::SystemError { detail } => write!(f, "Authentication error: {}", detail),
        }
    }
}

/// Sensor modality present on the device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BiometricKind {
    Face,
    Fingerprint,
    Iris,
    #[default]
    None,
}

impl BiometricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiometricKind::Face => "face",
            BiometricKind::Fingerprint => "fingerprint",
            BiometricKind::Iris => "iris",
            BiometricKind::None => "none",
        }
    }

    /// User-facing name, suitable for a button label
    pub fn label(&self) -> &'static str {
        match self {
            BiometricKind::Face => "Face ID",
            BiometricKind::Fingerprint => "Fingerprint",
            BiometricKind::Iris => "Iris",
            BiometricKind::None => "Biometric Authentication",
        }
    }
}

impl fmt::Display for BiometricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a host probe found
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Availability {
    /// Sensor hardware is present and powered
    pub hardware_present: bool,
    /// At least one template is enrolled for the current user
    pub enrolled: bool,
}

impl Availability {
    pub fn ready() -> Self {
        Self {
            hardware_present: true,
            enrolled: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.hardware_present && self.enrolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_joins_subtitle() {
        let prompt = PromptConfig::new("Unlock", "Confirm it's you", "Cancel");
        assert_eq!(prompt.reason(), "Unlock\nConfirm it's you");

        let prompt = PromptConfig::new("Unlock", "", "Cancel");
        assert_eq!(prompt.reason(), "Unlock");
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(AuthOutcome::Success.code(), "SUCCESS");
        assert_eq!(AuthOutcome::Cancelled.code(), "USER_CANCELED");
        assert_eq!(AuthOutcome::Unavailable.code(), "NOT_AVAILABLE");
        assert_eq!(AuthOutcome::system_error("lockout").code(), "ERROR");

        assert_eq!(AuthOutcome::from_code("SUCCESS"), AuthOutcome::Success);
        assert_eq!(AuthOutcome::from_code("USER_CANCELED"), AuthOutcome::Cancelled);
        assert_eq!(AuthOutcome::from_code("FAILED"), AuthOutcome::Failed);
    }

    #[test]
    fn test_unknown_code_is_system_error() {
        let outcome = AuthOutcome::from_code("LOCKED_OUT");
        assert!(matches!(
            outcome,
            AuthOutcome::SystemError { ref detail } if detail.contains("LOCKED_OUT")
        ));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(BiometricKind::Face.as_str(), "face");
        assert_eq!(BiometricKind::None.as_str(), "none");
        assert_eq!(BiometricKind::None.label(), "Biometric Authentication");
        // fprintd and other non-Apple readers must not be called Touch ID
        assert_eq!(BiometricKind::Fingerprint.label(), "Fingerprint");
        assert_eq!(BiometricKind::default(), BiometricKind::None);
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_string(&AuthOutcome::system_error("busy")).unwrap();
        assert_eq!(json, r#"{"outcome":"system_error","detail":"busy"}"#);
    }
}

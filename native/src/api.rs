//! API exposed to mobile front ends via flutter_rust_bridge
//!
//! These functions will be automatically wrapped for Dart. All of them go
//! through one process-wide bridge, so only one challenge can be in flight
//! no matter how many front-end calls overlap. The bridge is built from the
//! user's config file on first use unless the host installs its own.

use std::sync::OnceLock;

use biometric_core::{load_config, resolve_config_path, BiometricConfig};
use tracing::warn;

use crate::biometric::BiometricBridge;

static BRIDGE: OnceLock<BiometricBridge> = OnceLock::new();

/// Use `bridge` for every call in this process
///
/// Returns false if a bridge is already in place (installed earlier or
/// built by a previous call).
pub fn install_bridge(bridge: BiometricBridge) -> bool {
    BRIDGE.set(bridge).is_ok()
}

fn bridge() -> &'static BiometricBridge {
    BRIDGE.get_or_init(|| BiometricBridge::from_config(&configured()))
}

/// Config from the config file, or defaults if it cannot be read
fn configured() -> BiometricConfig {
    let path = resolve_config_path();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string())
        .and_then(|rt| rt.block_on(load_config(&path)).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            warn!("Using default biometric config ({}): {}", path.display(), e);
            BiometricConfig::default()
        })
}

/// Check if biometric authentication is available
pub fn is_biometric_available() -> bool {
    bridge().is_biometric_available()
}

/// Authenticate the user; `completion` receives one result code
pub fn authenticate(
    title: String,
    subtitle: String,
    cancel_text: String,
    completion: impl FnOnce(String) + Send + 'static,
) {
    bridge().authenticate(title, subtitle, cancel_text, completion)
}

/// Name of the biometric sensor for display
pub fn get_biometric_type() -> String {
    bridge().get_biometric_type()
}

#[cfg(test)]
mod tests {
    use super::*;
    use biometric_core::testing::{FakeResponse, FakeService};
    use biometric_core::{AuthOutcome, Availability, BiometricKind};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    // The bridge is process-wide, so everything touching it lives in one test
    #[test]
    fn test_overlapping_calls_share_one_bridge() {
        let fake = Arc::new(FakeService::new(
            Ok(Availability::ready()),
            BiometricKind::Fingerprint,
            FakeResponse::Hold,
        ));
        assert!(install_bridge(BiometricBridge::with_service(fake.clone())));
        let other = BiometricBridge::with_service(Arc::new(FakeService::face_success()));
        assert!(!install_bridge(other));

        assert!(is_biometric_available());
        assert_eq!(get_biometric_type(), "Fingerprint");

        let (first_tx, first_rx) = mpsc::channel();
        authenticate("t".into(), "s".into(), "c".into(), move |code| {
            first_tx.send(code).unwrap()
        });
        while fake.evaluate_calls() == 0 {
            std::thread::sleep(Duration::from_millis(5));
        }

        let (second_tx, second_rx) = mpsc::channel();
        authenticate("t".into(), "s".into(), "c".into(), move |code| {
            second_tx.send(code).unwrap()
        });
        assert_eq!(second_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "ERROR");
        assert_eq!(fake.evaluate_calls(), 1);

        while !fake.release(AuthOutcome::Success) {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(first_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "SUCCESS");
        assert_eq!(fake.evaluate_calls(), 1);
    }
}

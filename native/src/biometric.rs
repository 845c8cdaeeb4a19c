//! String-typed biometric bridge
//!
//! Foreign callers (mobile UI layers, FFI glue) do not run a tokio
//! runtime and want plain strings back. `BiometricBridge` drives the
//! adapter on a private runtime and reports outcomes as wire codes
//! (`SUCCESS`, `USER_CANCELED`, `NOT_AVAILABLE`, `FAILED`, `ERROR`).
//!
//! Do not call these methods from inside a tokio runtime.

use std::sync::{Arc, Mutex};

use biometric_core::{
    system_service, AuthOutcome, BiometricAdapter, BiometricConfig, BiometricService,
};
use tokio::runtime::{Builder, Runtime};
use tracing::warn;

fn runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Bridge between foreign callers and the biometric adapter
#[derive(Clone)]
pub struct BiometricBridge {
    adapter: BiometricAdapter,
}

impl BiometricBridge {
    /// Bridge over the platform's native service
    pub fn new() -> Self {
        Self::from_config(&BiometricConfig::default())
    }

    pub fn from_config(config: &BiometricConfig) -> Self {
        Self::with_service(system_service(config))
    }

    pub fn with_service(service: Arc<dyn BiometricService>) -> Self {
        Self {
            adapter: BiometricAdapter::new(service),
        }
    }

    /// Check if biometric authentication is available on the device
    pub fn is_biometric_available(&self) -> bool {
        match runtime() {
            Ok(rt) => rt.block_on(self.adapter.is_available()),
            Err(e) => {
                warn!("Failed to start runtime for availability check: {}", e);
                false
            }
        }
    }

    /// Authenticate on a background thread and hand the wire code to
    /// `completion` exactly once
    pub fn authenticate<F>(
        &self,
        title: String,
        subtitle: String,
        cancel_text: String,
        completion: F,
    ) where
        F: FnOnce(String) + Send + 'static,
    {
        // Shared so the caller's thread can still deliver if spawning fails
        let slot = Arc::new(Mutex::new(Some(completion)));
        let worker_slot = slot.clone();
        let adapter = self.adapter.clone();

        let spawned = std::thread::Builder::new()
            .name("biometric-auth".to_string())
            .spawn(move || {
                let code = match runtime() {
                    Ok(rt) => rt
                        .block_on(adapter.authenticate(&title, &subtitle, &cancel_text))
                        .code(),
                    Err(e) => {
                        warn!("Failed to start runtime for authentication: {}", e);
                        AuthOutcome::ERROR
                    }
                };
                deliver(&worker_slot, code);
            });

        if let Err(e) = spawned {
            warn!("Failed to spawn authentication thread: {}", e);
            deliver(&slot, AuthOutcome::ERROR);
        }
    }

    /// User-facing name of the sensor, e.g. "Face ID"
    pub fn get_biometric_type(&self) -> String {
        self.adapter.biometric_kind().label().to_string()
    }
}

impl Default for BiometricBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn deliver<F>(slot: &Mutex<Option<F>>, code: &str)
where
    F: FnOnce(String),
{
    let completion = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };
    if let Some(completion) = completion {
        completion(code.to_string());
    }
}

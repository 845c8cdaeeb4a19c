//! Biometric Core - Adapter over host biometric authentication
//!
//! This crate provides:
//! - A closed outcome model for authentication attempts
//! - The `BiometricService` contract a host implements
//! - `BiometricAdapter`, the availability / challenge / kind facade
//! - `AuthSession`, observable state for UI layers
//! - fprintd and Windows Hello services, plus TOML configuration

pub mod models;
pub mod service;
pub mod adapter;
pub mod session;
pub mod platform;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use models::*;
pub use service::*;
pub use adapter::*;
pub use session::*;
pub use platform::*;
pub use config::*;
pub use error::*;

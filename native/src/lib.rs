//! Native bindings for mobile apps
//!
//! Exposes the biometric adapter to foreign UI layers with string results,
//! using flutter_rust_bridge-style free functions.

pub mod api;
pub mod biometric;

pub use api::*;
pub use biometric::*;

//! polgate core: policy model, key derivation, document loading and the
//! admin-service wire messages.
//!
//! This crate carries no HTTP or runtime dependencies. The gateway crate
//! layers transport on top of it, and tests can use it directly.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `GatewayError`/`Result` so a malformed
//! policy document never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod audit;
pub mod error;
pub mod policy;
pub mod proto;

/// Shared result type.
pub use error::{ErrorTier, GatewayError, Result};
pub use policy::{policy_key, Policy, PolicyKind, PolicySet};

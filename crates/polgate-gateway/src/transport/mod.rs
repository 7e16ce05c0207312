//! Transport layer (HTTP).
//!
//! Exposes the API handlers and the codec that decodes request bodies once
//! before they reach the policy layer.

pub mod codec;
pub mod rest;

//! polgate gateway library entry.
//!
//! This crate wires the HTTP transport, config loader and admin-service
//! client into the policy admin gateway. It is intended to be consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod admin;
pub mod app_state;
pub mod config;
pub mod ops;
pub mod router;
pub mod transport;

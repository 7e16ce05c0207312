//! Top-level facade crate for polgate.
//!
//! Re-exports the core policy types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use polgate_core::*;
}

pub mod gateway {
    pub use polgate_gateway::*;
}

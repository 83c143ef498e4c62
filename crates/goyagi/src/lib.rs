//! Top-level facade crate for goyagi.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use goyagi_core::*;
}

pub mod server {
    pub use goyagi_server::*;
}

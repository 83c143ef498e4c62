//! goyagi HTTP server library.
//!
//! Wires configuration, the movies resource, request instrumentation, error
//! reporting, and the graceful-shutdown lifecycle into a single service. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod movies;
pub mod obs;
pub mod ops;
pub mod router;

//! goyagi core: transport-agnostic domain types and the shared error surface.
//!
//! This crate defines the movie model and the error type shared by the server,
//! storage, and HTTP layers. It carries no runtime or transport dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;

/// Shared result type.
pub use error::{ClientCode, GoyagiError, Result};
pub use model::{Movie, NewMovie};

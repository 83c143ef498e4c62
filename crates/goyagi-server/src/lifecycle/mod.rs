//! Process lifecycle: termination signals and the HTTP server they stop.

pub mod server;
pub mod signals;

pub use server::{DrainTimeout, Listening, Server, ServerState};
pub use signals::{setup, Shutdown};

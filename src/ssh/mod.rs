// ABOUTME: SSH client module for remote server connections.
// ABOUTME: Key-file authentication with known_hosts verification and a bounded connect.

mod client;
mod error;

pub use client::{CommandOutput, DEFAULT_CONNECT_TIMEOUT, Session, SessionConfig};
pub use error::{Error, Result};

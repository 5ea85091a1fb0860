// ABOUTME: Top-level operations behind the CLI.
// ABOUTME: Deploy runs the full pipeline; cleanup tears the release down.

mod cleanup;
mod deploy;

pub use cleanup::cleanup;
pub use deploy::deploy;

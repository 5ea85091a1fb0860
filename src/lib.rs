// ABOUTME: Library root for skiff - exposes the pipeline and its seams for testing.
// ABOUTME: The main binary is in main.rs.

pub mod commands;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod local;
pub mod output;
pub mod remote;
pub mod runlog;
pub mod ssh;
pub mod types;

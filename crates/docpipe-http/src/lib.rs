//! `docpipe` crate (library surface).
//!
//! The primary entrypoint for end users is the `docpipe` binary (HTTP service + one-shot CLI).
//! This library exists so the router can be embedded and exercised in tests without spawning
//! the binary.

pub use docpipe_core as core;
pub use docpipe_local as local;

pub mod config;
pub mod http;

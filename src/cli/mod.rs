//! Command-line interface
//!
//! Argument parsing for the node binary. Everything except `start` is an
//! IPC client talking to a running node.

pub mod commands;

pub use commands::{NodeCommand, Opt};

#![deny(missing_docs)]
//! Album Relay core library.
//!
//! Platform-independent forwarding logic: message model, mention rewriting,
//! album reconciliation and the chat platform boundary.

/// Album assembly.
pub mod album;
/// Configuration management.
pub mod config;
/// Processed-message tracking.
pub mod dedup;
/// Message model.
pub mod message;
/// Chat platform boundary.
pub mod platform;
/// Forwarding relay.
pub mod relay;
/// Mention rewriting.
pub mod rewrite;
/// Utility functions.
pub mod utils;

#![deny(missing_docs)]
//! Telegram transport adapter for Album Relay.

/// Telegram-specific platform implementation.
pub mod bot;
/// Telegram transport configuration.
pub mod config;
/// Telegram runtime entrypoint.
pub mod runner;

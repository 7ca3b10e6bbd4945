//! # PollKV
//!
//! A single-threaded key-value server with:
//! - Readiness-based multiplexing of many connections on one thread
//! - A length-prefixed, little-endian binary protocol
//! - GET / SET / DEL against an in-memory store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Event Loop (mio::Poll)                       │
//! │        listener + every client socket, one thread            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ readable / writable
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Connection                                │
//! │     read buffer ─▶ frame codec ─▶ ... ─▶ write buffer        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ argv
//!                       ▼
//!               ┌───────────────┐          ┌─────────────┐
//!               │  Dispatcher   │─────────▶│    Store    │
//!               └───────────────┘          │  (HashMap)  │
//!                                          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod dispatcher;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PollKvError, Result};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use network::Server;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of PollKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

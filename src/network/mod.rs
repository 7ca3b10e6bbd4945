//! Network Module
//!
//! TCP server and client connection handling.
//!
//! ## Architecture
//! - One thread, one `mio::Poll`
//! - Non-blocking listener and client sockets
//! - Per-connection read/write buffers and state machine
//! - Commands routed through a single owned `Dispatcher`

mod buffer;
mod connection;
mod server;

pub use buffer::{BoundedBuffer, BufferFull};
pub use connection::{ConnState, Connection};
pub use server::Server;

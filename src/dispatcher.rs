//! Dispatcher Module
//!
//! Executes decoded argument vectors against the store.
//!
//! ## Responsibilities
//! - Recognize `get`/`set`/`del` (case-insensitive, exact arity)
//! - Apply the command to the owned `Store`
//! - Turn every outcome into a `Response`; unknown shapes become `ERR`

use bytes::Bytes;

use crate::protocol::{Command, Response};
use crate::store::Store;

/// Payload sent back for any argument vector that is not a known command
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Routes commands to the store it owns
///
/// Dispatch never fails: malformed frames are rejected by the codec before
/// they get here, and unrecognized shapes degrade to an `ERR` response.
#[derive(Debug, Default)]
pub struct Dispatcher {
    store: Store,
}

impl Dispatcher {
    /// Create a dispatcher over an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher over an existing store
    pub fn with_store(store: Store) -> Self {
        Self { store }
    }

    /// Interpret one argument vector and produce its response
    pub fn dispatch(&mut self, argv: &[Bytes]) -> Response {
        match Command::parse(argv) {
            Some(command) => {
                tracing::trace!("Dispatching {}", command.name());
                self.execute(command)
            }
            None => Response::error(UNKNOWN_COMMAND),
        }
    }

    /// Execute an already-parsed command
    pub fn execute(&mut self, command: Command) -> Response {
        match command {
            Command::Get { key } => match self.store.get(&key) {
                Some(value) => Response::ok(value.clone()),
                None => Response::not_found(),
            },
            Command::Set { key, value } => {
                self.store.set(key, value);
                Response::ok_empty()
            }
            Command::Del { key } => {
                self.store.del(&key);
                Response::ok_empty()
            }
        }
    }

    /// Read-only view of the store
    pub fn store(&self) -> &Store {
        &self.store
    }
}

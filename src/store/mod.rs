//! Store Module
//!
//! The in-memory key-value mapping behind GET/SET/DEL.
//!
//! ## Responsibilities
//! - Hold every key and value for the lifetime of the process
//! - Binary-safe keys and values
//! - No ordering, no capacity bound, no expiry
//!
//! ## Concurrency
//! None. The store is owned by the dispatcher, which is owned by the single
//! event-loop thread, so every mutation goes through `&mut self`.

mod table;

pub use table::Store;

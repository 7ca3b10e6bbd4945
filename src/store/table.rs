//! Store implementation
//!
//! HashMap-based store, owned and mutated by a single thread.

use std::collections::HashMap;

use bytes::Bytes;

/// In-memory key-value table
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<Bytes, Bytes>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<&Bytes> {
        self.data.get(key)
    }

    /// Insert or overwrite a key, returning the previous value
    pub fn set(&mut self, key: Bytes, value: Bytes) -> Option<Bytes> {
        self.data.insert(key, value)
    }

    /// Remove a key, returning whether it was present
    pub fn del(&mut self, key: &[u8]) -> bool {
        self.data.remove(key).is_some()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

//! Bounded byte buffer
//!
//! Read-side staging area for one connection: bytes arrive at the back,
//! parsed frames are removed from the front, and the total never exceeds
//! a fixed capacity.

use std::io::{self, Read};

use bytes::{Buf, BytesMut};
use thiserror::Error;

/// Returned when an append would push the buffer past its capacity
#[derive(Debug, Error, PartialEq, Eq)]
#[error("buffer full: {needed} bytes requested, {remaining} remaining")]
pub struct BufferFull {
    pub needed: usize,
    pub remaining: usize,
}

/// A byte buffer with a hard upper bound on its length
#[derive(Debug)]
pub struct BoundedBuffer {
    inner: BytesMut,
    capacity: usize,
}

impl BoundedBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be appended
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.inner.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    /// Append `data` in full, or not at all
    pub fn append(&mut self, data: &[u8]) -> Result<(), BufferFull> {
        if data.len() > self.remaining_capacity() {
            return Err(BufferFull {
                needed: data.len(),
                remaining: self.remaining_capacity(),
            });
        }
        self.inner.extend_from_slice(data);
        Ok(())
    }

    /// Drop the first `n` bytes. Consuming more than is buffered empties it.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.inner.len());
        self.inner.advance(n);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Perform a single `read` into the free tail of the buffer.
    ///
    /// Returns `Ok(0)` either on end-of-stream or when there is no free
    /// capacity; callers check `remaining_capacity` first to tell them apart.
    pub fn fill_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        let start = self.inner.len();
        let remaining = self.remaining_capacity();
        if remaining == 0 {
            return Ok(0);
        }

        self.inner.resize(start + remaining, 0);
        match reader.read(&mut self.inner[start..]) {
            Ok(n) => {
                self.inner.truncate(start + n);
                Ok(n)
            }
            Err(e) => {
                self.inner.truncate(start);
                Err(e)
            }
        }
    }
}

//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

/// Response status codes, sent as a little-endian u32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    Err = 1,
    NotFound = 2,
}

impl Status {
    /// Map a wire code back to a status
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            1 => Some(Status::Err),
            2 => Some(Status::NotFound),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Status-dependent payload (value for GET, message for ERR, else empty)
    pub payload: Bytes,
}

impl Response {
    /// Create an OK response carrying `payload`
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    /// Create an OK response with an empty payload
    pub fn ok_empty() -> Self {
        Self::ok(Bytes::new())
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: Bytes::new(),
        }
    }

    /// Create an ERR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Err,
            payload: Bytes::copy_from_slice(message.as_bytes()),
        }
    }
}

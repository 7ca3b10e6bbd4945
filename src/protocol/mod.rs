//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! All integers are little-endian u32, regardless of host byte order.
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬──────────────────────────────────┐
//! │ Len (4)  │ Argc (4) │ (ArgLen (4) + Arg bytes) x Argc  │
//! └──────────┴──────────┴──────────────────────────────────┘
//! ```
//!
//! ### Commands
//! - `get <key>`
//! - `set <key> <value>`
//! - `del <key>`
//!
//! ### Response Format
//! ```text
//! ┌──────────┬────────────┬─────────────────────────────┐
//! │ Len (4)  │ Status (4) │         Payload             │
//! └──────────┴────────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0: OK
//! - 1: ERR
//! - 2: NOT_FOUND

mod command;
mod response;
mod codec;

pub use command::Command;
pub use response::{Response, Status};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_response,
    request_body_len, write_request, Decoded, DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE,
};

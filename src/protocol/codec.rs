//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every frame is a 4-byte little-endian length followed by that many bytes.
//! The length never exceeds the configured maximum frame size.
//!
//! ### Request body
//! ```text
//! ┌──────────┬───────────┬──────────┬───────────┬─────
//! │ argc (4) │ len1 (4)  │  arg1    │ len2 (4)  │ ...
//! └──────────┴───────────┴──────────┴───────────┴─────
//! ```
//!
//! ### Response body
//! ```text
//! ┌────────────┬─────────────────────────────┐
//! │ Status (4) │         Payload             │
//! └────────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::Bytes;

use super::{Response, Status};
use crate::error::{PollKvError, Result};

/// Size of the outer length prefix, and of every nested count/length field
pub const HEADER_SIZE: usize = 4;

/// Maximum frame body in the reference configuration
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4096;

/// Outcome of trying to decode one frame from the front of a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// A full frame was decoded; `consumed` bytes should be dropped from the buffer
    Complete { value: T, consumed: usize },

    /// The buffer does not yet hold a full frame
    NeedMoreData,
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Split one length-prefixed frame off the front of `buf`.
///
/// Returns the frame body and the total bytes it occupies including the header.
fn split_frame(buf: &[u8], max_frame_size: usize) -> Result<Option<(&[u8], usize)>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    let len = read_u32(buf) as usize;
    if len > max_frame_size {
        return Err(PollKvError::FrameTooLong {
            len,
            max: max_frame_size,
        });
    }

    let total = HEADER_SIZE + len;
    if buf.len() < total {
        return Ok(None);
    }

    Ok(Some((&buf[HEADER_SIZE..total], total)))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Body length of the request frame `argv` encodes to
pub fn request_body_len<A: AsRef<[u8]>>(argv: &[A]) -> usize {
    HEADER_SIZE
        + argv
            .iter()
            .map(|arg| HEADER_SIZE + arg.as_ref().len())
            .sum::<usize>()
}

/// Encode an argument vector as a request frame
///
/// Format: len (4) + argc (4) + (arglen (4) + arg)*
pub fn encode_request<A: AsRef<[u8]>>(argv: &[A]) -> Vec<u8> {
    let body_len = request_body_len(argv);

    let mut message = Vec::with_capacity(HEADER_SIZE + body_len);
    message.extend_from_slice(&(body_len as u32).to_le_bytes());
    message.extend_from_slice(&(argv.len() as u32).to_le_bytes());
    for arg in argv {
        let arg = arg.as_ref();
        message.extend_from_slice(&(arg.len() as u32).to_le_bytes());
        message.extend_from_slice(arg);
    }

    message
}

/// Decode one request frame from the front of `buf`
///
/// A declared length over `max_frame_size` is rejected as soon as the header
/// is visible, without waiting for the body.
pub fn decode_request(buf: &[u8], max_frame_size: usize) -> Result<Decoded<Vec<Bytes>>> {
    let (body, consumed) = match split_frame(buf, max_frame_size)? {
        Some(frame) => frame,
        None => return Ok(Decoded::NeedMoreData),
    };

    if body.len() < HEADER_SIZE {
        return Err(PollKvError::Protocol(format!(
            "Request missing argument count: {} byte body",
            body.len()
        )));
    }

    let argc = read_u32(body) as usize;
    let mut pos = HEADER_SIZE;

    // Each argument needs at least its length field, so a huge argc can't
    // force a huge allocation.
    let mut argv = Vec::with_capacity(argc.min((body.len() - pos) / HEADER_SIZE));

    for index in 0..argc {
        if body.len() - pos < HEADER_SIZE {
            return Err(PollKvError::Protocol(format!(
                "Argument {} length runs past end of frame",
                index
            )));
        }
        let arg_len = read_u32(&body[pos..]) as usize;
        pos += HEADER_SIZE;

        if body.len() - pos < arg_len {
            return Err(PollKvError::Protocol(format!(
                "Argument {} declares {} bytes, only {} left in frame",
                index,
                arg_len,
                body.len() - pos
            )));
        }
        argv.push(Bytes::copy_from_slice(&body[pos..pos + arg_len]));
        pos += arg_len;
    }

    if pos != body.len() {
        return Err(PollKvError::Protocol(format!(
            "Trailing {} bytes after last argument",
            body.len() - pos
        )));
    }

    Ok(Decoded::Complete {
        value: argv,
        consumed,
    })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as a frame
///
/// Format: len (4) + status (4) + payload, where len = 4 + payload length
pub fn encode_response(response: &Response) -> Vec<u8> {
    let body_len = HEADER_SIZE + response.payload.len();

    let mut message = Vec::with_capacity(HEADER_SIZE + body_len);
    message.extend_from_slice(&(body_len as u32).to_le_bytes());
    message.extend_from_slice(&response.status.code().to_le_bytes());
    message.extend_from_slice(&response.payload);

    message
}

/// Decode one response frame from the front of `buf`
pub fn decode_response(buf: &[u8], max_frame_size: usize) -> Result<Decoded<Response>> {
    let (body, consumed) = match split_frame(buf, max_frame_size)? {
        Some(frame) => frame,
        None => return Ok(Decoded::NeedMoreData),
    };

    Ok(Decoded::Complete {
        value: parse_response_body(body)?,
        consumed,
    })
}

fn parse_response_body(body: &[u8]) -> Result<Response> {
    if body.len() < HEADER_SIZE {
        return Err(PollKvError::Protocol(format!(
            "Bad response: {} byte body has no status code",
            body.len()
        )));
    }

    let code = read_u32(body);
    let status = Status::from_code(code)
        .ok_or_else(|| PollKvError::Protocol(format!("Unknown response status: {}", code)))?;

    Ok(Response {
        status,
        payload: Bytes::copy_from_slice(&body[HEADER_SIZE..]),
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request frame to a blocking stream
///
/// Oversize requests are rejected before anything is written.
pub fn write_request<W: Write, A: AsRef<[u8]>>(
    writer: &mut W,
    argv: &[A],
    max_frame_size: usize,
) -> Result<()> {
    let body_len = request_body_len(argv);
    if body_len > max_frame_size {
        return Err(PollKvError::FrameTooLong {
            len: body_len,
            max: max_frame_size,
        });
    }

    writer.write_all(&encode_request(argv))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a blocking stream
pub fn read_response<R: Read>(reader: &mut R, max_frame_size: usize) -> Result<Response> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let len = u32::from_le_bytes(header) as usize;
    if len > max_frame_size {
        return Err(PollKvError::FrameTooLong {
            len,
            max: max_frame_size,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;

    parse_response_body(&body)
}

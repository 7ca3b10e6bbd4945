//! Connection Handler
//!
//! Per-socket state machine driven by readiness events.
//!
//! ```text
//!   AwaitingRequest ──frame parsed──▶ SendingResponse
//!         ▲                                 │
//!         └────────response flushed─────────┘
//!
//!   either state ──EOF / I/O error / bad frame──▶ Terminated
//! ```

use std::io::{self, Read, Write};

use bytes::BytesMut;
use mio::Interest;

use super::buffer::BoundedBuffer;
use crate::dispatcher::Dispatcher;
use crate::protocol::{decode_request, encode_response, Decoded, HEADER_SIZE};

/// Where a connection is in its request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Reading bytes and extracting request frames
    AwaitingRequest,

    /// Holding an unsent response; no frames are extracted until it drains
    SendingResponse,

    /// Finished; the owner should drop the connection, closing its socket
    Terminated,
}

/// A single client connection
///
/// Generic over the stream so the state machine can be driven by anything
/// that reads and writes without blocking.
pub struct Connection<S> {
    /// Exclusively owned socket, closed when the connection is dropped
    stream: S,

    /// Peer address for logging
    peer_addr: String,

    state: ConnState,

    /// Received bytes not yet parsed into a frame
    read_buf: BoundedBuffer,

    /// Pending response bytes and how many of them have been written
    write_buf: BytesMut,
    write_offset: usize,

    max_frame_size: usize,
}

impl<S: Read + Write> Connection<S> {
    /// Create a connection in `AwaitingRequest`
    ///
    /// The read buffer holds at most one maximal frame plus its header.
    pub fn new(stream: S, peer_addr: impl Into<String>, max_frame_size: usize) -> Self {
        Self {
            stream,
            peer_addr: peer_addr.into(),
            state: ConnState::AwaitingRequest,
            read_buf: BoundedBuffer::with_capacity(HEADER_SIZE + max_frame_size),
            write_buf: BytesMut::new(),
            write_offset: 0,
            max_frame_size,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ConnState::Terminated
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Bytes received but not yet consumed by a complete frame
    pub fn buffered_len(&self) -> usize {
        self.read_buf.len()
    }

    /// Response bytes not yet written
    pub fn pending_write_len(&self) -> usize {
        self.write_buf.len() - self.write_offset
    }

    /// Readiness this connection is waiting for, `None` once terminated
    pub fn interest(&self) -> Option<Interest> {
        match self.state {
            ConnState::AwaitingRequest => Some(Interest::READABLE),
            ConnState::SendingResponse => Some(Interest::WRITABLE),
            ConnState::Terminated => None,
        }
    }

    /// Do all the I/O currently possible without blocking.
    ///
    /// Alternates between filling and flushing until the socket would block
    /// or the connection terminates.
    pub fn on_ready(&mut self, dispatcher: &mut Dispatcher) {
        loop {
            let progressed = match self.state {
                ConnState::AwaitingRequest => self.fill(dispatcher),
                ConnState::SendingResponse => {
                    while self.flush() {}
                    self.state == ConnState::AwaitingRequest
                }
                ConnState::Terminated => false,
            };
            if !progressed {
                break;
            }
        }
    }

    /// One non-blocking read, followed by processing every complete frame.
    ///
    /// Frames left over from before a paused response are processed first.
    /// Returns whether more I/O should be attempted right away.
    pub fn fill(&mut self, dispatcher: &mut Dispatcher) -> bool {
        if self.state != ConnState::AwaitingRequest {
            return false;
        }

        if !self.read_buf.is_empty() {
            self.process_frames(dispatcher);
            if self.state != ConnState::AwaitingRequest {
                return true;
            }
        }

        // Capacity is one maximal frame, so a full buffer always parses
        if self.read_buf.remaining_capacity() == 0 {
            tracing::warn!("Read buffer stuck full for {}", self.peer_addr);
            self.terminate();
            return false;
        }

        match self.read_buf.fill_from(&mut self.stream) {
            Ok(0) => {
                if self.read_buf.is_empty() {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                } else {
                    tracing::warn!(
                        "Unexpected EOF from {} with {} bytes of a partial frame",
                        self.peer_addr,
                        self.read_buf.len()
                    );
                }
                self.terminate();
                false
            }
            Ok(n) => {
                tracing::trace!("Read {} bytes from {}", n, self.peer_addr);
                self.process_frames(dispatcher);
                true
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => false,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => true,
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                self.terminate();
                false
            }
        }
    }

    /// One non-blocking write of the unsent tail of the response.
    ///
    /// Returns `true` after a short write, when another attempt may succeed.
    /// A completed write returns `false` and moves back to `AwaitingRequest`.
    pub fn flush(&mut self) -> bool {
        if self.state != ConnState::SendingResponse {
            return false;
        }

        if self.pending_write_len() == 0 {
            self.finish_response();
            return false;
        }

        match self.stream.write(&self.write_buf[self.write_offset..]) {
            Ok(0) => {
                tracing::warn!("Write to {} accepted no bytes", self.peer_addr);
                self.terminate();
                false
            }
            Ok(n) => {
                self.write_offset += n;
                if self.write_offset == self.write_buf.len() {
                    self.finish_response();
                    false
                } else {
                    tracing::trace!(
                        "Short write to {}: {} of {} bytes pending",
                        self.peer_addr,
                        self.pending_write_len(),
                        self.write_buf.len()
                    );
                    true
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => false,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => true,
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                self.terminate();
                false
            }
        }
    }

    /// Extract, dispatch and answer frames until the buffer runs dry,
    /// a response can't be flushed immediately, or a frame is malformed.
    fn process_frames(&mut self, dispatcher: &mut Dispatcher) {
        while self.state == ConnState::AwaitingRequest {
            match decode_request(self.read_buf.as_slice(), self.max_frame_size) {
                Ok(Decoded::NeedMoreData) => break,
                Ok(Decoded::Complete { value: argv, consumed }) => {
                    let response = dispatcher.dispatch(&argv);
                    tracing::trace!(
                        "Request of {} args from {} -> {:?}",
                        argv.len(),
                        self.peer_addr,
                        response.status
                    );

                    // Fresh bytes per response, never aliased with unparsed input
                    self.write_buf.extend_from_slice(&encode_response(&response));
                    self.read_buf.consume(consumed);
                    self.state = ConnState::SendingResponse;

                    while self.flush() {}
                }
                Err(e) => {
                    tracing::warn!("Protocol error from {}: {}", self.peer_addr, e);
                    self.terminate();
                }
            }
        }
    }

    fn finish_response(&mut self) {
        self.write_buf.clear();
        self.write_offset = 0;
        self.state = ConnState::AwaitingRequest;
    }

    fn terminate(&mut self) {
        self.state = ConnState::Terminated;
        self.read_buf.clear();
        self.write_buf = BytesMut::new();
        self.write_offset = 0;
    }
}

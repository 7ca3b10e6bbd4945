//! Connection Tests
//!
//! Drives the connection state machine with a scripted in-memory stream.
//!
//! Tests verify:
//! - Request/response cycle and state transitions
//! - Incremental and pipelined delivery
//! - EOF, read/write errors and malformed frames terminate
//! - Short writes and would-block on flush lose and duplicate nothing

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use mio::Interest;
use pollkv::dispatcher::Dispatcher;
use pollkv::network::{ConnState, Connection};
use pollkv::protocol::{encode_request, encode_response, Response, DEFAULT_MAX_FRAME_SIZE};

// =============================================================================
// Scripted Stream
// =============================================================================

enum ReadStep {
    Data(Vec<u8>),
    Eof,
    Fail(io::ErrorKind),
}

enum WriteStep {
    Accept(usize),
    WouldBlock,
    Fail(io::ErrorKind),
}

/// Reads replay `reads` then report would-block; writes follow `writes`
/// then accept everything. A `WouldBlock` write step leaves the stream
/// blocked until the test clears `blocked`, as a full send buffer would.
#[derive(Default)]
struct ScriptedStream {
    reads: VecDeque<ReadStep>,
    writes: VecDeque<WriteStep>,
    blocked: bool,
    written: Vec<u8>,
    write_calls: usize,
}

impl ScriptedStream {
    fn push_data(&mut self, data: &[u8]) {
        self.reads.push_back(ReadStep::Data(data.to_vec()));
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            None => Err(io::ErrorKind::WouldBlock.into()),
            Some(ReadStep::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.reads.push_front(ReadStep::Data(data[n..].to_vec()));
                }
                Ok(n)
            }
            Some(ReadStep::Eof) => {
                self.reads.push_front(ReadStep::Eof);
                Ok(0)
            }
            Some(ReadStep::Fail(kind)) => Err(kind.into()),
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;
        if self.blocked {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        match self.writes.pop_front() {
            None => {
                self.written.extend_from_slice(buf);
                Ok(buf.len())
            }
            Some(WriteStep::Accept(limit)) => {
                let n = limit.min(buf.len());
                self.written.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            Some(WriteStep::WouldBlock) => {
                self.blocked = true;
                Err(io::ErrorKind::WouldBlock.into())
            }
            Some(WriteStep::Fail(kind)) => Err(kind.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn new_conn() -> Connection<ScriptedStream> {
    Connection::new(ScriptedStream::default(), "test-peer", DEFAULT_MAX_FRAME_SIZE)
}

fn response_bytes(responses: &[Response]) -> Vec<u8> {
    responses.iter().flat_map(|r| encode_response(r)).collect()
}

// =============================================================================
// Request / Response Cycle Tests
// =============================================================================

#[test]
fn test_new_connection_awaits_request() {
    let conn = new_conn();

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(conn.interest(), Some(Interest::READABLE));
    assert_eq!(conn.peer_addr(), "test-peer");
    assert_eq!(conn.buffered_len(), 0);
    assert_eq!(conn.pending_write_len(), 0);
}

#[test]
fn test_single_request_is_answered() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut().push_data(&encode_request(&["set", "x", "1"]));

    conn.on_ready(&mut dispatcher);

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(conn.stream().written, response_bytes(&[Response::ok_empty()]));
    assert_eq!(conn.buffered_len(), 0);
}

#[test]
fn test_idle_read_would_block_keeps_state() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();

    assert!(!conn.fill(&mut dispatcher));

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert!(conn.stream().written.is_empty());
}

#[test]
fn test_pipelined_requests_answered_in_order() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();

    let mut bytes = encode_request(&["set", "x", "1"]);
    bytes.extend_from_slice(&encode_request(&["get", "x"]));
    bytes.extend_from_slice(&encode_request(&["del", "x"]));
    bytes.extend_from_slice(&encode_request(&["get", "x"]));
    conn.stream_mut().push_data(&bytes);

    conn.on_ready(&mut dispatcher);

    let expected = response_bytes(&[
        Response::ok_empty(),
        Response::ok("1"),
        Response::ok_empty(),
        Response::not_found(),
    ]);
    assert_eq!(conn.stream().written, expected);
    assert_eq!(conn.state(), ConnState::AwaitingRequest);
}

#[test]
fn test_incremental_delivery_matches_whole_delivery() {
    let request = encode_request(&["set", "key", "some value"]);
    let expected = response_bytes(&[Response::ok_empty()]);

    for chunk_size in [1, 2, 3, 5, 7, request.len() - 1] {
        let mut dispatcher = Dispatcher::new();
        let mut conn = new_conn();
        let chunks: Vec<&[u8]> = request.chunks(chunk_size).collect();

        for (i, chunk) in chunks.iter().enumerate() {
            conn.stream_mut().push_data(chunk);
            assert!(conn.fill(&mut dispatcher));

            if i + 1 < chunks.len() {
                assert!(conn.stream().written.is_empty(), "answered early at chunk {}", i);
                assert!(dispatcher.store().is_empty());
            }
        }

        assert_eq!(conn.stream().written, expected, "chunk size {}", chunk_size);
        assert_eq!(conn.state(), ConnState::AwaitingRequest);
        assert_eq!(dispatcher.store().len(), 1);
    }
}

#[test]
fn test_unknown_command_keeps_connection_open() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut().push_data(&encode_request(&["flushall"]));

    conn.on_ready(&mut dispatcher);

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(
        conn.stream().written,
        response_bytes(&[Response::error("Unknown command")])
    );
}

// =============================================================================
// Termination Tests
// =============================================================================

#[test]
fn test_clean_eof_terminates() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut().reads.push_back(ReadStep::Eof);

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert_eq!(conn.interest(), None);
}

#[test]
fn test_eof_after_requests_answers_them_first() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut().push_data(&encode_request(&["set", "k", "v"]));
    conn.stream_mut().reads.push_back(ReadStep::Eof);

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert_eq!(conn.stream().written, response_bytes(&[Response::ok_empty()]));
    assert_eq!(dispatcher.store().len(), 1);
}

#[test]
fn test_abrupt_disconnect_mid_header_never_dispatches() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    let request = encode_request(&["set", "k", "v"]);

    conn.stream_mut().push_data(&request[..3]);
    conn.stream_mut().reads.push_back(ReadStep::Eof);

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert!(conn.stream().written.is_empty());
    assert!(dispatcher.store().is_empty());
}

#[test]
fn test_abrupt_disconnect_mid_body_never_dispatches() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    let request = encode_request(&["set", "k", "v"]);

    conn.stream_mut().push_data(&request[..request.len() - 1]);
    conn.stream_mut().reads.push_back(ReadStep::Eof);

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert!(conn.stream().written.is_empty());
    assert!(dispatcher.store().is_empty());
}

#[test]
fn test_oversize_length_terminates_without_body() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();

    let header = ((DEFAULT_MAX_FRAME_SIZE + 1) as u32).to_le_bytes();
    conn.stream_mut().push_data(&header);

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert!(conn.stream().written.is_empty());
}

#[test]
fn test_oversize_length_terminates_with_full_body() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = Connection::new(ScriptedStream::default(), "small", 16);

    // 30-byte body against a 16-byte limit, all of it delivered
    conn.stream_mut().push_data(&encode_request(&["set", "k", "0123456789"]));

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert!(dispatcher.store().is_empty());
}

#[test]
fn test_malformed_nested_lengths_terminate() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();

    let mut body = Vec::new();
    body.extend_from_slice(&2u32.to_le_bytes());
    body.extend_from_slice(&3u32.to_le_bytes());
    body.extend_from_slice(b"get");
    body.extend_from_slice(&100u32.to_le_bytes());
    body.extend_from_slice(b"k");
    let mut frame = (body.len() as u32).to_le_bytes().to_vec();
    frame.extend_from_slice(&body);

    conn.stream_mut().push_data(&frame);
    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
    assert!(conn.stream().written.is_empty());
}

#[test]
fn test_read_error_terminates() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut()
        .reads
        .push_back(ReadStep::Fail(io::ErrorKind::ConnectionReset));

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
}

#[test]
fn test_interrupted_read_is_retried() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut()
        .reads
        .push_back(ReadStep::Fail(io::ErrorKind::Interrupted));
    conn.stream_mut().push_data(&encode_request(&["get", "k"]));

    conn.on_ready(&mut dispatcher);

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(conn.stream().written, response_bytes(&[Response::not_found()]));
}

#[test]
fn test_write_error_terminates() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut()
        .writes
        .push_back(WriteStep::Fail(io::ErrorKind::BrokenPipe));
    conn.stream_mut().push_data(&encode_request(&["get", "k"]));

    conn.on_ready(&mut dispatcher);

    assert!(conn.is_terminated());
}

// =============================================================================
// Backpressure Tests
// =============================================================================

#[test]
fn test_blocked_response_waits_for_writable() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    conn.stream_mut().writes.push_back(WriteStep::WouldBlock);
    conn.stream_mut().push_data(&encode_request(&["get", "k"]));

    conn.on_ready(&mut dispatcher);

    assert_eq!(conn.state(), ConnState::SendingResponse);
    assert_eq!(conn.interest(), Some(Interest::WRITABLE));
    assert_eq!(conn.pending_write_len(), 8);

    // Writable again
    conn.stream_mut().blocked = false;
    conn.on_ready(&mut dispatcher);

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(conn.stream().written, response_bytes(&[Response::not_found()]));
}

#[test]
fn test_large_response_over_many_short_writes() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();
    let value = (0..4000u32).map(|i| (i % 251) as u8).collect::<Vec<u8>>();

    conn.stream_mut()
        .push_data(&encode_request(&[b"set".as_slice(), b"big".as_slice(), value.as_slice()]));
    conn.on_ready(&mut dispatcher);
    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    conn.stream_mut().written.clear();

    // Socket takes 1000 bytes per readiness notification
    for _ in 0..5 {
        conn.stream_mut().writes.push_back(WriteStep::Accept(1000));
        conn.stream_mut().writes.push_back(WriteStep::WouldBlock);
    }
    conn.stream_mut().push_data(&encode_request(&["get", "big"]));

    conn.on_ready(&mut dispatcher);
    let mut rounds = 1;
    while conn.state() == ConnState::SendingResponse {
        assert!(conn.pending_write_len() > 0);
        conn.stream_mut().blocked = false;
        conn.on_ready(&mut dispatcher);
        rounds += 1;
    }

    let expected = encode_response(&Response::ok(value));
    assert_eq!(expected.len(), 4008);
    assert_eq!(rounds, 5);
    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(conn.stream().written, expected);
}

#[test]
fn test_paused_response_holds_back_pipelined_frames() {
    let mut dispatcher = Dispatcher::new();
    let mut conn = new_conn();

    let mut bytes = encode_request(&["set", "a", "1"]);
    bytes.extend_from_slice(&encode_request(&["set", "b", "2"]));
    conn.stream_mut().writes.push_back(WriteStep::Accept(2));
    conn.stream_mut().writes.push_back(WriteStep::WouldBlock);
    conn.stream_mut().push_data(&bytes);

    conn.on_ready(&mut dispatcher);

    // First request applied, second still buffered behind the unsent response
    assert_eq!(conn.state(), ConnState::SendingResponse);
    assert_eq!(dispatcher.store().len(), 1);
    assert!(dispatcher.store().get(b"b").is_none());
    assert!(conn.buffered_len() > 0);

    // Writable: first response drains, then the buffered frame is served
    // without any new bytes arriving
    conn.stream_mut().blocked = false;
    conn.on_ready(&mut dispatcher);

    assert_eq!(conn.state(), ConnState::AwaitingRequest);
    assert_eq!(dispatcher.store().len(), 2);
    assert_eq!(
        conn.stream().written,
        response_bytes(&[Response::ok_empty(), Response::ok_empty()])
    );
    assert_eq!(conn.buffered_len(), 0);
}

#[test]
fn test_flush_is_noop_when_not_sending() {
    let mut conn = new_conn();

    assert!(!conn.flush());

    assert_eq!(conn.stream().write_calls, 0);
    assert_eq!(conn.state(), ConnState::AwaitingRequest);
}

//! Client driver
//!
//! Blocking client for the wire protocol, used by the CLI and by tests.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::Result;
use crate::protocol::{read_response, write_request, Response};

/// A blocking connection to a PollKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    max_frame_size: usize,
}

impl Client {
    /// Connect to `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A, max_frame_size: usize) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            max_frame_size,
        })
    }

    /// Send one command without waiting for its response
    pub fn send<A: AsRef<[u8]>>(&mut self, argv: &[A]) -> Result<()> {
        write_request(&mut self.writer, argv, self.max_frame_size)
    }

    /// Wait for the next response
    pub fn recv(&mut self) -> Result<Response> {
        read_response(&mut self.reader, self.max_frame_size)
    }

    /// Send one command and wait for its response
    pub fn query<A: AsRef<[u8]>>(&mut self, argv: &[A]) -> Result<Response> {
        self.send(argv)?;
        self.recv()
    }

    /// Send every command, then read every response in order
    pub fn pipeline<A: AsRef<[u8]>>(&mut self, commands: &[Vec<A>]) -> Result<Vec<Response>> {
        for argv in commands {
            self.send(argv.as_slice())?;
        }
        commands.iter().map(|_| self.recv()).collect()
    }

    /// Underlying socket, e.g. for shutting down one direction
    pub fn stream(&self) -> &TcpStream {
        self.writer.get_ref()
    }
}

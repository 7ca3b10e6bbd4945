//! TCP Server
//!
//! Single-threaded event loop: one `mio::Poll` watches the listener and every
//! client socket, and all connections share one `Dispatcher`.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};

use super::connection::Connection;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{PollKvError, Result};

/// Token reserved for the listening socket
const LISTENER: Token = Token(0);

/// A registered connection and the interest it is currently registered with
struct Slot {
    conn: Connection<TcpStream>,
    interest: Interest,
}

/// TCP server for PollKV
pub struct Server {
    config: Config,
    poll: Poll,
    events: Events,
    listener: TcpListener,

    /// Live connections by token
    connections: HashMap<Token, Slot>,
    next_token: usize,

    dispatcher: Dispatcher,
}

impl Server {
    /// Bind `config.listen_addr` and build a server around it
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let addr: SocketAddr = config.listen_addr.parse().map_err(|e| {
            PollKvError::Config(format!("invalid listen address {:?}: {}", config.listen_addr, e))
        })?;

        // Sets SO_REUSEADDR so restarts don't wait out TIME_WAIT
        let listener = TcpListener::bind(addr)?;
        Self::with_listener(listener, config)
    }

    /// Build a server around an already bound, listening socket
    pub fn new(listener: std::net::TcpListener, config: Config) -> Result<Self> {
        config.validate()?;
        listener.set_nonblocking(true)?;
        Self::with_listener(TcpListener::from_std(listener), config)
    }

    fn with_listener(mut listener: TcpListener, config: Config) -> Result<Self> {
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Self {
            events: Events::with_capacity(config.event_capacity),
            config,
            poll,
            listener,
            connections: HashMap::new(),
            next_token: LISTENER.0 + 1,
            dispatcher: Dispatcher::new(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the event loop forever
    ///
    /// Only returns if waiting for readiness itself fails.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        loop {
            self.poll_once()?;
        }
    }

    /// One loop iteration: wait for readiness (bounded by the poll timeout),
    /// then service every ready connection and accept pending clients.
    ///
    /// Returns the number of readiness events handled.
    pub fn poll_once(&mut self) -> Result<usize> {
        let timeout = self.config.poll_timeout();
        if let Err(e) = self.poll.poll(&mut self.events, Some(timeout)) {
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(0);
            }
            return Err(e.into());
        }

        if self.events.is_empty() {
            tracing::trace!("Idle, {} live connections", self.connections.len());
            return Ok(0);
        }

        let ready: Vec<Token> = self.events.iter().map(|event| event.token()).collect();

        let mut listener_ready = false;
        for &token in &ready {
            if token == LISTENER {
                listener_ready = true;
            } else {
                self.handle_connection(token);
            }
        }

        if listener_ready {
            self.accept_connections();
        }

        Ok(ready.len())
    }

    /// Drive one connection's I/O and bring its registration in line with
    /// its new state, dropping it if it terminated.
    fn handle_connection(&mut self, token: Token) {
        let slot = match self.connections.get_mut(&token) {
            Some(slot) => slot,
            None => return,
        };

        slot.conn.on_ready(&mut self.dispatcher);

        let keep = match slot.conn.interest() {
            Some(interest) if interest != slot.interest => {
                match self
                    .poll
                    .registry()
                    .reregister(slot.conn.stream_mut(), token, interest)
                {
                    Ok(()) => {
                        slot.interest = interest;
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Failed to reregister {}: {}", slot.conn.peer_addr(), e);
                        false
                    }
                }
            }
            Some(_) => true,
            None => false,
        };

        if !keep {
            self.close(token);
        }
    }

    /// Accept every connection that is immediately available
    fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => self.register(stream, addr),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("accept() error: {}", e);
                    break;
                }
            }
        }
    }

    fn register(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        if self.config.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }
        }

        let token = Token(self.next_token);
        self.next_token += 1;

        if let Err(e) = self
            .poll
            .registry()
            .register(&mut stream, token, Interest::READABLE)
        {
            tracing::warn!("Failed to register {}: {}", addr, e);
            return;
        }

        tracing::info!("Accepted connection from {}", addr);

        let conn = Connection::new(stream, addr.to_string(), self.config.max_frame_size);
        self.connections.insert(
            token,
            Slot {
                conn,
                interest: Interest::READABLE,
            },
        );
    }

    /// Deregister and drop a connection; dropping closes its socket
    fn close(&mut self, token: Token) {
        if let Some(mut slot) = self.connections.remove(&token) {
            if let Err(e) = self.poll.registry().deregister(slot.conn.stream_mut()) {
                tracing::debug!("Failed to deregister {}: {}", slot.conn.peer_addr(), e);
            }
            tracing::debug!("Closed connection {}", slot.conn.peer_addr());
        }
    }
}

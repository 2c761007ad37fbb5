//! Datagram sources for the ingest loop.
//!
//! The loop reads through the `DatagramSource` trait so tests can replay
//! scripted datagrams and receive errors without a socket.

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// A blocking source of datagrams.
pub trait DatagramSource {
    /// Receive one datagram into `buf`.
    ///
    /// Returns the number of bytes written, or `None` when the source is
    /// exhausted. Datagrams longer than `buf` are truncated.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// Unconnected UDP socket bound on all IPv4 interfaces.
#[derive(Debug)]
pub struct UdpSource {
    socket: UdpSocket,
}

impl UdpSource {
    /// Bind `0.0.0.0:port`. Port 0 picks an ephemeral port.
    pub fn bind(port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramSource for UdpSource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        // Blocks with no timeout; a live socket never reports exhaustion
        let (len, _from) = self.socket.recv_from(buf)?;
        Ok(Some(len))
    }
}

/// Scripted source for testing.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    items: VecDeque<io::Result<Vec<u8>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source that yields `datagrams` in order.
    pub fn from_datagrams<I>(datagrams: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            items: datagrams.into_iter().map(Ok).collect(),
        }
    }

    /// Queue a datagram.
    pub fn push(&mut self, datagram: Vec<u8>) -> &mut Self {
        self.items.push_back(Ok(datagram));
        self
    }

    /// Queue a receive error.
    pub fn push_error(&mut self, kind: io::ErrorKind) -> &mut Self {
        self.items
            .push_back(Err(io::Error::new(kind, "scripted receive error")));
        self
    }

    /// Items not yet received.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl DatagramSource for ScriptedSource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.items.pop_front() {
            None => Ok(None),
            Some(Err(e)) => Err(e),
            Some(Ok(datagram)) => {
                let len = datagram.len().min(buf.len());
                buf[..len].copy_from_slice(&datagram[..len]);
                Ok(Some(len))
            }
        }
    }
}

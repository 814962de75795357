//! [`Transport`] over a plain non-blocking UDP socket.
//!
//! UDP has no reliability layer, so [`Delivery::Reliable`] is accepted but
//! packets are still best effort. There is no handshake either: the peer is
//! considered connected as soon as the socket is connected, and an ICMP
//! "port unreachable" surfaced as `ConnectionRefused` is reported as a
//! disconnect.

use crate::transport::{Delivery, ReceivedPacket, Transport, TransportError, TransportEvent};
use log::{debug, trace, warn};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Largest datagram we accept.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

pub struct UdpTransport {
    initialized: bool,
    host_open: bool,
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
    /// `None` binds an ephemeral wildcard port of the peer's address family.
    bind_address: Option<SocketAddr>,
    buffer: [u8; MAX_DATAGRAM_SIZE],
}

impl UdpTransport {
    /// Binds the host endpoint to an ephemeral port on all interfaces, once
    /// the server address is known and its family can be matched.
    pub fn new() -> Self {
        Self::with_bind(None)
    }

    /// Binds the host endpoint to `bind_address` as soon as it is created.
    /// Only server addresses of the same family can be reached.
    pub fn with_bind_address(bind_address: SocketAddr) -> Self {
        Self::with_bind(Some(bind_address))
    }

    fn with_bind(bind_address: Option<SocketAddr>) -> Self {
        Self {
            initialized: false,
            host_open: false,
            socket: None,
            peer: None,
            bind_address,
            buffer: [0u8; MAX_DATAGRAM_SIZE],
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|socket| socket.local_addr().ok())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn bind(address: SocketAddr) -> Result<UdpSocket, TransportError> {
        let socket = UdpSocket::bind(address)?;
        socket.set_nonblocking(true)?;
        debug!("Host endpoint bound to {}", socket.local_addr()?);
        Ok(socket)
    }
}

fn wildcard_for(peer: SocketAddr) -> SocketAddr {
    match peer {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UdpTransport {
    fn initialize(&mut self) -> Result<(), TransportError> {
        self.initialized = true;
        Ok(())
    }

    fn deinitialize(&mut self) {
        self.initialized = false;
    }

    fn create_host(&mut self, peer_capacity: usize) -> Result<(), TransportError> {
        if !self.initialized {
            return Err(TransportError::NotInitialized);
        }
        if peer_capacity > 1 {
            debug!(
                "UDP transport serves a single peer, ignoring capacity {}",
                peer_capacity
            );
        }

        if let Some(bind_address) = self.bind_address {
            self.socket = Some(Self::bind(bind_address)?);
        }
        self.host_open = true;
        Ok(())
    }

    fn connect(&mut self, address: &str) -> Result<(), TransportError> {
        if !self.host_open {
            return Err(TransportError::NoHost);
        }

        let candidates: Vec<SocketAddr> = address
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve(address.to_string()))?
            .collect();
        if candidates.is_empty() {
            return Err(TransportError::Resolve(address.to_string()));
        }

        let peer = match self.bind_address {
            Some(bind_address) => candidates
                .into_iter()
                .find(|candidate| candidate.is_ipv4() == bind_address.is_ipv4())
                .ok_or_else(|| TransportError::AddressFamily(address.to_string()))?,
            None => candidates[0],
        };

        if self.socket.is_none() {
            self.socket = Some(Self::bind(wildcard_for(peer))?);
        }
        let socket = self.socket.as_ref().ok_or(TransportError::NoHost)?;

        socket.connect(peer)?;
        self.peer = Some(peer);
        Ok(())
    }

    fn send(&mut self, data: &[u8], delivery: Delivery) -> Result<(), TransportError> {
        if self.peer.is_none() {
            return Err(TransportError::NoPeer);
        }
        let socket = self.socket.as_ref().ok_or(TransportError::NoHost)?;

        let written = socket.send(data)?;
        trace!("Sent {} bytes ({:?})", written, delivery);
        Ok(())
    }

    fn poll(&mut self) -> TransportEvent {
        let (Some(socket), Some(_)) = (self.socket.as_ref(), self.peer) else {
            return TransportEvent::None;
        };

        match socket.recv(&mut self.buffer) {
            Ok(len) => TransportEvent::Receive(ReceivedPacket::new(self.buffer[..len].to_vec())),
            Err(e) if e.kind() == ErrorKind::WouldBlock => TransportEvent::None,
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                debug!("Peer unreachable: {}", e);
                self.peer = None;
                TransportEvent::Disconnect
            }
            Err(e) => {
                warn!("Error receiving packet: {}", e);
                TransportEvent::None
            }
        }
    }

    fn release(&mut self, packet: ReceivedPacket) {
        drop(packet);
    }

    fn disconnect_peer(&mut self) {
        self.peer = None;
    }

    fn destroy_host(&mut self) {
        self.socket = None;
        self.peer = None;
        self.host_open = false;
    }
}

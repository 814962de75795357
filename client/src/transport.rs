//! The packet transport the session talks through.
//!
//! A transport owns the process-wide network state, one local host endpoint
//! and at most one server peer. Connection establishment, reliability and
//! congestion control all live behind this trait. [`LoopbackTransport`] is an
//! in-memory implementation; [`UdpTransport`](crate::udp::UdpTransport) talks
//! to a real socket.

use std::collections::VecDeque;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered without loss, retransmitted by the transport if needed.
    Reliable,
    /// Best effort.
    Unreliable,
}

/// A packet handed out by [`Transport::poll`].
///
/// The transport keeps ownership of the packet's resources until it is given
/// back through [`Transport::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct ReceivedPacket {
    data: Vec<u8>,
}

impl ReceivedPacket {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TransportEvent {
    None,
    Receive(ReceivedPacket),
    Disconnect,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not initialized")]
    NotInitialized,
    #[error("no local host endpoint")]
    NoHost,
    #[error("no server peer")]
    NoPeer,
    #[error("could not resolve address '{0}'")]
    Resolve(String),
    #[error("address '{0}' has no entry matching the host endpoint's address family")]
    AddressFamily(String),
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

pub trait Transport {
    /// Sets up process-wide transport state.
    fn initialize(&mut self) -> Result<(), TransportError>;

    fn deinitialize(&mut self);

    /// Opens the local host endpoint with room for `peer_capacity` peers.
    fn create_host(&mut self, peer_capacity: usize) -> Result<(), TransportError>;

    /// Starts connecting to `address` (`host:port`). Does not wait for completion.
    fn connect(&mut self, address: &str) -> Result<(), TransportError>;

    fn send(&mut self, data: &[u8], delivery: Delivery) -> Result<(), TransportError>;

    /// Returns at most one pending event. Never blocks.
    fn poll(&mut self) -> TransportEvent;

    /// Gives a received packet's resources back to the transport.
    fn release(&mut self, packet: ReceivedPacket);

    /// Asks the peer for a graceful disconnect.
    fn disconnect_peer(&mut self);

    fn destroy_host(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub data: Vec<u8>,
    pub delivery: Delivery,
}

/// In-memory transport with scripted inbound events.
///
/// Every lifecycle call is recorded so callers can check how the transport
/// was driven, including that each received packet was released.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    initialized: bool,
    host_capacity: Option<usize>,
    peer: Option<String>,
    inbound: VecDeque<TransportEvent>,
    sent: Vec<SentPacket>,
    delivered: usize,
    released: usize,
    disconnect_requests: usize,
    fail_sends: bool,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a packet the next `poll` will hand out.
    pub fn push_receive(&mut self, data: impl Into<Vec<u8>>) {
        self.inbound
            .push_back(TransportEvent::Receive(ReceivedPacket::new(data.into())));
    }

    pub fn push_disconnect(&mut self) {
        self.inbound.push_back(TransportEvent::Disconnect);
    }

    pub fn pending_events(&self) -> usize {
        self.inbound.len()
    }

    pub fn sent(&self) -> &[SentPacket] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<SentPacket> {
        std::mem::take(&mut self.sent)
    }

    /// Packets handed out by `poll`.
    pub fn delivered_count(&self) -> usize {
        self.delivered
    }

    pub fn released_count(&self) -> usize {
        self.released
    }

    pub fn disconnect_requests(&self) -> usize {
        self.disconnect_requests
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_host(&self) -> bool {
        self.host_capacity.is_some()
    }

    pub fn host_capacity(&self) -> Option<usize> {
        self.host_capacity
    }

    pub fn has_peer(&self) -> bool {
        self.peer.is_some()
    }

    pub fn peer_address(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    /// Makes every following `send` fail.
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }
}

impl Transport for LoopbackTransport {
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
        self.host_capacity = Some(peer_capacity);
        Ok(())
    }

    fn connect(&mut self, address: &str) -> Result<(), TransportError> {
        if self.host_capacity.is_none() {
            return Err(TransportError::NoHost);
        }
        if address.is_empty() {
            return Err(TransportError::Resolve(address.to_string()));
        }
        self.peer = Some(address.to_string());
        Ok(())
    }

    fn send(&mut self, data: &[u8], delivery: Delivery) -> Result<(), TransportError> {
        if self.peer.is_none() {
            return Err(TransportError::NoPeer);
        }
        if self.fail_sends {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "loopback send failure",
            )));
        }
        self.sent.push(SentPacket {
            data: data.to_vec(),
            delivery,
        });
        Ok(())
    }

    fn poll(&mut self) -> TransportEvent {
        if self.host_capacity.is_none() {
            return TransportEvent::None;
        }

        match self.inbound.pop_front() {
            Some(TransportEvent::Disconnect) => {
                self.peer = None;
                TransportEvent::Disconnect
            }
            Some(event @ TransportEvent::Receive(_)) => {
                self.delivered += 1;
                event
            }
            Some(TransportEvent::None) | None => TransportEvent::None,
        }
    }

    fn release(&mut self, packet: ReceivedPacket) {
        drop(packet);
        self.released += 1;
    }

    fn disconnect_peer(&mut self) {
        if self.peer.take().is_some() {
            self.disconnect_requests += 1;
        }
    }

    fn destroy_host(&mut self) {
        self.host_capacity = None;
        self.peer = None;
    }
}

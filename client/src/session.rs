//! Connection lifecycle and the per-frame network tick.
//!
//! A [`NetworkSession`] is driven from the game loop: call [`NetworkSession::tick`]
//! once per frame with a monotonic timestamp in seconds. Each tick sends at
//! most one input update and processes at most one transport event, so a
//! frame never waits on the network.

use crate::config::SyncConfig;
use crate::protocol::{self, HandleOutcome, IgnoreReason, SessionState};
use crate::transport::{Delivery, Transport, TransportError, TransportEvent};
use log::{debug, info, trace, warn};
use shared::{write_update_input, PlayerId, PlayerTable, Position, UPDATE_INPUT_LEN};

/// Counters for traffic and dropped commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_ignored: u64,
    pub send_failures: u64,
}

/// What a single tick observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Packet(HandleOutcome),
    Disconnected,
}

pub struct NetworkSession<T: Transport> {
    transport: T,
    config: SyncConfig,
    players: PlayerTable,
    state: SessionState,
    stats: SessionStats,
    initialized: bool,
    host_open: bool,
    peer_active: bool,
}

impl<T: Transport> NetworkSession<T> {
    pub fn new(transport: T, config: SyncConfig) -> Self {
        Self {
            transport,
            config,
            players: PlayerTable::new(),
            state: SessionState::new(),
            stats: SessionStats::default(),
            initialized: false,
            host_open: false,
            peer_active: false,
        }
    }

    /// Starts connecting to `server_address`.
    ///
    /// Returns as soon as the attempt is under way; acceptance arrives later
    /// through [`tick`](Self::tick). An active connection is torn down first.
    pub fn connect(&mut self, server_address: &str) -> Result<(), TransportError> {
        if self.initialized {
            debug!("Connect requested while active, disconnecting first");
            self.disconnect();
        }

        info!("Connecting to {}", server_address);
        if let Err(e) = self.open(server_address) {
            self.disconnect();
            return Err(e);
        }

        self.players.reset();
        self.state.reset();
        Ok(())
    }

    fn open(&mut self, server_address: &str) -> Result<(), TransportError> {
        self.transport.initialize()?;
        self.initialized = true;

        self.transport.create_host(self.config.peer_capacity)?;
        self.host_open = true;

        self.transport.connect(server_address)?;
        self.peer_active = true;
        Ok(())
    }

    /// Runs one frame of networking.
    pub fn tick(&mut self, now: f64) -> Option<SessionEvent> {
        if !self.peer_active {
            return None;
        }

        self.send_input_if_due(now);

        match self.transport.poll() {
            TransportEvent::None => None,
            TransportEvent::Receive(packet) => {
                self.stats.packets_received += 1;
                trace!("Received {} bytes", packet.len());

                let outcome = if packet.is_empty() {
                    HandleOutcome::Ignored(IgnoreReason::EmptyPacket)
                } else {
                    protocol::handle_packet(
                        &mut self.state,
                        &mut self.players,
                        packet.data(),
                        self.config.byte_order,
                    )
                };
                self.transport.release(packet);

                self.log_outcome(&outcome);
                Some(SessionEvent::Packet(outcome))
            }
            TransportEvent::Disconnect => {
                info!("Disconnected from server");
                self.peer_active = false;
                self.state.reset();
                Some(SessionEvent::Disconnected)
            }
        }
    }

    fn send_input_if_due(&mut self, now: f64) {
        let Some(local_id) = self.state.local_player_id() else {
            return;
        };
        if !self.state.input_due(now, self.config.update_interval) {
            return;
        }
        let Some(position) = self.players.get(local_id) else {
            return;
        };

        let mut buffer = [0u8; UPDATE_INPUT_LEN];
        write_update_input(&mut buffer, position, self.config.byte_order);

        match self.transport.send(&buffer, Delivery::Reliable) {
            Ok(()) => {
                self.stats.packets_sent += 1;
                trace!("Sent input update at ({}, {})", position.x, position.y);
            }
            Err(e) => {
                self.stats.send_failures += 1;
                warn!("Error sending input update: {}", e);
            }
        }

        self.state.mark_input_sent(now);
    }

    fn log_outcome(&mut self, outcome: &HandleOutcome) {
        if outcome.is_ignored() {
            self.stats.packets_ignored += 1;
        }
        match outcome {
            HandleOutcome::Accepted(id) => info!("Accepted by server as player {}", id),
            HandleOutcome::PlayerAdded(id, _) => debug!("Player {} joined", id),
            HandleOutcome::PlayerRemoved(id) => debug!("Player {} left", id),
            HandleOutcome::PlayerUpdated(..) => {}
            HandleOutcome::Ignored(reason) => debug!("Ignoring packet: {}", reason),
        }
    }

    /// Drops the connection and the local endpoint. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if self.peer_active {
            self.transport.disconnect_peer();
            info!("Disconnecting from server");
        }
        if self.host_open {
            self.transport.destroy_host();
        }
        if self.initialized {
            self.transport.deinitialize();
        }

        self.peer_active = false;
        self.host_open = false;
        self.initialized = false;
        self.state.reset();
    }

    /// Moves the local player by `delta`, keeping it on the field.
    ///
    /// Only a local convenience; the server is expected to validate positions itself.
    pub fn apply_local_movement(&mut self, delta: Position) {
        let Some(local_id) = self.state.local_player_id() else {
            return;
        };
        if let Some(position) = self.players.get(local_id) {
            let moved = self.config.field.clamp(position + delta);
            self.players.update_position(local_id, moved);
        }
    }

    /// True when a peer exists and the server has assigned us an id.
    pub fn is_connected(&self) -> bool {
        self.peer_active && self.state.is_joined()
    }

    /// True while a connection attempt or connection is active.
    pub fn has_peer(&self) -> bool {
        self.peer_active
    }

    pub fn local_player_id(&self) -> Option<PlayerId> {
        self.state.local_player_id()
    }

    pub fn player_position(&self, id: PlayerId) -> Option<Position> {
        self.players.get(id)
    }

    pub fn players(&self) -> &PlayerTable {
        &self.players
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

//! Interprets server commands against the local player table.
//!
//! Until the server has accepted us, `AcceptPlayer` is the only command that
//! does anything. Once joined, the server may add, remove and move remote
//! players but never touch the local slot. Anything else is dropped without
//! changing state; the returned [`HandleOutcome`] says why.

use shared::{
    ByteOrder, Command, CommandTag, DecodeError, PlayerId, PlayerTable, Position, SPAWN_POSITION,
};
use std::fmt;

/// Join state of the local client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    local_player_id: Option<PlayerId>,
    /// `None` means the next input update is due immediately.
    last_input_sent_at: Option<f64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_player_id(&self) -> Option<PlayerId> {
        self.local_player_id
    }

    pub fn is_joined(&self) -> bool {
        self.local_player_id.is_some()
    }

    pub fn last_input_sent_at(&self) -> Option<f64> {
        self.last_input_sent_at
    }

    /// True once more than `interval` seconds passed since the last update.
    pub fn input_due(&self, now: f64, interval: f64) -> bool {
        match self.last_input_sent_at {
            Some(sent_at) => now - sent_at > interval,
            None => true,
        }
    }

    pub fn mark_input_sent(&mut self, now: f64) {
        self.last_input_sent_at = Some(now);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyPacket,
    UnknownCommand(u8),
    /// Anything but `AcceptPlayer` before we were accepted.
    NotJoined(CommandTag),
    AlreadyJoined,
    InvalidPlayerId(u8),
    /// The server tried to act on our own slot.
    LocalPlayer(PlayerId),
    InactivePlayer(PlayerId),
    /// `UpdateInput` only flows client to server.
    ClientCommand,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::EmptyPacket => write!(f, "empty packet"),
            IgnoreReason::UnknownCommand(tag) => write!(f, "unknown command tag {}", tag),
            IgnoreReason::NotJoined(tag) => write!(f, "{:?} received before acceptance", tag),
            IgnoreReason::AlreadyJoined => write!(f, "already accepted"),
            IgnoreReason::InvalidPlayerId(id) => write!(f, "player id {} out of range", id),
            IgnoreReason::LocalPlayer(id) => write!(f, "player id {} is the local player", id),
            IgnoreReason::InactivePlayer(id) => write!(f, "player {} is not active", id),
            IgnoreReason::ClientCommand => write!(f, "client-only command from server"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleOutcome {
    Accepted(PlayerId),
    PlayerAdded(PlayerId, Position),
    PlayerRemoved(PlayerId),
    PlayerUpdated(PlayerId, Position),
    Ignored(IgnoreReason),
}

impl HandleOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, HandleOutcome::Ignored(_))
    }
}

/// Decodes one received packet and applies it.
pub fn handle_packet(
    state: &mut SessionState,
    players: &mut PlayerTable,
    data: &[u8],
    order: ByteOrder,
) -> HandleOutcome {
    match Command::decode(data, order) {
        Ok(command) => handle_command(state, players, command),
        Err(DecodeError::Empty) => HandleOutcome::Ignored(IgnoreReason::EmptyPacket),
        Err(DecodeError::UnknownCommand(tag)) => {
            HandleOutcome::Ignored(IgnoreReason::UnknownCommand(tag))
        }
    }
}

pub fn handle_command(
    state: &mut SessionState,
    players: &mut PlayerTable,
    command: Command,
) -> HandleOutcome {
    match state.local_player_id {
        None => handle_unjoined(state, players, command),
        Some(local_id) => handle_joined(players, local_id, command),
    }
}

fn handle_unjoined(
    state: &mut SessionState,
    players: &mut PlayerTable,
    command: Command,
) -> HandleOutcome {
    let Command::AcceptPlayer { player_id } = command else {
        return HandleOutcome::Ignored(IgnoreReason::NotJoined(command.tag()));
    };

    let id = PlayerId::from(player_id);
    if !PlayerTable::is_valid_id(id) {
        return HandleOutcome::Ignored(IgnoreReason::InvalidPlayerId(player_id));
    }

    state.local_player_id = Some(id);
    state.last_input_sent_at = None;
    players.set_active(id, SPAWN_POSITION);

    HandleOutcome::Accepted(id)
}

fn handle_joined(
    players: &mut PlayerTable,
    local_id: PlayerId,
    command: Command,
) -> HandleOutcome {
    let outcome = match command {
        Command::AddPlayer {
            player_id,
            position,
        } => remote_id(player_id, local_id).map(|id| {
            players.set_active(id, position);
            HandleOutcome::PlayerAdded(id, position)
        }),
        Command::RemovePlayer { player_id } => remote_id(player_id, local_id).map(|id| {
            players.clear(id);
            HandleOutcome::PlayerRemoved(id)
        }),
        Command::UpdatePlayer {
            player_id,
            position,
        } => remote_id(player_id, local_id).and_then(|id| {
            if players.update_position(id, position) {
                Ok(HandleOutcome::PlayerUpdated(id, position))
            } else {
                Err(IgnoreReason::InactivePlayer(id))
            }
        }),
        Command::AcceptPlayer { .. } => Err(IgnoreReason::AlreadyJoined),
        Command::UpdateInput { .. } => Err(IgnoreReason::ClientCommand),
    };

    outcome.unwrap_or_else(HandleOutcome::Ignored)
}

/// Validates an id the server sent about some other player.
fn remote_id(raw: u8, local_id: PlayerId) -> Result<PlayerId, IgnoreReason> {
    let id = PlayerId::from(raw);
    if !PlayerTable::is_valid_id(id) {
        return Err(IgnoreReason::InvalidPlayerId(raw));
    }
    if id == local_id {
        return Err(IgnoreReason::LocalPlayer(id));
    }
    Ok(id)
}

//! Protocol definitions shared by anything that speaks the player sync protocol.
//!
//! The wire format is a single command tag byte followed by a fixed payload.
//! Positions travel as two signed 16-bit integers. See [`codec`] for the byte
//! layout and [`players`] for the fixed-capacity player table.

pub mod codec;
pub mod players;

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

pub use codec::{
    write_update_input, ByteOrder, Command, CommandTag, DecodeError, PacketReader, PacketWriter,
    ParseByteOrderError, UPDATE_INPUT_LEN,
};
pub use players::{PlayerId, PlayerSlot, PlayerTable};

pub const MAX_PLAYERS: usize = 8;
pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 600.0;
pub const PLAYER_SIZE: f32 = 32.0;

/// Where a freshly accepted local player is placed.
pub const SPAWN_POSITION: Position = Position { x: 100.0, y: 100.0 };

/// Seconds between two outbound input updates (20 updates per second).
pub const INPUT_UPDATE_INTERVAL: f64 = 1.0 / 20.0;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:4545";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamps both axes into `[0, max_x] x [0, max_y]`.
    pub fn clamp_to(self, max_x: f32, max_y: f32) -> Self {
        Self {
            x: self.x.max(0.0).min(max_x),
            y: self.y.max(0.0).min(max_y),
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

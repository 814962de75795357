//! Tunables for a [`NetworkSession`](crate::session::NetworkSession).

use serde::{Deserialize, Serialize};
use shared::{ByteOrder, Position, FIELD_HEIGHT, FIELD_WIDTH, INPUT_UPDATE_INTERVAL, PLAYER_SIZE};

/// Playing field used to clamp local movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    pub width: f32,
    pub height: f32,
    pub player_size: f32,
}

impl FieldBounds {
    /// Keeps the whole player square inside the field.
    pub fn clamp(&self, position: Position) -> Position {
        position.clamp_to(
            (self.width - self.player_size).max(0.0),
            (self.height - self.player_size).max(0.0),
        )
    }
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            player_size: PLAYER_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum seconds between two outbound input updates.
    pub update_interval: f64,
    pub byte_order: ByteOrder,
    pub field: FieldBounds,
    /// Peers the local host endpoint is created for.
    pub peer_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_interval: INPUT_UPDATE_INTERVAL,
            byte_order: ByteOrder::Native,
            field: FieldBounds::default(),
            peer_capacity: 1,
        }
    }
}

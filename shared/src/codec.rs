//! Byte-level reader and writer for the player sync protocol.
//!
//! Every packet starts with a one byte [`CommandTag`]. Multi-byte values are
//! signed 16-bit integers in the configured [`ByteOrder`]; the protocol itself
//! never normalizes byte order, so both ends must agree on it out of band.
//!
//! | Tag            | Value | Payload                         |
//! |----------------|-------|---------------------------------|
//! | `AcceptPlayer` | 1     | `u8` assigned id                |
//! | `AddPlayer`    | 2     | `u8` id, `i16` x, `i16` y       |
//! | `RemovePlayer` | 3     | `u8` id                         |
//! | `UpdatePlayer` | 4     | `u8` id, `i16` x, `i16` y       |
//! | `UpdateInput`  | 5     | `i16` x, `i16` y                |

use crate::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size of an encoded `UpdateInput` packet: tag plus two shorts.
pub const UPDATE_INPUT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Whatever the host uses. Only interoperates with peers of the same endianness.
    #[default]
    Native,
    Little,
    Big,
}

impl ByteOrder {
    pub fn decode_i16(self, bytes: [u8; 2]) -> i16 {
        match self {
            ByteOrder::Native => i16::from_ne_bytes(bytes),
            ByteOrder::Little => i16::from_le_bytes(bytes),
            ByteOrder::Big => i16::from_be_bytes(bytes),
        }
    }

    pub fn encode_i16(self, value: i16) -> [u8; 2] {
        match self {
            ByteOrder::Native => value.to_ne_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown byte order '{0}', expected native, little or big")]
pub struct ParseByteOrderError(String);

impl FromStr for ByteOrder {
    type Err = ParseByteOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(ByteOrder::Native),
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" => Ok(ByteOrder::Big),
            _ => Err(ParseByteOrderError(s.to_string())),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ByteOrder::Native => "native",
            ByteOrder::Little => "little",
            ByteOrder::Big => "big",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("packet is empty")]
    Empty,
    #[error("unknown command tag {0}")]
    UnknownCommand(u8),
}

/// Cursor over a received packet.
///
/// Reads past the end of the buffer return 0 and leave the cursor where it
/// was. Callers bound the number of reads by the command's fixed layout.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    offset: usize,
    order: ByteOrder,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            offset: 0,
            order,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.offset.checked_add(N)?;
        let bytes: [u8; N] = self.data.get(self.offset..end)?.try_into().ok()?;
        self.offset = end;
        Some(bytes)
    }

    pub fn read_u8(&mut self) -> u8 {
        self.take::<1>().map_or(0, |[byte]| byte)
    }

    pub fn read_i16(&mut self) -> i16 {
        let order = self.order;
        self.take::<2>().map_or(0, |bytes| order.decode_i16(bytes))
    }

    /// Reads x then y.
    pub fn read_position(&mut self) -> Position {
        let x = self.read_i16();
        let y = self.read_i16();
        Position::new(f32::from(x), f32::from(y))
    }
}

#[derive(Debug, Clone)]
pub struct PacketWriter {
    buffer: Vec<u8>,
    order: ByteOrder,
}

impl PacketWriter {
    pub fn new(order: ByteOrder) -> Self {
        Self::with_capacity(UPDATE_INPUT_LEN, order)
    }

    pub fn with_capacity(capacity: usize, order: ByteOrder) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            order,
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.buffer.extend_from_slice(&self.order.encode_i16(value));
        self
    }

    /// Positions go on the wire truncated toward zero.
    pub fn write_position(&mut self, position: Position) -> &mut Self {
        self.write_i16(position.x as i16).write_i16(position.y as i16)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Serializes an `UpdateInput` packet for `position` into `buffer`.
pub fn write_update_input(
    buffer: &mut [u8; UPDATE_INPUT_LEN],
    position: Position,
    order: ByteOrder,
) {
    buffer[0] = CommandTag::UpdateInput as u8;
    buffer[1..3].copy_from_slice(&order.encode_i16(position.x as i16));
    buffer[3..5].copy_from_slice(&order.encode_i16(position.y as i16));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandTag {
    /// Server -> client: you have been accepted, carries your player id.
    AcceptPlayer = 1,
    /// Server -> client: a remote player joined.
    AddPlayer = 2,
    /// Server -> client: a remote player left.
    RemovePlayer = 3,
    /// Server -> client: new position for a remote player.
    UpdatePlayer = 4,
    /// Client -> server: new position for the local player.
    UpdateInput = 5,
}

impl CommandTag {
    /// Payload size in bytes, not counting the tag itself.
    pub const fn payload_len(self) -> usize {
        match self {
            CommandTag::AcceptPlayer | CommandTag::RemovePlayer => 1,
            CommandTag::AddPlayer | CommandTag::UpdatePlayer => 5,
            CommandTag::UpdateInput => 4,
        }
    }
}

impl TryFrom<u8> for CommandTag {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CommandTag::AcceptPlayer),
            2 => Ok(CommandTag::AddPlayer),
            3 => Ok(CommandTag::RemovePlayer),
            4 => Ok(CommandTag::UpdatePlayer),
            5 => Ok(CommandTag::UpdateInput),
            other => Err(DecodeError::UnknownCommand(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    AcceptPlayer { player_id: u8 },
    AddPlayer { player_id: u8, position: Position },
    RemovePlayer { player_id: u8 },
    UpdatePlayer { player_id: u8, position: Position },
    UpdateInput { position: Position },
}

impl Command {
    pub fn tag(&self) -> CommandTag {
        match self {
            Command::AcceptPlayer { .. } => CommandTag::AcceptPlayer,
            Command::AddPlayer { .. } => CommandTag::AddPlayer,
            Command::RemovePlayer { .. } => CommandTag::RemovePlayer,
            Command::UpdatePlayer { .. } => CommandTag::UpdatePlayer,
            Command::UpdateInput { .. } => CommandTag::UpdateInput,
        }
    }

    /// Decodes one packet. Only the tag can fail; a short payload reads as zeros.
    pub fn decode(data: &[u8], order: ByteOrder) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut reader = PacketReader::new(data, order);
        let tag = CommandTag::try_from(reader.read_u8())?;

        let command = match tag {
            CommandTag::AcceptPlayer => Command::AcceptPlayer {
                player_id: reader.read_u8(),
            },
            CommandTag::AddPlayer => Command::AddPlayer {
                player_id: reader.read_u8(),
                position: reader.read_position(),
            },
            CommandTag::RemovePlayer => Command::RemovePlayer {
                player_id: reader.read_u8(),
            },
            CommandTag::UpdatePlayer => Command::UpdatePlayer {
                player_id: reader.read_u8(),
                position: reader.read_position(),
            },
            CommandTag::UpdateInput => Command::UpdateInput {
                position: reader.read_position(),
            },
        };

        Ok(command)
    }

    pub fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let tag = self.tag();
        let mut writer = PacketWriter::with_capacity(1 + tag.payload_len(), order);
        writer.write_u8(tag as u8);

        match *self {
            Command::AcceptPlayer { player_id } | Command::RemovePlayer { player_id } => {
                writer.write_u8(player_id);
            }
            Command::AddPlayer {
                player_id,
                position,
            }
            | Command::UpdatePlayer {
                player_id,
                position,
            } => {
                writer.write_u8(player_id).write_position(position);
            }
            Command::UpdateInput { position } => {
                writer.write_position(position);
            }
        }

        writer.into_bytes()
    }
}

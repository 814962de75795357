//! # Player Sync Client
//!
//! Client side of the player synchronization protocol. It keeps a local view
//! of every player's position, exchanges a small binary protocol with one
//! authoritative server, and throttles its own position updates to a fixed
//! rate.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! The per-frame driver. Owns the transport, the player table and the join
//! state. Each tick sends at most one input update and handles at most one
//! transport event.
//!
//! ### Protocol Module (`protocol`)
//! Applies decoded server commands to the player table, enforcing which
//! commands are legal before and after the server has accepted us.
//!
//! ### Transport Modules (`transport`, `udp`)
//! The packet transport interface the session is written against, an
//! in-memory implementation and a UDP socket implementation.
//!
//! ### Config Module (`config`)
//! Update interval, byte order and field bounds.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::SyncConfig;
//! use client::session::NetworkSession;
//! use client::udp::UdpTransport;
//! use shared::Position;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = NetworkSession::new(UdpTransport::new(), SyncConfig::default());
//! session.connect("127.0.0.1:4545")?;
//!
//! let start = std::time::Instant::now();
//! loop {
//!     session.apply_local_movement(Position::new(1.0, 0.0));
//!     session.tick(start.elapsed().as_secs_f64());
//!
//!     for (id, position) in session.players().active() {
//!         println!("player {} at ({}, {})", id, position.x, position.y);
//!     }
//! #   break;
//! }
//!
//! session.disconnect();
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! Everything runs on the caller's thread. Nothing blocks: the transport is
//! polled with a zero timeout so a slow server never stalls a frame.

pub mod config;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod udp;

pub use config::{FieldBounds, SyncConfig};
pub use protocol::{HandleOutcome, IgnoreReason, SessionState};
pub use session::{NetworkSession, SessionEvent, SessionStats};
pub use transport::{
    Delivery, LoopbackTransport, ReceivedPacket, SentPacket, Transport, TransportError,
    TransportEvent,
};
pub use udp::UdpTransport;

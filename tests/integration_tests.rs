//! Integration tests for the client sync layer
//!
//! These tests drive a whole session through scripted and real transports.

use client::config::SyncConfig;
use client::session::{NetworkSession, SessionEvent};
use client::transport::{Delivery, LoopbackTransport};
use client::udp::UdpTransport;
use client::{HandleOutcome, IgnoreReason};
use assert_approx_eq::assert_approx_eq;
use shared::{ByteOrder, Command, PacketReader, Position, MAX_PLAYERS, SPAWN_POSITION};
use std::time::{Duration, Instant};
use tokio::time::sleep;

const SERVER: &str = "127.0.0.1:4545";

fn loopback_session() -> NetworkSession<LoopbackTransport> {
    let mut session = NetworkSession::new(LoopbackTransport::new(), SyncConfig::default());
    session.connect(SERVER).unwrap();
    session
}

fn deliver(session: &mut NetworkSession<LoopbackTransport>, command: Command, now: f64) {
    session
        .transport_mut()
        .push_receive(command.encode(ByteOrder::Native));
    session.tick(now);
}

/// WIRE FORMAT TESTS
mod protocol_tests {
    use super::*;

    /// Tests the byte-exact layout of every command
    #[test]
    fn command_layouts() {
        let order = ByteOrder::Little;
        let position = Position::new(300.0, -20.0);

        assert_eq!(Command::AcceptPlayer { player_id: 4 }.encode(order), vec![1, 4]);
        assert_eq!(Command::RemovePlayer { player_id: 6 }.encode(order), vec![3, 6]);
        assert_eq!(
            Command::AddPlayer {
                player_id: 1,
                position
            }
            .encode(order),
            vec![2, 1, 0x2C, 0x01, 0xEC, 0xFF]
        );
        assert_eq!(
            Command::UpdatePlayer {
                player_id: 7,
                position
            }
            .encode(order),
            vec![4, 7, 0x2C, 0x01, 0xEC, 0xFF]
        );
        assert_eq!(
            Command::UpdateInput { position }.encode(order),
            vec![5, 0x2C, 0x01, 0xEC, 0xFF]
        );
    }

    /// Tests that an outbound update decodes back to the truncated position
    #[test]
    fn update_input_round_trip_truncates() {
        let mut session = loopback_session();
        deliver(&mut session, Command::AcceptPlayer { player_id: 0 }, 0.0);
        session.apply_local_movement(Position::new(0.75, 33.9));
        session.tick(0.0);

        let sent = session.transport().sent();
        assert_eq!(sent.len(), 1);

        let mut reader = PacketReader::new(&sent[0].data, ByteOrder::Native);
        assert_eq!(reader.read_u8(), 5);
        assert_eq!(reader.read_i16(), 100);
        assert_eq!(reader.read_i16(), 133);
        assert_eq!(reader.remaining(), 0);
    }
}

/// SESSION BEHAVIOUR TESTS
mod session_tests {
    use super::*;

    /// Tests a full join, play and leave sequence
    #[test]
    fn full_session_lifecycle() {
        let mut session = loopback_session();
        assert!(!session.is_connected());

        deliver(&mut session, Command::AcceptPlayer { player_id: 1 }, 0.0);
        assert!(session.is_connected());
        assert_eq!(session.local_player_id(), Some(1));
        assert_eq!(session.player_position(1), Some(SPAWN_POSITION));

        deliver(
            &mut session,
            Command::AddPlayer {
                player_id: 0,
                position: Position::new(400.0, 300.0),
            },
            0.1,
        );
        deliver(
            &mut session,
            Command::AddPlayer {
                player_id: 5,
                position: Position::new(20.0, 40.0),
            },
            0.2,
        );
        deliver(
            &mut session,
            Command::UpdatePlayer {
                player_id: 5,
                position: Position::new(25.0, 45.0),
            },
            0.3,
        );

        let active: Vec<_> = session.players().active().collect();
        assert_eq!(
            active,
            vec![
                (0, Position::new(400.0, 300.0)),
                (1, SPAWN_POSITION),
                (5, Position::new(25.0, 45.0)),
            ]
        );

        deliver(&mut session, Command::RemovePlayer { player_id: 0 }, 0.4);
        assert_eq!(session.player_position(0), None);
        assert_eq!(session.players().active_count(), 2);

        session.transport_mut().push_disconnect();
        assert_eq!(session.tick(0.5), Some(SessionEvent::Disconnected));
        assert!(!session.is_connected());
        assert_eq!(session.local_player_id(), None);

        session.disconnect();
        let transport = session.transport();
        assert!(!transport.has_host());
        assert!(!transport.is_initialized());
        assert_eq!(transport.released_count(), transport.delivered_count());
    }

    /// Tests that updates leave at no more than 20 per second
    #[test]
    fn input_updates_are_rate_limited() {
        let mut session = loopback_session();
        deliver(&mut session, Command::AcceptPlayer { player_id: 2 }, 0.0);

        let interval = session.config().update_interval;
        let mut send_times = Vec::new();
        for frame in 0..120 {
            let now = frame as f64 / 60.0;
            let before = session.transport().sent().len();
            session.apply_local_movement(Position::new(1.0, 0.5));
            session.tick(now);

            let after = session.transport().sent().len();
            assert!(after - before <= 1);
            if after > before {
                send_times.push(now);
            }
        }

        assert_eq!(send_times[0], 0.0);
        for pair in send_times.windows(2) {
            assert!(pair[1] - pair[0] > interval);
        }
        assert!(send_times.len() >= 20 && send_times.len() <= 40);
        assert!(session
            .transport()
            .sent()
            .iter()
            .all(|packet| packet.delivery == Delivery::Reliable));
    }

    /// Tests that the server can never move or drop the local player
    #[test]
    fn server_cannot_touch_local_slot() {
        let mut session = loopback_session();
        deliver(&mut session, Command::AcceptPlayer { player_id: 3 }, 0.0);

        session
            .transport_mut()
            .push_receive(Command::RemovePlayer { player_id: 3 }.encode(ByteOrder::Native));
        let event = session.tick(0.0);

        assert_eq!(
            event,
            Some(SessionEvent::Packet(HandleOutcome::Ignored(
                IgnoreReason::LocalPlayer(3)
            )))
        );
        assert_eq!(session.player_position(3), Some(SPAWN_POSITION));
    }

    /// Tests that out-of-range ids are rejected before and after joining
    #[test]
    fn out_of_range_ids_are_ignored() {
        let mut session = loopback_session();
        deliver(
            &mut session,
            Command::AcceptPlayer {
                player_id: MAX_PLAYERS as u8,
            },
            0.0,
        );
        assert!(!session.is_connected());

        deliver(&mut session, Command::AcceptPlayer { player_id: 0 }, 0.0);
        let before = session.players().clone();
        deliver(
            &mut session,
            Command::AddPlayer {
                player_id: 200,
                position: Position::new(1.0, 1.0),
            },
            0.0,
        );
        assert_eq!(session.players(), &before);
        assert_eq!(session.stats().packets_ignored, 2);
    }

    /// Tests local movement clamping against the playing field
    #[test]
    fn local_movement_is_clamped() {
        let mut session = loopback_session();
        deliver(&mut session, Command::AcceptPlayer { player_id: 0 }, 0.0);

        session.apply_local_movement(Position::new(-105.0, 600.0));
        assert_eq!(session.player_position(0), Some(Position::new(0.0, 568.0)));

        session.apply_local_movement(Position::new(10_000.0, -10_000.0));
        assert_eq!(session.player_position(0), Some(Position::new(768.0, 0.0)));

        session.apply_local_movement(Position::new(-0.25, 12.75));
        let local = session.player_position(0).unwrap();
        assert_approx_eq!(local.x, 767.75);
        assert_approx_eq!(local.y, 12.75);
    }
}

/// REAL SOCKET TESTS
mod udp_tests {
    use super::*;

    /// Tests joining and sending an update through a real UDP socket
    #[tokio::test]
    async fn udp_session_joins_and_sends_input() {
        let server = std::net::UdpSocket::bind("127.0.0.1:0").expect("Failed to bind server socket");
        server
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let server_addr = server.local_addr().unwrap();

        let transport = UdpTransport::with_bind_address("127.0.0.1:0".parse().unwrap());
        let mut session = NetworkSession::new(transport, SyncConfig::default());
        session.connect(&server_addr.to_string()).unwrap();
        let client_addr = session.transport().local_addr().unwrap();

        let accept = Command::AcceptPlayer { player_id: 2 }.encode(ByteOrder::Native);
        server.send_to(&accept, client_addr).unwrap();

        let start = Instant::now();
        for _ in 0..100 {
            session.tick(start.elapsed().as_secs_f64());
            if session.is_connected() {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert!(session.is_connected());
        assert_eq!(session.local_player_id(), Some(2));

        session.tick(start.elapsed().as_secs_f64());

        let mut buf = [0u8; 64];
        let (len, from) = server.recv_from(&mut buf).unwrap();
        assert_eq!(from, client_addr);
        assert_eq!(
            Command::decode(&buf[..len], ByteOrder::Native),
            Ok(Command::UpdateInput {
                position: SPAWN_POSITION
            })
        );

        session.disconnect();
        assert!(session.transport().local_addr().is_none());
    }

    /// Tests that a silent server never blocks the tick
    #[tokio::test]
    async fn udp_tick_never_blocks() {
        let server = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let transport = UdpTransport::with_bind_address("127.0.0.1:0".parse().unwrap());
        let mut session = NetworkSession::new(transport, SyncConfig::default());
        session
            .connect(&server.local_addr().unwrap().to_string())
            .unwrap();

        let start = Instant::now();
        for frame in 0..100 {
            assert_eq!(session.tick(frame as f64 / 60.0), None);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!session.is_connected());
    }
}

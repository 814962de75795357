//! Performance benchmarks for the per-frame hot paths

use client::config::SyncConfig;
use client::session::NetworkSession;
use client::transport::LoopbackTransport;
use shared::{write_update_input, ByteOrder, Command, Position, UPDATE_INPUT_LEN};
use std::time::Instant;

/// Benchmarks decoding of server commands
#[test]
fn benchmark_command_decode() {
    let packet = Command::UpdatePlayer {
        player_id: 3,
        position: Position::new(250.0, 125.0),
    }
    .encode(ByteOrder::Native);

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = Command::decode(&packet, ByteOrder::Native);
    }

    let duration = start.elapsed();
    println!(
        "Command decode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks encoding of outbound input updates
#[test]
fn benchmark_update_input_encode() {
    let mut buffer = [0u8; UPDATE_INPUT_LEN];
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let position = Position::new((i % 768) as f32, (i % 568) as f32);
        write_update_input(&mut buffer, position, ByteOrder::Little);
    }

    let duration = start.elapsed();
    println!(
        "UpdateInput encode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks full session ticks with a steady stream of remote updates
#[test]
fn benchmark_session_tick() {
    let mut session = NetworkSession::new(LoopbackTransport::new(), SyncConfig::default());
    session.connect("127.0.0.1:4545").unwrap();
    session
        .transport_mut()
        .push_receive(Command::AcceptPlayer { player_id: 0 }.encode(ByteOrder::Native));
    session.tick(0.0);

    let frames = 10_000;
    for i in 0..frames {
        let command = Command::AddPlayer {
            player_id: (i % 7 + 1) as u8,
            position: Position::new(i as f32 % 700.0, 200.0),
        };
        session
            .transport_mut()
            .push_receive(command.encode(ByteOrder::Native));
    }

    let start = Instant::now();
    for frame in 0..frames {
        session.apply_local_movement(Position::new(0.5, 0.25));
        session.tick(frame as f64 / 60.0);
    }

    let duration = start.elapsed();
    println!(
        "Session tick: {} frames in {:?} ({:.2} μs/frame)",
        frames,
        duration,
        duration.as_micros() as f64 / frames as f64
    );

    assert_eq!(session.transport().released_count(), frames + 1);
    assert_eq!(session.players().active_count(), 8);
    assert!(duration.as_millis() < 1000);
}

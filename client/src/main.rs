use clap::Parser;
use client::config::SyncConfig;
use client::session::{NetworkSession, SessionEvent};
use client::udp::UdpTransport;
use client::HandleOutcome;
use log::{info, warn};
use rand::Rng;
use shared::{ByteOrder, Position, DEFAULT_SERVER_ADDRESS};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless player sync client", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = DEFAULT_SERVER_ADDRESS)]
    server: String,

    /// Frames per second driving the network tick
    #[arg(short = 'f', long, default_value = "60")]
    fps: u32,

    /// Byte order of 16-bit values on the wire (native, little, big)
    #[arg(short = 'b', long, default_value = "native")]
    byte_order: ByteOrder,

    /// Movement speed of the wandering player in pixels per second
    #[arg(long, default_value = "120")]
    speed: f32,

    /// Local address to bind; defaults to a wildcard of the server's address family
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Stop after this many seconds instead of running until Ctrl-C
    #[arg(short = 'd', long)]
    duration: Option<u64>,
}

/// Random walk standing in for player input.
struct Wanderer {
    heading: f32,
    speed: f32,
}

impl Wanderer {
    fn new(speed: f32) -> Self {
        Self {
            heading: rand::thread_rng().gen_range(0.0..std::f32::consts::TAU),
            speed,
        }
    }

    fn step(&mut self, dt: f32) -> Position {
        self.heading += rand::thread_rng().gen_range(-1.5..1.5) * dt;
        let distance = self.speed * dt;
        Position::new(self.heading.cos() * distance, self.heading.sin() * distance)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let fps = args.fps.max(1);

    let config = SyncConfig {
        byte_order: args.byte_order,
        ..SyncConfig::default()
    };

    info!("Starting client...");
    info!("Byte order: {}, {} fps", config.byte_order, fps);

    let transport = match args.bind {
        Some(address) => UdpTransport::with_bind_address(address),
        None => UdpTransport::new(),
    };
    let mut session = NetworkSession::new(transport, config);
    session.connect(&args.server)?;

    let frame = Duration::from_secs_f64(1.0 / f64::from(fps));
    let mut frame_interval = interval(frame);
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut report_interval = interval(Duration::from_secs(1));

    let deadline = args.duration.map(Duration::from_secs);
    let start = Instant::now();
    let mut last_frame = start;
    let mut wanderer = Wanderer::new(args.speed);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }

            now = frame_interval.tick() => {
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;

                session.apply_local_movement(wanderer.step(dt));

                match session.tick(now.duration_since(start).as_secs_f64()) {
                    Some(SessionEvent::Disconnected) => {
                        warn!("Server closed the connection");
                        break;
                    }
                    Some(SessionEvent::Packet(HandleOutcome::Accepted(id))) => {
                        info!("Playing as player {}", id);
                    }
                    _ => {}
                }

                if deadline.is_some_and(|limit| now.duration_since(start) >= limit) {
                    info!("Run time elapsed");
                    break;
                }
            }

            _ = report_interval.tick() => {
                if session.is_connected() {
                    log_players(&session);
                } else {
                    info!("Waiting for the server to accept us...");
                }
            }
        }
    }

    session.disconnect();
    Ok(())
}

fn log_players(session: &NetworkSession<UdpTransport>) {
    let players: Vec<String> = session
        .players()
        .active()
        .map(|(id, pos)| format!("{}@({:.0}, {:.0})", id, pos.x, pos.y))
        .collect();
    let stats = session.stats();
    info!(
        "Local player {:?}, players [{}], sent {}, received {}, ignored {}",
        session.local_player_id(),
        players.join(", "),
        stats.packets_sent,
        stats.packets_received,
        stats.packets_ignored
    );
}

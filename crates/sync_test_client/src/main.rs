//! # Waypoint Load Client
//!
//! Spawns a number of simulated players that connect to a Waypoint server,
//! start from their own spawn entry, wander around with a random walk and
//! keep a local mirror of the other players from the events the server sends
//! back. At the end each player reports how many
//! events it sent and received.

use clap::Parser;
use futures::{SinkExt, StreamExt};
use rand::Rng;
use std::time::Duration;
use sync_server::{
    ClientMessage, ConnectionId, Direction, PlayerSnapshot, PlayerUpdate, ServerEvent,
    CONNECTION_ID_HEADER,
};
use tokio::time::{interval, sleep, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "simulate")]
#[command(about = "Simulate wandering players against a Waypoint server")]
struct Args {
    /// Server WebSocket URL
    #[arg(short, long, default_value = "ws://127.0.0.1:3000")]
    url: String,

    /// Number of simultaneous players to simulate
    #[arg(short, long, default_value = "5")]
    players: u32,

    /// Movement updates per second per player
    #[arg(short, long, default_value = "10.0")]
    move_freq: f64,

    /// Simulation duration in seconds
    #[arg(short, long, default_value = "30")]
    duration: u64,

    /// Side length of the square area players wander in
    #[arg(short, long, default_value = "800.0")]
    world_size: f64,

    /// Distance covered by one movement step
    #[arg(long, default_value = "4.0")]
    step: f64,
}

/// Per-player event counters.
#[derive(Debug, Default, Clone, PartialEq)]
struct EventStats {
    sent: u64,
    snapshots: u64,
    joined: u64,
    moved: u64,
    left: u64,
    undecodable: u64,
}

impl EventStats {
    fn received(&self) -> u64 {
        self.snapshots + self.joined + self.moved + self.left
    }
}

/// A simulated player and its view of the other players.
#[derive(Debug)]
struct SimulatedPlayer {
    /// Id announced by the server during the handshake
    id: ConnectionId,
    x: f64,
    y: f64,
    direction: Direction,
    world_size: f64,
    step: f64,
    world: PlayerSnapshot,
    stats: EventStats,
}

impl SimulatedPlayer {
    fn new(id: ConnectionId, world_size: f64, step: f64) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            direction: Direction::Down,
            world_size,
            step,
            world: PlayerSnapshot::new(),
            stats: EventStats::default(),
        }
    }

    /// Takes our own position from the snapshot and mirrors everyone else.
    fn adopt_snapshot(&mut self, mut snapshot: PlayerSnapshot) {
        self.stats.snapshots += 1;
        match snapshot.remove(&self.id) {
            Some(me) => {
                self.x = me.x;
                self.y = me.y;
                self.direction = me.direction;
            }
            None => warn!("Snapshot is missing our own entry {}", self.id),
        }
        self.world = snapshot;
    }

    /// Folds one server event into the local mirror.
    fn observe(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::CurrentPlayers(snapshot) => self.adopt_snapshot(snapshot),
            ServerEvent::NewPlayer(state) => {
                self.stats.joined += 1;
                self.world.insert(state.id, state);
            }
            ServerEvent::PlayerMoved(state) => {
                self.stats.moved += 1;
                if state.id == self.id {
                    warn!("Server echoed our own movement back");
                    return;
                }
                self.world.insert(state.id, state);
            }
            ServerEvent::PlayerDisconnected(id) => {
                self.stats.left += 1;
                self.world.remove(&id);
            }
        }
    }

    /// Takes one random-walk step, clamped to the world bounds.
    fn wander<R: Rng>(&mut self, rng: &mut R) -> PlayerUpdate {
        let direction = match rng.gen_range(0..4) {
            0 => Direction::Up,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Right,
        };
        let (dx, dy) = match direction {
            Direction::Up => (0.0, -self.step),
            Direction::Down => (0.0, self.step),
            Direction::Left => (-self.step, 0.0),
            Direction::Right => (self.step, 0.0),
        };

        self.x = (self.x + dx).clamp(0.0, self.world_size);
        self.y = (self.y + dy).clamp(0.0, self.world_size);
        self.direction = direction;

        PlayerUpdate {
            direction: Some(direction),
            is_moving: Some(true),
            ..PlayerUpdate::position(self.x, self.y)
        }
    }
}

async fn simulate_player(index: u32, args: Args) -> Result<EventStats, Box<dyn std::error::Error + Send + Sync>> {
    let (ws_stream, response) = connect_async(&args.url).await?;
    let id: ConnectionId = response
        .headers()
        .get(CONNECTION_ID_HEADER)
        .ok_or("handshake response has no connection id")?
        .to_str()?
        .parse()?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let mut player = SimulatedPlayer::new(id, args.world_size, args.step);
    let mut move_timer = interval(Duration::from_secs_f64(1.0 / args.move_freq.max(0.1)));
    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut greeted = false;

    info!("🎮 Player #{} connected as {}", index, id);

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ServerEvent::decode(text.as_str()) {
                        Ok(ServerEvent::CurrentPlayers(snapshot)) if !greeted => {
                            greeted = true;
                            player.adopt_snapshot(snapshot);
                            info!(
                                "📋 Player #{} spawned at ({}, {}) with {} other player(s)",
                                index, player.x, player.y, player.world.len()
                            );
                        }
                        Ok(event) => {
                            debug!("Player #{} received {}", index, event.name());
                            player.observe(event);
                        }
                        Err(e) => {
                            player.stats.undecodable += 1;
                            warn!("Player #{} received an undecodable frame: {}", index, e);
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!("🔌 Player #{} closed by server: {:?}", index, frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Player #{} connection error: {}", index, e);
                        break;
                    }
                    None => {
                        info!("🔌 Player #{} connection ended", index);
                        break;
                    }
                }
            }

            _ = move_timer.tick(), if greeted => {
                let update = player.wander(&mut rand::thread_rng());
                let frame = ClientMessage::PlayerMovement(update).encode()?;
                ws_sender.send(Message::text(frame)).await?;
                player.stats.sent += 1;
            }

            _ = sleep(Duration::from_millis(100)) => {
                if Instant::now() >= deadline {
                    break;
                }
            }
        }
    }

    // Politely announce the departure; the server fans out playerDisconnected.
    let _ = ws_sender.send(Message::Close(None)).await;

    info!(
        "📊 Player #{} final stats: sent {}, received {} ({} moves, {} joins, {} leaves), tracking {} other player(s)",
        index,
        player.stats.sent,
        player.stats.received(),
        player.stats.moved,
        player.stats.joined,
        player.stats.left,
        player.world.len()
    );

    Ok(player.stats)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    info!("🚀 Starting Waypoint load simulation");
    info!("   • Players: {}", args.players);
    info!("   • Area: {}x{}", args.world_size, args.world_size);
    info!("   • Movement: {:.1} Hz, step {}", args.move_freq, args.step);
    info!("   • Duration: {} seconds", args.duration);
    info!("   • Server: {}", args.url);

    let mut handles = Vec::new();
    for index in 0..args.players {
        let args = args.clone();
        handles.push(tokio::spawn(async move {
            match simulate_player(index, args).await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    error!("❌ Player #{} simulation failed: {}", index, e);
                    None
                }
            }
        }));

        // Stagger connections
        sleep(Duration::from_millis(100)).await;
    }

    let mut totals = EventStats::default();
    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok(Some(stats)) => {
                totals.sent += stats.sent;
                totals.snapshots += stats.snapshots;
                totals.joined += stats.joined;
                totals.moved += stats.moved;
                totals.left += stats.left;
                totals.undecodable += stats.undecodable;
            }
            _ => failed += 1,
        }
    }

    info!("✅ Simulation complete");
    info!("   • Movement messages sent: {}", totals.sent);
    info!("   • Events received: {}", totals.received());
    info!("   • Undecodable frames: {}", totals.undecodable);
    if failed > 0 {
        warn!("   • Failed players: {}", failed);
    }

    Ok(())
}

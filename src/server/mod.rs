//! # Game Server
//!
//! TCP front end for the world engine. One lightweight task per connection,
//! newline-framed JSON both ways, and a single shared universe behind a
//! lock:
//!
//! - [`session`] - per-connection state and the five-phase classification
//! - [`commands`] - wire decoding and the fixed command dispatch
//! - [`snapshot`] - `{state, commands}` payload construction
//!
//! A connection task holds the universe lock for exactly one
//! handle-and-snapshot sequence and never performs I/O while holding it, so
//! every command applies without interleaving from other sessions.

pub mod commands;
pub mod session;
pub mod snapshot;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use crate::config::{Config, GameConfig};
use crate::storage::{Store, StoreBuilder};
use crate::world::universe::Universe;

use self::commands::CommandProcessor;
use self::session::Session;

/// The running server: configuration, persistent store, and the one shared
/// universe every session mutates through the lock.
pub struct GameServer {
    config: Config,
    store: Arc<Store>,
    universe: Arc<Mutex<Universe>>,
}

impl GameServer {
    /// Open the store, optionally discarding persisted state first
    /// (`bigbang`), and load the universe. A load failure here is fatal;
    /// nothing after startup is.
    pub fn new(config: Config, bigbang: bool) -> Result<Self> {
        let db_path = std::path::Path::new(&config.storage.data_dir).join("universe");
        let mut builder = StoreBuilder::new(&db_path);
        if bigbang {
            warn!("bigbang: discarding all persisted state");
            builder = builder.wipe_existing();
        }
        let store = builder
            .open()
            .with_context(|| format!("opening universe store at {}", db_path.display()))?;
        let universe = Universe::load(&store).context("loading universe")?;

        Ok(Self {
            config,
            store: Arc::new(store),
            universe: Arc::new(Mutex::new(universe)),
        })
    }

    /// Bind the configured address and accept connections until ctrl-c.
    pub async fn run(&self) -> Result<()> {
        let address = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("binding {address}"))?;
        self.serve(listener).await
    }

    /// Accept connections on an already-bound listener until ctrl-c, then
    /// save and exit. Split out from [`run`](Self::run) so callers can bind
    /// an ephemeral port first.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        if let Ok(address) = listener.local_addr() {
            info!("listening on {}", address);
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted.context("accepting connection")?;
                    info!("connection from {}", peer);
                    let universe = Arc::clone(&self.universe);
                    let store = Arc::clone(&self.store);
                    let game = self.config.game.clone();
                    let idle = Duration::from_secs(self.config.server.idle_timeout_secs);
                    tokio::spawn(async move {
                        handle_connection(stream, peer.to_string(), universe, store, game, idle)
                            .await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        let universe = self.universe.lock().await;
        universe.save(&self.store).context("saving universe")?;
        Ok(())
    }

    /// Print a one-page summary of the persisted world.
    pub async fn show_status(&self) -> Result<()> {
        let universe = self.universe.lock().await;
        println!("startrader universe status");
        println!("  users:   {}", universe.users.len());
        println!("  ships:   {}", universe.ships.len());
        println!("  sectors: {}", universe.sectors.len());
        let ports: usize = universe.ports.values().map(|g| g.len()).sum();
        let stations: usize = universe.stations.values().map(|g| g.len()).sum();
        println!("  ports:   {}", ports);
        println!("  stations:{}", stations);
        Ok(())
    }
}

/// Drive one connection: greet with the anonymous snapshot, then loop
/// reading commands until the client leaves or goes idle. The universe is
/// persisted when the session ends.
async fn handle_connection(
    stream: TcpStream,
    peer: String,
    universe: Arc<Mutex<Universe>>,
    store: Arc<Store>,
    game: GameConfig,
    idle: Duration,
) {
    let session_id = Uuid::new_v4().to_string();
    let mut session = Session::new(session_id.clone(), peer.clone());
    let processor = CommandProcessor::new();

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // Unauthenticated clients always learn login/register first.
    let greeting = {
        let locked = universe.lock().await;
        snapshot::snapshot(&session, &locked)
    };
    if write_line(&mut write_half, &greeting).await.is_err() {
        return;
    }

    loop {
        let line = match timeout(idle, lines.next_line()).await {
            Err(_) => {
                info!("session {} idle for {:?}, closing", session_id, idle);
                break;
            }
            Ok(Err(e)) => {
                warn!("session {} read error: {}", session_id, e);
                break;
            }
            Ok(Ok(None)) => break,
            Ok(Ok(Some(line))) => line,
        };
        if line.trim().is_empty() {
            continue;
        }

        // Lock for the full mutate-and-snapshot sequence; the response is
        // written only after release.
        let response = {
            let mut locked = universe.lock().await;
            processor.process(&mut session, &line, &mut locked, &game, &mut rand::thread_rng())
        };
        if write_line(&mut write_half, &response).await.is_err() {
            break;
        }
    }

    {
        let locked = universe.lock().await;
        if let Err(e) = locked.save(&store) {
            warn!("session-end save failed: {}", e);
        }
    }
    info!(
        "session {} ({}) disconnected",
        session_id,
        session.display_name()
    );
}

async fn write_line(writer: &mut OwnedWriteHalf, payload: &Value) -> std::io::Result<()> {
    let mut data = payload.to_string();
    data.push('\n');
    writer.write_all(data.as_bytes()).await?;
    writer.flush().await
}

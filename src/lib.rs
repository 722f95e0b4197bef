//! # Startrader - a persistent multiplayer space-trading server
//!
//! Players connect over TCP, register or log in, and pilot a ship through a
//! procedurally generated coordinate universe, docking at generated ports to
//! trade commodities for credits. The universe is lazy: a sector and its
//! contents materialize the first time any player visits its coordinates and
//! persist forever after.
//!
//! ## Features
//!
//! - **JSON-line protocol**: one command in, one `{state, commands}`
//!   snapshot out, so clients always know what they may legally do next.
//! - **Lazy procedural generation**: geometrically distributed stars,
//!   planets, stations and ports per sector, memoized per coordinate.
//! - **Asymmetric trade pricing**: ports deep in a commodity sell it cheap
//!   and buy it dear, and the reverse when they are nearly out.
//! - **Persistent universe**: every entity kind saved to an embedded sled
//!   store at shutdown and session end, reloaded at startup.
//! - **Security**: Argon2id password hashing and opaque session tokens.
//! - **Async design**: one Tokio task per connection sharing a single
//!   locked universe.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use startrader::config::Config;
//! use startrader::server::GameServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = GameServer::new(config, false)?;
//!     server.run().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`world`] - the world engine: entities, generation, economy
//! - [`server`] - sessions, command dispatch, snapshots, the TCP loop
//! - [`storage`] - universe persistence layer
//! - [`auth`] - password hashing and session tokens
//! - [`config`] - configuration management and validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Game Server   │ ← sessions, dispatch, snapshots
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  World Engine   │ ← universe store, generation, trade
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │    Storage      │ ← sled persistence
//! └─────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod server;
pub mod storage;
pub mod world;

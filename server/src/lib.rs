//! # Arena Server Library
//!
//! Authoritative state-sync server for the arena shooter. Clients connect over
//! WebSocket and exchange JSON frames of the form `{ "event", "payload" }`,
//! where every payload is a validated success-or-failure envelope.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server owns the canonical registries of players, asteroids, projectiles
//! and pickups, plus the health of every damageable entity. Clients report hits
//! and movement; the server decides what those reports mean and tells everyone.
//!
//! ### Validation at the Boundary
//! Inbound payloads are checked against their schema before any handler sees
//! them. A bad payload is answered with a failure envelope carrying the path of
//! the offending field. Outbound payloads are checked too: a handler that builds
//! an invalid response is a server bug and its frames are dropped.
//!
//! ### Connection Lifecycle
//! Connections are registered when the WebSocket handshake completes, touched on
//! every frame and expired after an idle timeout. Disconnecting removes the
//! player and tells the remaining clients.
//!
//! ## Architecture Design
//!
//! ### Single-Task Event Loop
//! Connection tasks only move text in and out. All state changes happen on the
//! main loop in [`network::Server::run`], one frame at a time, so handlers see a
//! plain `&mut GameState` and need no locks.
//!
//! ### Listeners and Outbox
//! Each client event maps to one [`listener::Listener`]: a request schema, a
//! response schema, a reply event, a delivery rule and a synchronous handler.
//! Handlers write into an [`outbox::Outbox`] instead of sockets; the loop flushes
//! it after the handler returns.
//!
//! ## Module Organization
//!
//! - `client_manager`: connection registry and idle timeouts
//! - `config`: server and gameplay tunables
//! - `context`: lifecycle-checked owner of all per-run state and the event bus
//! - `game`: entity registries and the rules that mutate them
//! - `handlers`: per-domain listeners (player, asteroid, projectile, pickup)
//! - `listener`: validate, handle, validate, deliver
//! - `network`: WebSocket transport and the main loop
//! - `outbox`: queued frames with their delivery targets, plus domain events
//! - `router`: event name to listener table
//! - `simulation`: per-tick asteroid spawning, motion and expiry
//! - `utils`: id minting and ship sprite variants
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use arena_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig {
//!         port: 8080,
//!         tick_rate: 30,
//!         ..ServerConfig::default()
//!     })
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod context;
pub mod game;
pub mod handlers;
pub mod listener;
pub mod network;
pub mod outbox;
pub mod router;
pub mod simulation;
pub mod utils;

pub use client_manager::{ClientManager, ConnectionId, TransportError};
pub use config::{GameConfig, ServerConfig};
pub use context::{ContextError, EventBus, ServerContext, Shared};
pub use game::GameState;
pub use listener::{Delivery, Listener, ListenerError, Outcome};
pub use network::{Server, ServerError, ServerMessage};
pub use outbox::{DomainEvent, Outbox, Target};

//! # Arena Client Library
//!
//! Client side of the arena: a local mirror of the authoritative world kept
//! in an entity-component store, the local ship's own simulation, and the
//! WebSocket loop that ties the two together.
//!
//! ## Architecture Overview
//!
//! The server owns every piece of shared state. The client only simulates its
//! own ship (movement, weapon cooldowns, ammo) and streams the result upward.
//! Everything else it displays arrives as validated server frames and is
//! applied by one reconciliation listener per event.
//!
//! ### Reconciliation
//! Each server event maps to a listener that checks the payload against its
//! schema before touching anything. Creates are idempotent per network id,
//! coordinates for unknown ids are ignored, and destroys for unknown ids are
//! no-ops, so duplicated or reordered frames cannot leak entities.
//!
//! ### Local Simulation
//! Systems run over entities carrying the components they require. Only the
//! local ship carries a `Control` component, so mirrored entities are never
//! driven locally.
//!
//! ## Module Organization
//!
//! ### ECS (`ecs`)
//! Entities, tagged components, systems and the manager that runs them.
//!
//! ### Game (`game`)
//! The mirror itself: network id registries, the local player's life cycle
//! and the outbound request queue.
//!
//! ### Reconciliation (`reconcile`)
//! One listener per server event.
//!
//! ### Systems (`systems`) and Input (`input`)
//! Movement, weapon and render-sync systems, fed by a pluggable input source.
//!
//! ### Rendering (`rendering`)
//! Visual handles and HUD collaborators, with headless implementations.
//!
//! ### Network (`network`)
//! Connection, tick loop and respawn handling.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use arena_client::{Client, ClientConfig};
//!
//! # async fn demo() -> Result<(), arena_client::ClientError> {
//! let mut client = Client::new(ClientConfig {
//!     server_url: "ws://127.0.0.1:8080".to_string(),
//!     name: "Vega".to_string(),
//!     ..ClientConfig::default()
//! });
//! let report = client.run().await?;
//! println!("{} deaths", report.deaths);
//! # Ok(())
//! # }
//! ```

pub mod ecs;
pub mod game;
pub mod input;
pub mod network;
pub mod reconcile;
pub mod rendering;
pub mod systems;

pub use game::{ClientError, ClientGame, DeathHandler, LogDeath, Status, Tracked};
pub use input::{ControlInput, InputSource, ScriptedInput, WanderInput};
pub use network::{Client, ClientConfig, ClientReport};
pub use rendering::{HeadlessRenderer, Hud, HudSnapshot, LogHud, RenderStats, Renderer, Visual};

//! Registry of every event name exchanged between server and clients.
//!
//! Names are `domain:action` strings and must match byte for byte on both
//! sides, so they are only ever produced from [`EventName::as_str`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Player,
    Asteroid,
    Projectile,
    Pickup,
    Game,
}

/// Which side of the connection may emit an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    ClientToServer,
    ServerToClient,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event `{0}`")]
pub struct UnknownEventError(pub String);

macro_rules! registry {
    ($($variant:ident => $wire:literal, $domain:ident, $flow:ident;)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "&'static str", try_from = "String")]
        pub enum EventName {
            $($variant,)+
        }

        impl EventName {
            pub const ALL: &'static [EventName] = &[$(EventName::$variant,)+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(EventName::$variant => $wire,)+
                }
            }

            pub const fn domain(self) -> Domain {
                match self {
                    $(EventName::$variant => Domain::$domain,)+
                }
            }

            pub const fn flow(self) -> Flow {
                match self {
                    $(EventName::$variant => Flow::$flow,)+
                }
            }
        }
    };
}

registry! {
    PlayerJoin => "player:join", Player, ClientToServer;
    PlayerProtagonist => "player:protagonist", Player, ServerToClient;
    PlayerCompetitors => "player:competitors", Player, ServerToClient;
    PlayerJoined => "player:joined", Player, ServerToClient;
    PlayerCoordinates => "player:coordinates", Player, Both;
    PlayerHit => "player:hit", Player, Both;
    PlayerPickup => "player:pickup", Player, Both;
    PlayerStats => "player:stats", Player, ServerToClient;
    PlayerDestroy => "player:destroy", Player, ServerToClient;
    PlayerQuit => "player:quit", Player, ServerToClient;
    AsteroidCreate => "asteroid:create", Asteroid, ServerToClient;
    AsteroidCoordinates => "asteroid:coordinates", Asteroid, ServerToClient;
    AsteroidHit => "asteroid:hit", Asteroid, Both;
    AsteroidDestroy => "asteroid:destroy", Asteroid, ServerToClient;
    ProjectileCreate => "projectile:create", Projectile, Both;
    ProjectileCoordinates => "projectile:coordinates", Projectile, ServerToClient;
    ProjectileDestroy => "projectile:destroy", Projectile, Both;
    PickupDestroy => "pickup:destroy", Pickup, ServerToClient;
    GameDrop => "game:drop", Game, ServerToClient;
    GameError => "game:error", Game, ServerToClient;
}

impl EventName {
    /// True when a client is allowed to send this event to the server.
    pub const fn accepted_from_client(self) -> bool {
        matches!(self.flow(), Flow::ClientToServer | Flow::Both)
    }

    /// True when the server emits this event towards clients.
    pub const fn sent_by_server(self) -> bool {
        matches!(self.flow(), Flow::ServerToClient | Flow::Both)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = UnknownEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventError(s.to_string()))
    }
}

impl TryFrom<String> for EventName {
    type Error = UnknownEventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventName> for &'static str {
    fn from(event: EventName) -> Self {
        event.as_str()
    }
}

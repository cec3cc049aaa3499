//! # Reconciliation
//!
//! One listener per server event. Each validates its payload and applies
//! exactly one change to the local mirror. Coordinates never create entities,
//! destroys for unknown ids are no-ops, and a repeated create replaces the old
//! entity instead of leaking it.

pub mod asteroid;
pub mod pickup;
pub mod player;
pub mod projectile;

use crate::game::{ClientError, ClientGame};
use arena_shared::{open, Envelope, EventName, Frame, Inbound, Schema};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Apply step of a client listener.
pub type Apply<Dto> = fn(&mut ClientGame, Dto) -> Result<(), ClientError>;

/// Binds one server event to its payload schema and the change it makes.
pub struct ClientListener<Dto> {
    pub event: EventName,
    pub apply: Apply<Dto>,
}

impl<Dto: Schema + DeserializeOwned> ClientListener<Dto> {
    /// Invalid payloads are returned as errors before anything is touched.
    /// Failure envelopes are logged and change nothing.
    pub fn handle(&self, game: &mut ClientGame, payload: Value) -> Result<(), ClientError> {
        match open::<Dto>(payload)? {
            Inbound::Dto(dto) => (self.apply)(game, dto),
            Inbound::Failure(error) => {
                warn!(
                    "Server rejected {}: {:?} {} {}",
                    self.event,
                    error.code,
                    error.message,
                    error.path.as_deref().unwrap_or("")
                );
                Ok(())
            }
        }
    }
}

/// Routes a server frame to its listener.
pub fn dispatch(game: &mut ClientGame, frame: Frame) -> Result<(), ClientError> {
    let event = frame.event_name()?;
    let payload = frame.payload;

    match event {
        EventName::PlayerProtagonist => player::PROTAGONIST.handle(game, payload),
        EventName::PlayerCompetitors => player::COMPETITORS.handle(game, payload),
        EventName::PlayerJoined => player::JOINED.handle(game, payload),
        EventName::PlayerCoordinates => player::COORDINATES.handle(game, payload),
        EventName::PlayerHit => player::HIT.handle(game, payload),
        EventName::PlayerStats => player::STATS.handle(game, payload),
        EventName::PlayerDestroy => player::DESTROY.handle(game, payload),
        EventName::PlayerQuit => player::QUIT.handle(game, payload),
        EventName::PlayerPickup => pickup::COLLECTED.handle(game, payload),
        EventName::AsteroidCreate => asteroid::CREATE.handle(game, payload),
        EventName::AsteroidCoordinates => asteroid::COORDINATES.handle(game, payload),
        EventName::AsteroidHit => asteroid::HIT.handle(game, payload),
        EventName::AsteroidDestroy => asteroid::DESTROY.handle(game, payload),
        EventName::ProjectileCreate => projectile::CREATE.handle(game, payload),
        EventName::ProjectileCoordinates => projectile::COORDINATES.handle(game, payload),
        EventName::ProjectileDestroy => projectile::DESTROY.handle(game, payload),
        EventName::PickupDestroy => pickup::DESTROY.handle(game, payload),
        EventName::GameDrop => pickup::DROP.handle(game, payload),
        EventName::GameError => {
            report_error(payload);
            Ok(())
        }
        EventName::PlayerJoin => Err(ClientError::NotReceivable(event)),
    }
}

fn report_error(payload: Value) {
    match serde_json::from_value::<Envelope<Value>>(payload).map(Envelope::into_result) {
        Ok(Err(error)) => warn!("Server error: {:?} {}", error.code, error.message),
        Ok(Ok(_)) => debug!("Ignoring successful game:error envelope"),
        Err(err) => warn!("Unreadable game:error payload: {}", err),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{frame, player};
    use super::*;
    use crate::game::Tracked;
    use arena_shared::dto::DestroyDto;
    use arena_shared::{ErrorCode, ErrorDto};
    use serde_json::json;

    #[test]
    fn test_invalid_payload_leaves_state_untouched() {
        let mut game = ClientGame::headless();
        let frame = Frame {
            event: "asteroid:create".to_string(),
            payload: json!({"ok": true, "dto": {"id": "a-1", "x": 1.0, "y": 1.0, "health": 5.0, "maxHealth": -1.0}}),
        };

        let err = match game.apply(frame) {
            Err(ClientError::Validation(err)) => err,
            other => panic!("expected validation error, got {:?}", other),
        };
        assert!(err.path.starts_with("$.dto."));
        assert_eq!(game.tracked_count(Tracked::Asteroid), 0);
        assert!(game.entities().is_empty());
    }

    #[test]
    fn test_failure_envelope_is_logged_only() {
        let mut game = ClientGame::headless();
        game.apply(frame(EventName::PlayerProtagonist, &player("p-me", 0.0, 0.0, true)))
            .unwrap();
        let before = game.entities().len();

        let failure = Frame::failure(
            "player:hit",
            ErrorDto::new(ErrorCode::Validation, "damage must be finite"),
        );
        game.apply(failure).unwrap();
        game.apply(Frame::failure(
            "game:error",
            ErrorDto::new(ErrorCode::MalformedFrame, "expected value"),
        ))
        .unwrap();

        assert_eq!(game.entities().len(), before);
    }

    #[test]
    fn test_unknown_and_client_only_events() {
        let mut game = ClientGame::headless();
        let unknown = Frame {
            event: "player:teleport".to_string(),
            payload: json!({"ok": true, "dto": {}}),
        };
        assert!(matches!(game.apply(unknown), Err(ClientError::UnknownEvent(_))));

        let join = Frame {
            event: "player:join".to_string(),
            payload: json!({"ok": true, "dto": {"name": "Vega"}}),
        };
        assert!(matches!(
            game.apply(join),
            Err(ClientError::NotReceivable(EventName::PlayerJoin))
        ));
    }

    #[test]
    fn test_apply_text() {
        let mut game = ClientGame::headless();
        let text = frame(EventName::AsteroidDestroy, &DestroyDto { id: "a-2".into() })
            .to_text()
            .unwrap();
        game.apply_text(&text).unwrap();
        assert!(matches!(game.apply_text("{oops"), Err(ClientError::Malformed(_))));
    }
}

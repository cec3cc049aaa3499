//! Registration table from event names to listeners.

use crate::client_manager::ConnectionId;
use crate::game::GameState;
use crate::handlers::{asteroid, pickup, player, projectile};
use crate::listener::{ListenerError, Outcome};
use crate::outbox::{Outbox, Target};
use arena_shared::{ErrorCode, ErrorDto, EventName, Frame};
use log::warn;

/// Parses one text frame and routes it. Unparsable text is answered with a
/// `game:error` failure envelope.
pub fn route_text(
    game: &mut GameState,
    origin: ConnectionId,
    text: &str,
    outbox: &mut Outbox,
) -> Result<Outcome, ListenerError> {
    match Frame::from_text(text) {
        Ok(frame) => route(game, origin, frame, outbox),
        Err(err) => Ok(reject(
            outbox,
            origin,
            EventName::GameError.as_str(),
            ErrorDto::new(ErrorCode::MalformedFrame, err.to_string()),
        )),
    }
}

/// Routes a parsed frame to the listener registered for its event.
pub fn route(
    game: &mut GameState,
    origin: ConnectionId,
    frame: Frame,
    outbox: &mut Outbox,
) -> Result<Outcome, ListenerError> {
    let event = match frame.event_name() {
        Ok(event) => event,
        Err(err) => {
            return Ok(reject(
                outbox,
                origin,
                &frame.event,
                ErrorDto::new(ErrorCode::UnknownEvent, err.to_string()),
            ))
        }
    };

    if !event.accepted_from_client() {
        return Ok(not_accepted(outbox, origin, event));
    }
    if event != EventName::PlayerJoin && game.player(origin).is_none() {
        return Ok(reject(
            outbox,
            origin,
            event.as_str(),
            ErrorDto::new(ErrorCode::NotJoined, "join before sending player events"),
        ));
    }

    let payload = frame.payload;
    match event {
        EventName::PlayerJoin => player::JOIN.dispatch(game, origin, payload, outbox),
        EventName::PlayerCoordinates => player::COORDINATES.dispatch(game, origin, payload, outbox),
        EventName::PlayerHit => player::HIT.dispatch(game, origin, payload, outbox),
        EventName::PlayerPickup => pickup::COLLECT.dispatch(game, origin, payload, outbox),
        EventName::AsteroidHit => asteroid::HIT.dispatch(game, origin, payload, outbox),
        EventName::ProjectileCreate => projectile::CREATE.dispatch(game, origin, payload, outbox),
        EventName::ProjectileDestroy => projectile::DESTROY.dispatch(game, origin, payload, outbox),
        other => Ok(not_accepted(outbox, origin, other)),
    }
}

fn not_accepted(outbox: &mut Outbox, origin: ConnectionId, event: EventName) -> Outcome {
    reject(
        outbox,
        origin,
        event.as_str(),
        ErrorDto::new(ErrorCode::NotAccepted, format!("{} is sent by the server only", event)),
    )
}

fn reject(outbox: &mut Outbox, origin: ConnectionId, event: &str, error: ErrorDto) -> Outcome {
    warn!("Connection {} sent `{}`: {}", origin, event, error.message);
    let code = error.code;
    outbox.push(Target::Unicast(origin), Frame::failure(event, error));
    Outcome::Rejected(code)
}

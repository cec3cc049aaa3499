//! Player lifecycle: join, movement, hits, death and disconnect.

use crate::client_manager::ConnectionId;
use crate::game::GameState;
use crate::listener::{Delivery, Listener, ListenerError, Session};
use crate::outbox::{DomainEvent, Outbox, Target};
use arena_shared::dto::{
    JoinRequest, PlayerCoordinatesDto, PlayerDestroyDto, PlayerDto, PlayerHealthDto, PlayerHitDto,
    QuitDto,
};
use arena_shared::{EventName, ValidationError};
use log::{debug, error, info};

pub const JOIN: Listener<JoinRequest, PlayerDto> = Listener {
    event: EventName::PlayerJoin,
    reply: EventName::PlayerProtagonist,
    delivery: Delivery::Reply,
    handler: join,
};

pub const COORDINATES: Listener<PlayerCoordinatesDto, PlayerCoordinatesDto> = Listener {
    event: EventName::PlayerCoordinates,
    reply: EventName::PlayerCoordinates,
    delivery: Delivery::BroadcastOthers,
    handler: coordinates,
};

pub const HIT: Listener<PlayerHitDto, PlayerHealthDto> = Listener {
    event: EventName::PlayerHit,
    reply: EventName::PlayerHit,
    delivery: Delivery::BroadcastOthers,
    handler: hit,
};

/// Creates the requester's player and brings the joiner up to date with the
/// rest of the world.
fn join(session: &mut Session<'_>, request: JoinRequest) -> Result<Option<PlayerDto>, ListenerError> {
    let origin = session.origin;
    if session.game.player(origin).is_some() {
        debug!("Connection {} is already playing, ignoring join", origin);
        return Ok(None);
    }

    let (id, name) = {
        let player = session.game.add_player(origin, request.name, request.sprite_key);
        (player.id.clone(), player.name.clone())
    };
    let (Some(protagonist), Some(announcement)) = (
        session.game.player_dto(origin, true),
        session.game.player_dto(origin, false),
    ) else {
        return Ok(None);
    };

    let competitors: Vec<PlayerDto> = session
        .game
        .players()
        .filter(|(connection, _)| *connection != origin)
        .filter_map(|(connection, _)| session.game.player_dto(connection, false))
        .collect();
    let asteroids = session.game.asteroid_dtos();
    let pickups = session.game.pickup_dtos();

    session.unicast(origin, EventName::PlayerCompetitors, &competitors)?;
    session.broadcast_except(origin, EventName::PlayerJoined, &announcement)?;
    for asteroid in &asteroids {
        session.unicast(origin, EventName::AsteroidCreate, asteroid)?;
    }
    for pickup in &pickups {
        session.unicast(origin, EventName::GameDrop, pickup)?;
    }

    info!("Player {} ({}) joined on connection {}", id, name, origin);
    session.publish(DomainEvent::PlayerJoined { id, name });
    Ok(Some(protagonist))
}

/// Stores the reported position. The id is always taken from the
/// connection's own player, whatever the client sent.
fn coordinates(
    session: &mut Session<'_>,
    request: PlayerCoordinatesDto,
) -> Result<Option<PlayerCoordinatesDto>, ListenerError> {
    let Some(player) = session.game.player_mut(session.origin) else {
        return Ok(None);
    };
    player.position.x = request.x;
    player.position.y = request.y;
    player.angle = request.angle;

    Ok(Some(PlayerCoordinatesDto {
        id: player.id.clone(),
        x: request.x,
        y: request.y,
        angle: request.angle,
    }))
}

/// Applies damage reported by the shooter. A player cannot report a hit on
/// itself.
fn hit(session: &mut Session<'_>, request: PlayerHitDto) -> Result<Option<PlayerHealthDto>, ListenerError> {
    if session.game.player(session.origin).is_some_and(|player| player.id == request.id) {
        return Err(ListenerError::Refused(ValidationError::new(
            "$.dto.id",
            "a player cannot hit itself",
        )));
    }
    let Some(victim) = session.game.connection_of(&request.id) else {
        debug!("Hit on unknown player {}", request.id);
        return Ok(None);
    };
    let Some(health) = session.game.damage_player(&request.id, request.damage) else {
        return Ok(None);
    };

    if health.is_dead() {
        session.game.remove_player(victim);
        session.unicast(
            victim,
            EventName::PlayerDestroy,
            &PlayerDestroyDto {
                id: request.id.clone(),
                is_local: true,
            },
        )?;
        session.broadcast_except(
            victim,
            EventName::PlayerDestroy,
            &PlayerDestroyDto {
                id: request.id.clone(),
                is_local: false,
            },
        )?;

        let by = session.game.player(session.origin).map(|player| player.id.clone());
        info!("Player {} destroyed by {:?}", request.id, by);
        session.publish(DomainEvent::PlayerDied {
            id: request.id.clone(),
            by,
        });
    }

    Ok(Some(PlayerHealthDto {
        id: request.id,
        health: health.current(),
        max_health: health.max(),
    }))
}

/// Removes the player owned by a closed connection and tells everybody else.
/// Returns false when the connection never joined.
pub fn disconnect(game: &mut GameState, connection: ConnectionId, outbox: &mut Outbox) -> bool {
    let Some(player) = game.remove_player(connection) else {
        return false;
    };

    let quit = QuitDto {
        id: player.id.clone(),
    };
    if let Err(err) = outbox.emit(Target::BroadcastExcept(connection), EventName::PlayerQuit, &quit) {
        error!("Failed to announce quit of {}: {}", player.id, err);
    }
    outbox.publish(DomainEvent::PlayerLeft { id: player.id });
    true
}

use crate::listener::{Delivery, Listener, ListenerError, Session};
use crate::outbox::DomainEvent;
use arena_shared::dto::{AsteroidHealthDto, AsteroidHitDto, DestroyDto};
use arena_shared::EventName;
use log::{debug, info};

pub const HIT: Listener<AsteroidHitDto, AsteroidHealthDto> = Listener {
    event: EventName::AsteroidHit,
    reply: EventName::AsteroidHit,
    delivery: Delivery::BroadcastOthers,
    handler: hit,
};

/// Applies damage reported by a client. A kill removes the asteroid, credits
/// the shooter and may drop a pickup where it broke apart.
fn hit(session: &mut Session<'_>, request: AsteroidHitDto) -> Result<Option<AsteroidHealthDto>, ListenerError> {
    let Some(health) = session
        .game
        .damage_asteroid(&request.asteroid_id, request.damage)
    else {
        debug!("Hit on unknown asteroid {}", request.asteroid_id);
        return Ok(None);
    };

    if health.is_dead() {
        if let Some(asteroid) = session.game.remove_asteroid(&request.asteroid_id) {
            session.broadcast(
                EventName::AsteroidDestroy,
                &DestroyDto {
                    id: asteroid.id.clone(),
                },
            )?;

            let origin = session.origin;
            let points = session.game.config().asteroid_points;
            if session.game.award(origin, points) {
                if let Some(stats) = session.game.player_stats(origin) {
                    session.unicast(origin, EventName::PlayerStats, &stats)?;
                }
            }

            if let Some(drop) = session.game.roll_drop(asteroid.position) {
                session.broadcast(EventName::GameDrop, &drop)?;
                session.publish(DomainEvent::PickupDropped { id: drop.id });
            }

            let by = session.game.player(origin).map(|player| player.id.clone());
            info!("Asteroid {} destroyed by {:?}", asteroid.id, by);
            session.publish(DomainEvent::AsteroidDestroyed { id: asteroid.id, by });
        }
    }

    Ok(Some(AsteroidHealthDto {
        asteroid_id: request.asteroid_id,
        health: health.current(),
        max_health: health.max(),
    }))
}

use crate::listener::{Delivery, Listener, ListenerError, Session};
use arena_shared::dto::{DestroyDto, FireRequest, ProjectileDto};
use arena_shared::EventName;
use log::debug;

pub const CREATE: Listener<FireRequest, ProjectileDto> = Listener {
    event: EventName::ProjectileCreate,
    reply: EventName::ProjectileCreate,
    delivery: Delivery::Broadcast,
    handler: create,
};

pub const DESTROY: Listener<DestroyDto, DestroyDto> = Listener {
    event: EventName::ProjectileDestroy,
    reply: EventName::ProjectileDestroy,
    delivery: Delivery::Broadcast,
    handler: destroy,
};

/// Spends one round of the requested kind from the authoritative weapon.
/// Speed and damage come from the kind table, never from the client.
fn create(session: &mut Session<'_>, request: FireRequest) -> Result<Option<ProjectileDto>, ListenerError> {
    Ok(session.game.fire(session.origin, &request))
}

fn destroy(session: &mut Session<'_>, request: DestroyDto) -> Result<Option<DestroyDto>, ListenerError> {
    let Some(owner) = session.game.player(session.origin).map(|player| player.id.clone()) else {
        return Ok(None);
    };
    if !session.game.retire_projectile(&request.id, &owner) {
        debug!("Player {} cannot retire projectile {}", owner, request.id);
        return Ok(None);
    }
    Ok(Some(request))
}

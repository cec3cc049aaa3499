use super::ClientListener;
use crate::ecs::{Pickup, Transform};
use crate::game::{ClientError, ClientGame, Tracked};
use arena_shared::dto::{DestroyDto, PickupCollectedDto, PickupDto, PickupKind};
use arena_shared::EventName;
use log::debug;

pub const DROP: ClientListener<PickupDto> = ClientListener {
    event: EventName::GameDrop,
    apply: drop_pickup,
};

pub const COLLECTED: ClientListener<PickupCollectedDto> = ClientListener {
    event: EventName::PlayerPickup,
    apply: collected,
};

pub const DESTROY: ClientListener<DestroyDto> = ClientListener {
    event: EventName::PickupDestroy,
    apply: destroy,
};

fn sprite_key(kind: PickupKind) -> &'static str {
    match kind {
        PickupKind::Ammo => "pickup-ammo",
        PickupKind::Health => "pickup-health",
        PickupKind::Score => "pickup-score",
    }
}

fn drop_pickup(game: &mut ClientGame, dto: PickupDto) -> Result<(), ClientError> {
    let entity = game.spawn(
        Tracked::Pickup,
        &dto.id,
        sprite_key(dto.kind),
        Transform::new(dto.x, dto.y, 0.0),
    )?;
    game.entities.insert(
        entity,
        Pickup {
            kind: dto.kind,
            value: dto.amount.or(dto.points).unwrap_or(0),
            ammo_kind: dto.ammo_kind,
        },
    )?;
    Ok(())
}

/// Someone else got there first, or the server confirms our own collection.
fn collected(game: &mut ClientGame, dto: PickupCollectedDto) -> Result<(), ClientError> {
    if game.forget(Tracked::Pickup, &dto.id) {
        debug!("Pickup {} collected by {}", dto.id, dto.player_id);
    }
    Ok(())
}

fn destroy(game: &mut ClientGame, dto: DestroyDto) -> Result<(), ClientError> {
    game.forget(Tracked::Pickup, &dto.id);
    Ok(())
}

use crate::listener::{Delivery, Listener, ListenerError, Session};
use crate::outbox::DomainEvent;
use arena_shared::dto::{DestroyDto, PickupCollectedDto, PlayerPickupDto};
use arena_shared::EventName;
use log::debug;

pub const COLLECT: Listener<PlayerPickupDto, PickupCollectedDto> = Listener {
    event: EventName::PlayerPickup,
    reply: EventName::PlayerPickup,
    delivery: Delivery::BroadcastOthers,
    handler: collect,
};

/// First request for a live pickup wins. Everyone else is told who took it,
/// the collector gets its refreshed stats and every client gets the destroy.
fn collect(
    session: &mut Session<'_>,
    request: PlayerPickupDto,
) -> Result<Option<PickupCollectedDto>, ListenerError> {
    let origin = session.origin;
    let Some(player_id) = session.game.player(origin).map(|player| player.id.clone()) else {
        return Ok(None);
    };
    let Some(pickup) = session.game.take_pickup(&request.pickup_id) else {
        debug!("Pickup {} already gone for {}", request.pickup_id, player_id);
        return Ok(None);
    };

    session.game.apply_pickup(origin, &pickup);
    if let Some(stats) = session.game.player_stats(origin) {
        session.unicast(origin, EventName::PlayerStats, &stats)?;
    }
    session.broadcast(
        EventName::PickupDestroy,
        &DestroyDto {
            id: pickup.id.clone(),
        },
    )?;
    session.publish(DomainEvent::PickupCollected {
        id: pickup.id.clone(),
        player_id: player_id.clone(),
    });

    Ok(Some(PickupCollectedDto {
        id: pickup.id,
        player_id,
    }))
}

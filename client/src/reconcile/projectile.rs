use super::ClientListener;
use crate::ecs::{Projectile, Transform};
use crate::game::{ClientError, ClientGame, Tracked};
use arena_shared::dto::{DestroyDto, ProjectileCoordinatesDto, ProjectileDto};
use arena_shared::EventName;

pub const CREATE: ClientListener<ProjectileDto> = ClientListener {
    event: EventName::ProjectileCreate,
    apply: create,
};

pub const COORDINATES: ClientListener<ProjectileCoordinatesDto> = ClientListener {
    event: EventName::ProjectileCoordinates,
    apply: coordinates,
};

pub const DESTROY: ClientListener<DestroyDto> = ClientListener {
    event: EventName::ProjectileDestroy,
    apply: destroy,
};

/// Projectiles only move when the server sends their coordinates.
fn create(game: &mut ClientGame, dto: ProjectileDto) -> Result<(), ClientError> {
    let key = format!("projectile-{}", dto.projectile_type.name());
    let rotation = dto.dy.atan2(dto.dx);
    let entity = game.spawn(
        Tracked::Projectile,
        &dto.id,
        &key,
        Transform::new(dto.x, dto.y, rotation),
    )?;
    game.entities.insert(
        entity,
        Projectile {
            owner_id: dto.owner_id,
            kind: dto.projectile_type,
            damage: dto.damage,
        },
    )?;
    Ok(())
}

fn coordinates(game: &mut ClientGame, dto: ProjectileCoordinatesDto) -> Result<(), ClientError> {
    let Some(entity) = game.tracked(Tracked::Projectile, &dto.id) else {
        return Ok(());
    };
    if let Some(transform) = game.entities.component_mut::<Transform>(entity) {
        transform.position.x = dto.x;
        transform.position.y = dto.y;
    }
    Ok(())
}

fn destroy(game: &mut ClientGame, dto: DestroyDto) -> Result<(), ClientError> {
    game.forget(Tracked::Projectile, &dto.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Velocity;
    use crate::input::ControlInput;
    use crate::reconcile::testing::frame;
    use arena_shared::{AmmoKind, Vector2};
    use assert_approx_eq::assert_approx_eq;

    fn rocket(id: &str) -> ProjectileDto {
        ProjectileDto {
            id: id.to_string(),
            owner_id: "p-1".into(),
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 1.0,
            speed: 400.0,
            projectile_type: AmmoKind::Rocket,
            damage: 40.0,
        }
    }

    #[test]
    fn test_create_sets_heading_without_local_motion() {
        let mut game = ClientGame::headless();
        game.apply(frame(EventName::ProjectileCreate, &rocket("pr-1"))).unwrap();

        let entity = game.tracked(Tracked::Projectile, "pr-1").unwrap();
        let transform = game.entities().component::<Transform>(entity).unwrap();
        assert_approx_eq!(transform.rotation, std::f32::consts::FRAC_PI_2);
        assert!(game.entities().component::<Velocity>(entity).is_none());
        let projectile = game.entities().component::<Projectile>(entity).unwrap();
        assert_eq!(projectile.owner_id, "p-1");
        assert_eq!(projectile.kind, AmmoKind::Rocket);

        game.tick(0.5, ControlInput::default()).unwrap();
        assert_eq!(game.position(Tracked::Projectile, "pr-1"), Some(Vector2::ZERO));
    }

    #[test]
    fn test_coordinates_then_destroy() {
        let mut game = ClientGame::headless();
        game.apply(frame(EventName::ProjectileCreate, &rocket("pr-1"))).unwrap();
        game.apply(frame(
            EventName::ProjectileCoordinates,
            &ProjectileCoordinatesDto {
                id: "pr-1".into(),
                x: 3.0,
                y: 4.0,
            },
        ))
        .unwrap();
        assert_eq!(game.position(Tracked::Projectile, "pr-1"), Some(Vector2::new(3.0, 4.0)));

        let destroy = DestroyDto { id: "pr-1".into() };
        game.apply(frame(EventName::ProjectileDestroy, &destroy)).unwrap();
        game.apply(frame(EventName::ProjectileDestroy, &destroy)).unwrap();
        assert_eq!(game.tracked_count(Tracked::Projectile), 0);
        assert!(game.entities().is_empty());
    }
}

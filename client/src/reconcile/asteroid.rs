use super::ClientListener;
use crate::ecs::{Health, Transform};
use crate::game::{ClientError, ClientGame, Tracked};
use arena_shared::dto::{AsteroidCoordinatesDto, AsteroidDto, AsteroidHealthDto, DestroyDto};
use arena_shared::EventName;

pub const CREATE: ClientListener<AsteroidDto> = ClientListener {
    event: EventName::AsteroidCreate,
    apply: create,
};

pub const COORDINATES: ClientListener<AsteroidCoordinatesDto> = ClientListener {
    event: EventName::AsteroidCoordinates,
    apply: coordinates,
};

pub const HIT: ClientListener<AsteroidHealthDto> = ClientListener {
    event: EventName::AsteroidHit,
    apply: hit,
};

pub const DESTROY: ClientListener<DestroyDto> = ClientListener {
    event: EventName::AsteroidDestroy,
    apply: destroy,
};

const SPRITE_KEY: &str = "asteroid";

fn create(game: &mut ClientGame, dto: AsteroidDto) -> Result<(), ClientError> {
    let entity = game.spawn(
        Tracked::Asteroid,
        &dto.id,
        SPRITE_KEY,
        Transform::new(dto.x, dto.y, 0.0),
    )?;
    game.entities
        .insert(entity, Health::new(dto.health, dto.max_health))?;
    Ok(())
}

fn coordinates(game: &mut ClientGame, dto: AsteroidCoordinatesDto) -> Result<(), ClientError> {
    let Some(entity) = game.tracked(Tracked::Asteroid, &dto.id) else {
        return Ok(());
    };
    if let Some(transform) = game.entities.component_mut::<Transform>(entity) {
        transform.position.x = dto.x;
        transform.position.y = dto.y;
    }
    Ok(())
}

/// The destroy that follows a kill is then a no-op.
fn hit(game: &mut ClientGame, dto: AsteroidHealthDto) -> Result<(), ClientError> {
    let Some(entity) = game.tracked(Tracked::Asteroid, &dto.asteroid_id) else {
        return Ok(());
    };
    let dead = match game.entities.component_mut::<Health>(entity) {
        Some(health) => {
            health.assign(dto.health, dto.max_health);
            health.is_dead()
        }
        None => dto.health <= 0.0,
    };
    if dead {
        game.forget(Tracked::Asteroid, &dto.asteroid_id);
    }
    Ok(())
}

fn destroy(game: &mut ClientGame, dto: DestroyDto) -> Result<(), ClientError> {
    game.forget(Tracked::Asteroid, &dto.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::frame;
    use arena_shared::Vector2;

    fn asteroid(id: &str, health: f32) -> AsteroidDto {
        AsteroidDto {
            id: id.to_string(),
            x: 10.0,
            y: 20.0,
            health,
            max_health: 50.0,
        }
    }

    fn with_asteroids(ids: &[&str]) -> ClientGame {
        let mut game = ClientGame::headless();
        for id in ids {
            game.apply(frame(EventName::AsteroidCreate, &asteroid(id, 50.0)))
                .unwrap();
        }
        game
    }

    #[test]
    fn test_create_tracks_health() {
        let game = with_asteroids(&["a-1"]);
        assert_eq!(game.health(Tracked::Asteroid, "a-1"), Some(50.0));
        assert_eq!(game.position(Tracked::Asteroid, "a-1"), Some(Vector2::new(10.0, 20.0)));
    }

    #[test]
    fn test_coordinates_are_idempotent() {
        let mut game = with_asteroids(&["a-1"]);
        let moved = AsteroidCoordinatesDto {
            id: "a-1".into(),
            x: 100.0,
            y: 200.0,
        };

        game.apply(frame(EventName::AsteroidCoordinates, &moved)).unwrap();
        game.apply(frame(EventName::AsteroidCoordinates, &moved)).unwrap();

        assert_eq!(game.tracked_count(Tracked::Asteroid), 1);
        assert_eq!(game.entities().len(), 1);
        assert_eq!(game.position(Tracked::Asteroid, "a-1"), Some(Vector2::new(100.0, 200.0)));
    }

    #[test]
    fn test_coordinates_for_unknown_id_create_nothing() {
        let mut game = ClientGame::headless();
        game.apply(frame(
            EventName::AsteroidCoordinates,
            &AsteroidCoordinatesDto {
                id: "a-ghost".into(),
                x: 1.0,
                y: 1.0,
            },
        ))
        .unwrap();
        assert!(game.entities().is_empty());
    }

    #[test]
    fn test_hit_to_zero_removes_asteroid() {
        let mut game = with_asteroids(&["a-1"]);
        let mut health = AsteroidHealthDto {
            asteroid_id: "a-1".into(),
            health: 25.0,
            max_health: 50.0,
        };
        game.apply(frame(EventName::AsteroidHit, &health)).unwrap();
        assert_eq!(game.health(Tracked::Asteroid, "a-1"), Some(25.0));

        health.health = 0.0;
        game.apply(frame(EventName::AsteroidHit, &health)).unwrap();
        game.apply(frame(EventName::AsteroidDestroy, &DestroyDto { id: "a-1".into() }))
            .unwrap();
        assert!(game.tracked(Tracked::Asteroid, "a-1").is_none());
        assert!(game.entities().is_empty());
    }

    #[test]
    fn test_destroy_unknown_id_is_noop() {
        let mut game = with_asteroids(&["a-1", "a-2"]);
        game.apply(frame(EventName::AsteroidDestroy, &DestroyDto { id: "a-9".into() }))
            .unwrap();
        assert_eq!(game.tracked_ids(Tracked::Asteroid), vec!["a-1", "a-2"]);
    }
}

use super::ClientListener;
use crate::ecs::{Control, Health, Stats, Transform, Velocity, Weapon};
use crate::game::{ClientError, ClientGame, Status, Tracked};
use arena_shared::dto::{
    PlayerCoordinatesDto, PlayerDestroyDto, PlayerDto, PlayerHealthDto, PlayerStatsDto, QuitDto,
};
use arena_shared::{EventName, DEFAULT_MAX_HEALTH};
use log::{debug, info};

pub const PROTAGONIST: ClientListener<PlayerDto> = ClientListener {
    event: EventName::PlayerProtagonist,
    apply: protagonist,
};

pub const COMPETITORS: ClientListener<Vec<PlayerDto>> = ClientListener {
    event: EventName::PlayerCompetitors,
    apply: competitors,
};

pub const JOINED: ClientListener<PlayerDto> = ClientListener {
    event: EventName::PlayerJoined,
    apply: joined,
};

pub const COORDINATES: ClientListener<PlayerCoordinatesDto> = ClientListener {
    event: EventName::PlayerCoordinates,
    apply: coordinates,
};

pub const HIT: ClientListener<PlayerHealthDto> = ClientListener {
    event: EventName::PlayerHit,
    apply: hit,
};

pub const STATS: ClientListener<PlayerStatsDto> = ClientListener {
    event: EventName::PlayerStats,
    apply: stats,
};

pub const DESTROY: ClientListener<PlayerDestroyDto> = ClientListener {
    event: EventName::PlayerDestroy,
    apply: destroy,
};

pub const QUIT: ClientListener<QuitDto> = ClientListener {
    event: EventName::PlayerQuit,
    apply: quit,
};

fn spawn_player(game: &mut ClientGame, dto: &PlayerDto) -> Result<(), ClientError> {
    let transform = Transform::new(dto.x, dto.y, dto.angle.unwrap_or(0.0));
    let entity = game.spawn(Tracked::Player, &dto.id, &dto.sprite_key, transform)?;

    let max = dto.max_health.unwrap_or(DEFAULT_MAX_HEALTH);
    game.entities
        .insert(entity, Health::new(dto.health.unwrap_or(max), max))?;
    game.entities.insert(
        entity,
        Stats {
            name: dto.name.clone(),
            score: 0,
            level: dto.level.unwrap_or(0),
        },
    )?;

    if game.is_local(&dto.id) {
        game.entities.insert(entity, Velocity::default())?;
        game.entities.insert(entity, Weapon::default())?;
        game.entities.insert(entity, Control::default())?;
    }
    Ok(())
}

/// Our own ship. Replaces whatever local ship existed before.
fn protagonist(game: &mut ClientGame, dto: PlayerDto) -> Result<(), ClientError> {
    if let Some(previous) = game.local_id.take() {
        if previous != dto.id {
            game.forget(Tracked::Player, &previous);
        }
    }
    game.local_id = Some(dto.id.clone());
    spawn_player(game, &dto)?;
    game.status = Status::Alive;
    game.refresh_hud();
    info!("Playing as {} ({})", dto.name, dto.id);
    Ok(())
}

fn competitors(game: &mut ClientGame, roster: Vec<PlayerDto>) -> Result<(), ClientError> {
    for dto in roster {
        joined(game, dto)?;
    }
    Ok(())
}

fn joined(game: &mut ClientGame, dto: PlayerDto) -> Result<(), ClientError> {
    if game.is_local(&dto.id) {
        debug!("Ignoring remote copy of the local player {}", dto.id);
        return Ok(());
    }
    spawn_player(game, &dto)
}

/// Remote ships follow the server; the local ship follows local input.
fn coordinates(game: &mut ClientGame, dto: PlayerCoordinatesDto) -> Result<(), ClientError> {
    if game.is_local(&dto.id) {
        return Ok(());
    }
    let Some(entity) = game.tracked(Tracked::Player, &dto.id) else {
        return Ok(());
    };
    if let Some(transform) = game.entities.component_mut::<Transform>(entity) {
        transform.position.x = dto.x;
        transform.position.y = dto.y;
        transform.rotation = dto.angle;
    }
    Ok(())
}

/// Writes the authoritative health, then routes a death to the local death
/// path or to remote cleanup depending on whose ship it was.
fn hit(game: &mut ClientGame, dto: PlayerHealthDto) -> Result<(), ClientError> {
    let Some(entity) = game.tracked(Tracked::Player, &dto.id) else {
        return Ok(());
    };
    let dead = match game.entities.component_mut::<Health>(entity) {
        Some(health) => {
            health.assign(dto.health, dto.max_health);
            health.is_dead()
        }
        None => dto.health <= 0.0,
    };

    let local = game.is_local(&dto.id);
    if local {
        game.hud.health(dto.health.max(0.0), dto.max_health);
    }
    if dead {
        if local {
            game.local_death(&dto.id);
        } else {
            game.forget(Tracked::Player, &dto.id);
        }
    }
    Ok(())
}

/// Authoritative totals for the local player.
fn stats(game: &mut ClientGame, dto: PlayerStatsDto) -> Result<(), ClientError> {
    if !game.is_local(&dto.id) {
        debug!("Ignoring stats for {}", dto.id);
        return Ok(());
    }
    let Some(entity) = game.local_entity() else {
        return Ok(());
    };

    if let Some(health) = game.entities.component_mut::<Health>(entity) {
        health.assign(dto.health, dto.max_health);
    }
    if let Some(stats) = game.entities.component_mut::<Stats>(entity) {
        stats.score = dto.score;
        stats.level = dto.level;
    }
    if let Some(weapon) = game.entities.component_mut::<Weapon>(entity) {
        for (kind, count) in &dto.ammo {
            weapon.state.set_ammo(*kind, *count);
        }
    }
    game.refresh_hud();
    Ok(())
}

fn destroy(game: &mut ClientGame, dto: PlayerDestroyDto) -> Result<(), ClientError> {
    if game.is_local(&dto.id) {
        game.local_death(&dto.id);
    } else {
        game.forget(Tracked::Player, &dto.id);
    }
    Ok(())
}

fn quit(game: &mut ClientGame, dto: QuitDto) -> Result<(), ClientError> {
    if game.is_local(&dto.id) {
        return Ok(());
    }
    if game.forget(Tracked::Player, &dto.id) {
        info!("Player {} left", dto.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::{frame, player};
    use crate::rendering::{HeadlessRenderer, LogHud};
    use crate::game::LogDeath;
    use arena_shared::AmmoKind;
    use std::collections::BTreeMap;

    fn with_local() -> ClientGame {
        let mut game = ClientGame::headless();
        game.apply(frame(EventName::PlayerProtagonist, &player("p-me", 100.0, 100.0, true)))
            .unwrap();
        game
    }

    fn health_dto(id: &str, health: f32) -> PlayerHealthDto {
        PlayerHealthDto {
            id: id.to_string(),
            health,
            max_health: 100.0,
        }
    }

    #[test]
    fn test_protagonist_creates_controlled_local_ship() {
        let game = with_local();
        assert_eq!(game.status(), Status::Alive);
        assert_eq!(game.local_id(), Some("p-me"));

        let entity = game.local_entity().unwrap();
        assert!(game.entities().component::<Control>(entity).is_some());
        assert!(game.entities().component::<Weapon>(entity).is_some());
        assert_eq!(game.health(Tracked::Player, "p-me"), Some(100.0));
    }

    #[test]
    fn test_competitors_create_each_remote_once() {
        let mut game = with_local();
        let roster = vec![
            player("p-2", 1.0, 1.0, false),
            player("p-3", 2.0, 2.0, false),
            player("p-me", 3.0, 3.0, false),
        ];
        game.apply(frame(EventName::PlayerCompetitors, &roster)).unwrap();
        game.apply(frame(EventName::PlayerCompetitors, &roster)).unwrap();

        assert_eq!(game.tracked_count(Tracked::Player), 3);
        assert_eq!(game.position(Tracked::Player, "p-me"), Some(arena_shared::Vector2::new(100.0, 100.0)));
        let remote = game.tracked(Tracked::Player, "p-2").unwrap();
        assert!(game.entities().component::<Control>(remote).is_none());
    }

    #[test]
    fn test_duplicate_join_tears_down_previous_visual() {
        let renderer = HeadlessRenderer::new();
        let stats = renderer.stats();
        let mut game = ClientGame::new(Box::new(renderer), Box::new(LogHud::new()), Box::new(LogDeath));

        game.apply(frame(EventName::PlayerJoined, &player("p-2", 1.0, 1.0, false)))
            .unwrap();
        let first = game.tracked(Tracked::Player, "p-2").unwrap();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 5.0, 5.0, false)))
            .unwrap();
        let second = game.tracked(Tracked::Player, "p-2").unwrap();

        assert_ne!(first, second);
        assert!(!game.entities().contains(first));
        assert_eq!(stats.spawned(), 2);
        assert_eq!(stats.live(), 1);
    }

    #[test]
    fn test_coordinates_ignore_local_and_unknown() {
        let mut game = with_local();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 1.0, 1.0, false)))
            .unwrap();

        for id in ["p-me", "p-2", "p-ghost"] {
            game.apply(frame(
                EventName::PlayerCoordinates,
                &PlayerCoordinatesDto {
                    id: id.to_string(),
                    x: 400.0,
                    y: 300.0,
                    angle: 1.0,
                },
            ))
            .unwrap();
        }

        assert_eq!(game.position(Tracked::Player, "p-me").map(|p| p.x), Some(100.0));
        assert_eq!(game.position(Tracked::Player, "p-2").map(|p| p.x), Some(400.0));
        assert!(game.tracked(Tracked::Player, "p-ghost").is_none());
    }

    #[test]
    fn test_hit_on_remote_updates_then_destroys() {
        let mut game = with_local();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 1.0, 1.0, false)))
            .unwrap();

        game.apply(frame(EventName::PlayerHit, &health_dto("p-2", 70.0))).unwrap();
        assert_eq!(game.health(Tracked::Player, "p-2"), Some(70.0));

        game.apply(frame(EventName::PlayerHit, &health_dto("p-2", 0.0))).unwrap();
        assert!(game.tracked(Tracked::Player, "p-2").is_none());
        assert_eq!(game.status(), Status::Alive);
        assert!(game.local_entity().is_some());
    }

    #[test]
    fn test_hit_on_local_routes_to_death() {
        let mut game = with_local();
        game.apply(frame(EventName::PlayerHit, &health_dto("p-me", 70.0))).unwrap();
        assert_eq!(game.health(Tracked::Player, "p-me"), Some(70.0));
        assert_eq!(game.status(), Status::Alive);

        game.apply(frame(EventName::PlayerHit, &health_dto("p-me", 0.0))).unwrap();
        assert_eq!(game.status(), Status::Dead);
        assert!(game.local_entity().is_none());

        game.apply(frame(
            EventName::PlayerDestroy,
            &PlayerDestroyDto {
                id: "p-me".into(),
                is_local: true,
            },
        ))
        .unwrap();
        assert_eq!(game.deaths(), 1);
    }

    #[test]
    fn test_destroy_remote_is_idempotent() {
        let mut game = with_local();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 1.0, 1.0, false)))
            .unwrap();
        let destroy = PlayerDestroyDto {
            id: "p-2".into(),
            is_local: false,
        };

        game.apply(frame(EventName::PlayerDestroy, &destroy)).unwrap();
        game.apply(frame(EventName::PlayerDestroy, &destroy)).unwrap();
        assert!(game.tracked(Tracked::Player, "p-2").is_none());
        assert_eq!(game.status(), Status::Alive);
    }

    #[test]
    fn test_stats_update_local_components() {
        let mut game = with_local();
        let mut ammo = BTreeMap::new();
        ammo.insert(AmmoKind::Bullet, 80);
        ammo.insert(AmmoKind::Rocket, 10);
        ammo.insert(AmmoKind::Mine, 0);

        game.apply(frame(
            EventName::PlayerStats,
            &PlayerStatsDto {
                id: "p-me".into(),
                health: 90.0,
                max_health: 100.0,
                score: 125,
                level: 1,
                ammo,
            },
        ))
        .unwrap();

        let entity = game.local_entity().unwrap();
        let stats = game.entities().component::<Stats>(entity).unwrap();
        assert_eq!((stats.score, stats.level), (125, 1));
        let weapon = game.entities().component::<Weapon>(entity).unwrap();
        assert_eq!(weapon.state.ammo(AmmoKind::Bullet), 80);
        assert_eq!(weapon.state.ammo(AmmoKind::Mine), 0);
        assert_eq!(game.health(Tracked::Player, "p-me"), Some(90.0));
    }

    #[test]
    fn test_quit_removes_remote_only() {
        let mut game = with_local();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 1.0, 1.0, false)))
            .unwrap();

        game.apply(frame(EventName::PlayerQuit, &QuitDto { id: "p-2".into() })).unwrap();
        game.apply(frame(EventName::PlayerQuit, &QuitDto { id: "p-me".into() })).unwrap();
        game.apply(frame(EventName::PlayerQuit, &QuitDto { id: "p-9".into() })).unwrap();

        assert!(game.tracked(Tracked::Player, "p-2").is_none());
        assert!(game.local_entity().is_some());
    }

    #[test]
    fn test_new_protagonist_after_death() {
        let mut game = with_local();
        game.local_death("p-me");
        game.apply(frame(EventName::PlayerProtagonist, &player("p-again", 5.0, 5.0, true)))
            .unwrap();

        assert_eq!(game.status(), Status::Alive);
        assert_eq!(game.local_id(), Some("p-again"));
        assert_eq!(game.tracked_count(Tracked::Player), 1);
        assert_eq!(game.controlled().len(), 1);
    }
}

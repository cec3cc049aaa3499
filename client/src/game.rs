//! Client-side mirror of the authoritative world.
//!
//! Network ids map onto local [`EntityId`]s through one lookup table per
//! domain. Reconciliation listeners are the only code that creates or destroys
//! mirrored entities; local systems only drive the local ship.

use crate::ecs::{
    ComponentKind, Control, EcsError, EntityId, EntityManager, Health, NetworkId, Projectile,
    Sprite, Stats, Transform, Weapon,
};
use crate::input::ControlInput;
use crate::reconcile;
use crate::rendering::{HeadlessRenderer, Hud, LogHud, Renderer};
use crate::systems::{MovementSystem, RenderSyncSystem, WeaponSystem};
use arena_shared::dto::{
    AsteroidHitDto, DestroyDto, FireRequest, JoinRequest, PlayerCoordinatesDto, PlayerHitDto,
    PlayerPickupDto,
};
use arena_shared::geometry::circles_overlap;
use arena_shared::{
    Bounds, EventName, Frame, Schema, UnknownEventError, ValidationError, Vector2, ASTEROID_RADIUS,
    PICKUP_RADIUS, PLAYER_RADIUS, PROJECTILE_RADIUS,
};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid payload: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnknownEvent(#[from] UnknownEventError),
    #[error("`{0}` is never sent by the server")]
    NotReceivable(EventName),
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Ecs(#[from] EcsError),
    #[error("websocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Where the local player is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No protagonist received yet.
    #[default]
    Joining,
    Alive,
    Dead,
}

/// Domain of a mirrored network id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tracked {
    Player,
    Asteroid,
    Projectile,
    Pickup,
}

/// Receives the local player's death. Invoked once per life.
pub trait DeathHandler: Send {
    fn on_local_death(&mut self, id: &str);
}

#[derive(Debug, Default)]
pub struct LogDeath;

impl DeathHandler for LogDeath {
    fn on_local_death(&mut self, id: &str) {
        info!("Local player {} was destroyed", id);
    }
}

pub struct ClientGame {
    pub(crate) entities: EntityManager,
    players: BTreeMap<String, EntityId>,
    asteroids: BTreeMap<String, EntityId>,
    projectiles: BTreeMap<String, EntityId>,
    pickups: BTreeMap<String, EntityId>,
    pub(crate) local_id: Option<String>,
    pub(crate) status: Status,
    renderer: Box<dyn Renderer>,
    pub(crate) hud: Box<dyn Hud>,
    death: Box<dyn DeathHandler>,
    outbound: Vec<Frame>,
    deaths: u32,
}

impl ClientGame {
    pub fn new(renderer: Box<dyn Renderer>, hud: Box<dyn Hud>, death: Box<dyn DeathHandler>) -> Self {
        let mut entities = EntityManager::new();
        entities.add_system(Box::new(MovementSystem::new(Bounds::default())));
        entities.add_system(Box::new(WeaponSystem));
        entities.add_system(Box::new(RenderSyncSystem));

        Self {
            entities,
            players: BTreeMap::new(),
            asteroids: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            pickups: BTreeMap::new(),
            local_id: None,
            status: Status::Joining,
            renderer,
            hud,
            death,
            outbound: Vec::new(),
            deaths: 0,
        }
    }

    /// Game with a headless renderer, a logging HUD and a logging death handler.
    pub fn headless() -> Self {
        Self::new(
            Box::new(HeadlessRenderer::new()),
            Box::new(LogHud::new()),
            Box::new(LogDeath),
        )
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    fn registry(&self, kind: Tracked) -> &BTreeMap<String, EntityId> {
        match kind {
            Tracked::Player => &self.players,
            Tracked::Asteroid => &self.asteroids,
            Tracked::Projectile => &self.projectiles,
            Tracked::Pickup => &self.pickups,
        }
    }

    fn registry_mut(&mut self, kind: Tracked) -> &mut BTreeMap<String, EntityId> {
        match kind {
            Tracked::Player => &mut self.players,
            Tracked::Asteroid => &mut self.asteroids,
            Tracked::Projectile => &mut self.projectiles,
            Tracked::Pickup => &mut self.pickups,
        }
    }

    /// Local entity mirroring the network id, if one exists.
    pub fn tracked(&self, kind: Tracked, id: &str) -> Option<EntityId> {
        self.registry(kind).get(id).copied()
    }

    pub fn tracked_count(&self, kind: Tracked) -> usize {
        self.registry(kind).len()
    }

    pub fn tracked_ids(&self, kind: Tracked) -> Vec<String> {
        self.registry(kind).keys().cloned().collect()
    }

    pub fn position(&self, kind: Tracked, id: &str) -> Option<Vector2> {
        let entity = self.tracked(kind, id)?;
        self.entities.component::<Transform>(entity).map(|t| t.position)
    }

    pub fn health(&self, kind: Tracked, id: &str) -> Option<f32> {
        let entity = self.tracked(kind, id)?;
        self.entities.component::<Health>(entity).map(|h| h.current())
    }

    pub fn local_entity(&self) -> Option<EntityId> {
        let id = self.local_id.as_deref()?;
        self.tracked(Tracked::Player, id)
    }

    pub fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }

    /// Validates and applies one server frame.
    pub fn apply(&mut self, frame: Frame) -> Result<(), ClientError> {
        reconcile::dispatch(self, frame)
    }

    pub fn apply_text(&mut self, text: &str) -> Result<(), ClientError> {
        self.apply(Frame::from_text(text)?)
    }

    /// Builds a fresh entity for a network id. An entity already tracked under
    /// that id is torn down first.
    pub(crate) fn spawn(
        &mut self,
        kind: Tracked,
        id: &str,
        key: &str,
        transform: Transform,
    ) -> Result<EntityId, ClientError> {
        if self.forget(kind, id) {
            debug!("Recreating {:?} {}", kind, id);
        }

        let entity = self.entities.create();
        let visual = self.renderer.spawn(
            key,
            transform.position.x,
            transform.position.y,
            transform.rotation,
        );
        self.entities.insert(entity, transform)?;
        self.entities.insert(entity, Sprite::new(key, visual))?;
        self.entities.insert(
            entity,
            NetworkId {
                id: id.to_string(),
                is_local: kind == Tracked::Player && self.is_local(id),
            },
        )?;
        self.registry_mut(kind).insert(id.to_string(), entity);
        Ok(entity)
    }

    /// Destroys the entity mirroring `id` and stops tracking it.
    /// Returns false when nothing was tracked.
    pub(crate) fn forget(&mut self, kind: Tracked, id: &str) -> bool {
        match self.registry_mut(kind).remove(id) {
            Some(entity) => {
                self.entities.remove(entity);
                true
            }
            None => false,
        }
    }

    /// Death path for the local player. Repeated calls only make sure the
    /// entity is gone.
    pub(crate) fn local_death(&mut self, id: &str) {
        self.forget(Tracked::Player, id);
        if self.status == Status::Dead {
            return;
        }
        self.status = Status::Dead;
        self.deaths += 1;
        self.death.on_local_death(id);
    }

    /// Pushes the local player's health, level, score and ammo to the HUD.
    pub(crate) fn refresh_hud(&mut self) {
        let Some(entity) = self.local_entity() else {
            return;
        };
        if let Some(health) = self.entities.component::<Health>(entity).copied() {
            self.hud.health(health.current(), health.max());
        }
        if let Some(stats) = self.entities.component::<Stats>(entity).cloned() {
            self.hud.score(stats.score);
            self.hud.level(stats.level);
        }
        if let Some(weapon) = self.entities.component::<Weapon>(entity) {
            let counts = weapon.state.counts();
            for (kind, count) in counts {
                self.hud.ammo(kind, count);
            }
        }
    }

    fn queue<T: Schema + Serialize>(&mut self, event: EventName, dto: &T) -> Result<(), ClientError> {
        self.outbound.push(Frame::success(event, dto)?);
        Ok(())
    }

    /// Frames waiting to be sent, oldest first.
    pub fn drain_outbound(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.outbound)
    }

    pub fn join(&mut self, name: &str) -> Result<(), ClientError> {
        self.queue(
            EventName::PlayerJoin,
            &JoinRequest {
                name: name.trim().to_string(),
                sprite_key: None,
            },
        )?;
        self.status = Status::Joining;
        Ok(())
    }

    /// Runs local systems for one tick and queues the ship's position and any
    /// shot it fired.
    pub fn tick(&mut self, dt: f32, input: ControlInput) -> Result<(), ClientError> {
        let local = self.local_entity();
        if let Some(control) = local.and_then(|entity| self.entities.component_mut::<Control>(entity)) {
            control.input = input;
        }

        self.entities.update(dt);

        let (Some(entity), Some(id)) = (local, self.local_id.clone()) else {
            return Ok(());
        };
        let Some(transform) = self.entities.component::<Transform>(entity).copied() else {
            return Ok(());
        };

        let shot = self
            .entities
            .component_mut::<Weapon>(entity)
            .and_then(|weapon| weapon.pending_shot.take());
        if let Some(kind) = shot {
            let direction = Vector2::from_angle(transform.rotation);
            self.queue(
                EventName::ProjectileCreate,
                &FireRequest {
                    x: transform.position.x,
                    y: transform.position.y,
                    dx: direction.x,
                    dy: direction.y,
                    projectile_type: kind,
                },
            )?;
            self.refresh_hud();
        }

        self.queue(
            EventName::PlayerCoordinates,
            &PlayerCoordinatesDto {
                id,
                x: transform.position.x,
                y: transform.position.y,
                angle: transform.rotation,
            },
        )
    }

    /// Applies a hit on a remote player locally, then reports it.
    /// Returns false when the target is not a tracked remote player.
    pub fn report_player_hit(&mut self, id: &str, damage: f32) -> Result<bool, ClientError> {
        if self.is_local(id) {
            return Ok(false);
        }
        let Some(entity) = self.tracked(Tracked::Player, id) else {
            return Ok(false);
        };
        if let Some(health) = self.entities.component_mut::<Health>(entity) {
            health.value.damage(damage);
        }
        self.queue(
            EventName::PlayerHit,
            &PlayerHitDto {
                id: id.to_string(),
                damage,
            },
        )?;
        Ok(true)
    }

    pub fn report_asteroid_hit(&mut self, asteroid_id: &str, damage: f32) -> Result<bool, ClientError> {
        let Some(entity) = self.tracked(Tracked::Asteroid, asteroid_id) else {
            return Ok(false);
        };
        if let Some(health) = self.entities.component_mut::<Health>(entity) {
            health.value.damage(damage);
        }
        self.queue(
            EventName::AsteroidHit,
            &AsteroidHitDto {
                asteroid_id: asteroid_id.to_string(),
                damage,
            },
        )?;
        Ok(true)
    }

    /// Removes the pickup locally and asks the server for it. The server
    /// answers the collector with `player:stats` only.
    pub fn collect_pickup(&mut self, pickup_id: &str) -> Result<bool, ClientError> {
        if self.status != Status::Alive || !self.forget(Tracked::Pickup, pickup_id) {
            return Ok(false);
        }
        self.queue(
            EventName::PlayerPickup,
            &PlayerPickupDto {
                pickup_id: pickup_id.to_string(),
            },
        )?;
        Ok(true)
    }

    /// Checks the local player's projectiles against remote ships and
    /// asteroids, and the local ship against pickups. Every contact is
    /// reported; returns how many were found.
    pub fn detect_collisions(&mut self) -> Result<usize, ClientError> {
        let Some(local_id) = self.local_id.clone() else {
            return Ok(0);
        };
        let mut reported = 0;

        let mut impacts = Vec::new();
        for (projectile_id, entity) in &self.projectiles {
            let Some(projectile) = self.entities.component::<Projectile>(*entity) else {
                continue;
            };
            if projectile.owner_id != local_id {
                continue;
            }
            let Some(at) = self.entities.component::<Transform>(*entity).map(|t| t.position) else {
                continue;
            };
            if let Some((kind, target)) = self.first_target(at, &local_id) {
                impacts.push((projectile_id.clone(), kind, target, projectile.damage));
            }
        }

        for (projectile_id, kind, target, damage) in impacts {
            let hit = match kind {
                Tracked::Player => self.report_player_hit(&target, damage)?,
                _ => self.report_asteroid_hit(&target, damage)?,
            };
            if hit {
                reported += 1;
            }
            self.forget(Tracked::Projectile, &projectile_id);
            self.queue(EventName::ProjectileDestroy, &DestroyDto { id: projectile_id })?;
        }

        if let Some(ship) = self.local_entity().and_then(|e| self.entities.component::<Transform>(e)) {
            let ship = ship.position;
            let touched: Vec<String> = self
                .pickups
                .iter()
                .filter(|(_, entity)| {
                    self.entities
                        .component::<Transform>(**entity)
                        .is_some_and(|t| circles_overlap(ship, PLAYER_RADIUS, t.position, PICKUP_RADIUS))
                })
                .map(|(id, _)| id.clone())
                .collect();
            for pickup_id in touched {
                if self.collect_pickup(&pickup_id)? {
                    reported += 1;
                }
            }
        }

        Ok(reported)
    }

    fn first_target(&self, at: Vector2, local_id: &str) -> Option<(Tracked, String)> {
        let overlaps = |entity: &EntityId, radius: f32| {
            self.entities
                .component::<Transform>(*entity)
                .is_some_and(|t| circles_overlap(at, PROJECTILE_RADIUS, t.position, radius))
        };

        self.players
            .iter()
            .filter(|(id, _)| id.as_str() != local_id)
            .find(|(_, entity)| overlaps(entity, PLAYER_RADIUS))
            .map(|(id, _)| (Tracked::Player, id.clone()))
            .or_else(|| {
                self.asteroids
                    .iter()
                    .find(|(_, entity)| overlaps(entity, ASTEROID_RADIUS))
                    .map(|(id, _)| (Tracked::Asteroid, id.clone()))
            })
    }

    /// Entities that carry local input; at most the local ship.
    pub fn controlled(&self) -> Vec<EntityId> {
        self.entities.query(&[ComponentKind::Control])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::{frame, player};
    use arena_shared::dto::{AsteroidDto, PickupDto, PickupKind, ProjectileDto};
    use arena_shared::AmmoKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn events(frames: &[Frame]) -> Vec<&str> {
        frames.iter().map(|frame| frame.event.as_str()).collect()
    }

    fn alive() -> ClientGame {
        let mut game = ClientGame::headless();
        game.apply(frame(EventName::PlayerProtagonist, &player("p-me", 100.0, 100.0, true)))
            .unwrap();
        game
    }

    #[test]
    fn test_join_queues_request() {
        let mut game = ClientGame::headless();
        game.join("  Vega ").unwrap();

        let frames = game.drain_outbound();
        assert_eq!(events(&frames), vec!["player:join"]);
        assert_eq!(frames[0].payload["dto"]["name"], "Vega");
        assert_eq!(game.status(), Status::Joining);
        assert!(game.drain_outbound().is_empty());
    }

    #[test]
    fn test_join_rejects_empty_name() {
        let mut game = ClientGame::headless();
        assert!(matches!(game.join("   "), Err(ClientError::Validation(_))));
        assert!(game.drain_outbound().is_empty());
    }

    #[test]
    fn test_tick_queues_coordinates_and_shots() {
        let mut game = alive();
        game.tick(
            0.1,
            ControlInput {
                thrust: true,
                trigger: true,
                ..ControlInput::default()
            },
        )
        .unwrap();

        let frames = game.drain_outbound();
        assert_eq!(events(&frames), vec!["projectile:create", "player:coordinates"]);
        assert_eq!(frames[0].payload["dto"]["projectileType"], "bullet");
        assert_eq!(frames[1].payload["dto"]["id"], "p-me");
        assert!(game.position(Tracked::Player, "p-me").unwrap().x > 100.0);
    }

    #[test]
    fn test_tick_before_join_sends_nothing() {
        let mut game = ClientGame::headless();
        game.tick(0.1, ControlInput::default()).unwrap();
        assert!(game.drain_outbound().is_empty());
    }

    #[test]
    fn test_report_hits() {
        let mut game = alive();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 300.0, 300.0, false)))
            .unwrap();
        game.apply(frame(
            EventName::AsteroidCreate,
            &AsteroidDto {
                id: "a-1".into(),
                x: 500.0,
                y: 500.0,
                health: 30.0,
                max_health: 30.0,
            },
        ))
        .unwrap();

        assert!(game.report_player_hit("p-2", 30.0).unwrap());
        assert!(game.report_asteroid_hit("a-1", 10.0).unwrap());
        assert!(!game.report_player_hit("p-me", 10.0).unwrap());
        assert!(!game.report_asteroid_hit("a-missing", 10.0).unwrap());

        assert_eq!(game.health(Tracked::Player, "p-2"), Some(70.0));
        assert_eq!(game.health(Tracked::Asteroid, "a-1"), Some(20.0));
        assert_eq!(
            events(&game.drain_outbound()),
            vec!["player:hit", "asteroid:hit"]
        );
    }

    #[test]
    fn test_collisions_report_hits_and_pickups() {
        let mut game = alive();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 300.0, 300.0, false)))
            .unwrap();
        game.apply(frame(
            EventName::ProjectileCreate,
            &ProjectileDto {
                id: "s-1".into(),
                owner_id: "p-me".into(),
                x: 305.0,
                y: 300.0,
                dx: 1.0,
                dy: 0.0,
                speed: 600.0,
                projectile_type: AmmoKind::Bullet,
                damage: 10.0,
            },
        ))
        .unwrap();
        game.apply(frame(
            EventName::ProjectileCreate,
            &ProjectileDto {
                id: "s-2".into(),
                owner_id: "p-2".into(),
                x: 100.0,
                y: 100.0,
                dx: 1.0,
                dy: 0.0,
                speed: 600.0,
                projectile_type: AmmoKind::Bullet,
                damage: 10.0,
            },
        ))
        .unwrap();
        game.apply(frame(
            EventName::GameDrop,
            &PickupDto {
                id: "k-1".into(),
                kind: PickupKind::Health,
                x: 110.0,
                y: 100.0,
                amount: Some(25),
                points: None,
                ammo_kind: None,
            },
        ))
        .unwrap();

        assert_eq!(game.detect_collisions().unwrap(), 2);
        assert_eq!(
            events(&game.drain_outbound()),
            vec!["player:hit", "projectile:destroy", "player:pickup"]
        );
        assert!(game.tracked(Tracked::Projectile, "s-1").is_none());
        assert!(game.tracked(Tracked::Projectile, "s-2").is_some());
        assert!(game.tracked(Tracked::Pickup, "k-1").is_none());
        assert_eq!(game.detect_collisions().unwrap(), 0);
    }

    #[test]
    fn test_controlled_is_local_ship_only() {
        let mut game = alive();
        game.apply(frame(EventName::PlayerJoined, &player("p-2", 300.0, 300.0, false)))
            .unwrap();
        assert_eq!(game.controlled(), vec![game.local_entity().unwrap()]);
    }

    struct CountingDeath(Arc<AtomicU32>);

    impl DeathHandler for CountingDeath {
        fn on_local_death(&mut self, _id: &str) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_local_death_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut game = ClientGame::new(
            Box::new(HeadlessRenderer::new()),
            Box::new(LogHud::new()),
            Box::new(CountingDeath(Arc::clone(&calls))),
        );
        game.apply(frame(EventName::PlayerProtagonist, &player("p-me", 1.0, 1.0, true)))
            .unwrap();

        game.local_death("p-me");
        game.local_death("p-me");
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(game.status(), Status::Dead);
        assert_eq!(game.deaths(), 1);
        assert!(game.local_entity().is_none());
    }

    #[test]
    fn test_dead_player_cannot_collect() {
        let mut game = alive();
        game.apply(frame(
            EventName::GameDrop,
            &PickupDto {
                id: "k-1".into(),
                kind: PickupKind::Score,
                x: 100.0,
                y: 100.0,
                amount: None,
                points: Some(50),
                ammo_kind: None,
            },
        ))
        .unwrap();
        game.local_death("p-me");

        assert!(!game.collect_pickup("k-1").unwrap());
        assert!(game.tracked(Tracked::Pickup, "k-1").is_some());
    }

    #[test]
    fn test_local_player_dto_marks_network_id() {
        let game = alive();
        let entity = game.local_entity().unwrap();
        let network = game.entities().component::<NetworkId>(entity).unwrap();
        assert!(network.is_local);
        assert_eq!(network.id, "p-me");
    }
}

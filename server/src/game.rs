//! Authoritative game state: the registries for every entity kind, their
//! health and the rules that mutate them.

use crate::client_manager::ConnectionId;
use crate::config::GameConfig;
use crate::utils::{local_sprite, mint_id, remote_sprite, ship_variant, variant_from_key};
use arena_shared::dto::{
    AsteroidDto, FireRequest, PickupDto, PickupKind, PlayerDto, PlayerStatsDto, ProjectileDto,
};
use arena_shared::{level_for_score, AmmoKind, Health, HealthMap, Vector2, Weapon};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub id: String,
    pub name: String,
    pub position: Vector2,
    pub angle: f32,
    pub variant: String,
    pub score: u32,
    pub level: u8,
    pub weapon: Weapon,
}

#[derive(Debug, Clone)]
pub struct AsteroidRecord {
    pub id: String,
    pub position: Vector2,
    pub velocity: Vector2,
}

#[derive(Debug, Clone)]
pub struct ProjectileRecord {
    pub id: String,
    pub owner_id: String,
    pub kind: AmmoKind,
    pub position: Vector2,
    pub direction: Vector2,
    pub speed: f32,
    pub damage: f32,
    pub age: f32,
}

impl ProjectileRecord {
    pub fn to_dto(&self) -> ProjectileDto {
        ProjectileDto {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            x: self.position.x,
            y: self.position.y,
            dx: self.direction.x,
            dy: self.direction.y,
            speed: self.speed,
            projectile_type: self.kind,
            damage: self.damage,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PickupRecord {
    pub id: String,
    pub kind: PickupKind,
    pub value: u32,
    pub ammo_kind: Option<AmmoKind>,
    pub position: Vector2,
    pub age: f32,
}

impl PickupRecord {
    pub fn to_dto(&self) -> PickupDto {
        let (amount, points) = match self.kind {
            PickupKind::Score => (None, Some(self.value)),
            PickupKind::Ammo | PickupKind::Health => (Some(self.value), None),
        };
        PickupDto {
            id: self.id.clone(),
            kind: self.kind,
            x: self.position.x,
            y: self.position.y,
            amount,
            points,
            ammo_kind: self.ammo_kind,
        }
    }
}

/// The single authoritative copy of the world.
///
/// Players are keyed by the connection that owns them; every other entity by
/// its network id. Health for all kinds lives in one [`HealthMap`].
pub struct GameState {
    pub(crate) config: GameConfig,
    pub(crate) players: BTreeMap<ConnectionId, PlayerRecord>,
    pub(crate) asteroids: BTreeMap<String, AsteroidRecord>,
    pub(crate) projectiles: BTreeMap<String, ProjectileRecord>,
    pub(crate) pickups: BTreeMap<String, PickupRecord>,
    pub(crate) health: HealthMap,
    pub(crate) rng: StdRng,
    pub(crate) spawn_timer: f32,
    pub tick: u64,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            players: BTreeMap::new(),
            asteroids: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            pickups: BTreeMap::new(),
            health: HealthMap::new(),
            rng,
            spawn_timer: 0.0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn health(&self) -> &HealthMap {
        &self.health
    }

    // ---- players ----

    /// Creates the player owned by `connection`. `sprite_key` may request a
    /// ship variant; otherwise one is picked from the connection id.
    pub fn add_player(
        &mut self,
        connection: ConnectionId,
        name: String,
        sprite_key: Option<String>,
    ) -> &PlayerRecord {
        let variant = match sprite_key {
            Some(key) => variant_from_key(&key).to_string(),
            None => ship_variant(connection).to_string(),
        };
        let position = match self.config.spawn_point {
            Some(point) => self.config.bounds.clamp(point),
            None => self.random_point(),
        };
        let record = PlayerRecord {
            id: mint_id("p"),
            name,
            position,
            angle: 0.0,
            variant,
            score: 0,
            level: 0,
            weapon: Weapon::new(),
        };
        self.health
            .track(record.id.clone(), self.config.player_max_health);

        info!(
            "Added player {} ({}) for connection {} at ({:.0}, {:.0})",
            record.id, record.name, connection, position.x, position.y
        );
        match self.players.entry(connection) {
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(record);
                self.health.remove(&previous.id);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(record),
        }
    }

    pub fn player(&self, connection: ConnectionId) -> Option<&PlayerRecord> {
        self.players.get(&connection)
    }

    pub fn player_mut(&mut self, connection: ConnectionId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(&connection)
    }

    pub fn connection_of(&self, player_id: &str) -> Option<ConnectionId> {
        self.players
            .iter()
            .find(|(_, player)| player.id == player_id)
            .map(|(connection, _)| *connection)
    }

    pub fn players(&self) -> impl Iterator<Item = (ConnectionId, &PlayerRecord)> {
        self.players.iter().map(|(connection, player)| (*connection, player))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn remove_player(&mut self, connection: ConnectionId) -> Option<PlayerRecord> {
        let record = self.players.remove(&connection)?;
        self.health.remove(&record.id);
        info!("Removed player {} (connection {})", record.id, connection);
        Some(record)
    }

    /// The player as seen by its owner (`is_local`) or by everybody else.
    pub fn player_dto(&self, connection: ConnectionId, is_local: bool) -> Option<PlayerDto> {
        let player = self.players.get(&connection)?;
        let health = self.health.get(&player.id)?;
        let sprite_key = if is_local {
            local_sprite(&player.variant)
        } else {
            remote_sprite(&player.variant)
        };
        Some(PlayerDto {
            id: player.id.clone(),
            name: player.name.clone(),
            x: player.position.x,
            y: player.position.y,
            sprite_key,
            is_local,
            health: Some(health.current()),
            max_health: Some(health.max()),
            level: Some(player.level),
            angle: Some(player.angle),
        })
    }

    pub fn player_stats(&self, connection: ConnectionId) -> Option<PlayerStatsDto> {
        let player = self.players.get(&connection)?;
        let health = self.health.get(&player.id)?;
        Some(PlayerStatsDto {
            id: player.id.clone(),
            health: health.current(),
            max_health: health.max(),
            score: player.score,
            level: player.level,
            ammo: player.weapon.counts(),
        })
    }

    /// Damages a live player. `None` when the id is unknown or already dead.
    pub fn damage_player(&mut self, player_id: &str, damage: f32) -> Option<Health> {
        self.damage_tracked(player_id, damage)
    }

    /// Adds `points` to the player's score and recomputes the level.
    pub fn award(&mut self, connection: ConnectionId, points: u32) -> bool {
        match self.players.get_mut(&connection) {
            Some(player) => {
                player.score = player.score.saturating_add(points);
                player.level = level_for_score(player.score);
                true
            }
            None => false,
        }
    }

    // ---- asteroids ----

    pub fn spawn_asteroid(&mut self, position: Vector2, velocity: Vector2) -> AsteroidDto {
        let id = mint_id("a");
        let health = Health::new(self.config.asteroid_max_health);
        self.health.insert(id.clone(), health);
        self.asteroids.insert(
            id.clone(),
            AsteroidRecord {
                id: id.clone(),
                position,
                velocity,
            },
        );
        debug!("Spawned asteroid {}", id);
        AsteroidDto {
            id,
            x: position.x,
            y: position.y,
            health: health.current(),
            max_health: health.max(),
        }
    }

    pub fn asteroid_dto(&self, asteroid_id: &str) -> Option<AsteroidDto> {
        let asteroid = self.asteroids.get(asteroid_id)?;
        let health = self.health.get(asteroid_id)?;
        Some(AsteroidDto {
            id: asteroid.id.clone(),
            x: asteroid.position.x,
            y: asteroid.position.y,
            health: health.current(),
            max_health: health.max(),
        })
    }

    pub fn asteroid_dtos(&self) -> Vec<AsteroidDto> {
        self.asteroids
            .keys()
            .filter_map(|id| self.asteroid_dto(id))
            .collect()
    }

    pub fn asteroid_count(&self) -> usize {
        self.asteroids.len()
    }

    pub fn damage_asteroid(&mut self, asteroid_id: &str, damage: f32) -> Option<Health> {
        if !self.asteroids.contains_key(asteroid_id) {
            return None;
        }
        self.damage_tracked(asteroid_id, damage)
    }

    pub fn remove_asteroid(&mut self, asteroid_id: &str) -> Option<AsteroidRecord> {
        self.health.remove(asteroid_id);
        self.asteroids.remove(asteroid_id)
    }

    // ---- projectiles ----

    /// Fires a projectile for the player on `connection`, spending one round
    /// of the requested kind. `None` when there is no player or no ammo.
    pub fn fire(&mut self, connection: ConnectionId, request: &FireRequest) -> Option<ProjectileDto> {
        let player = self.players.get_mut(&connection)?;
        let kind = request.projectile_type;
        if !player.weapon.try_consume(kind) {
            debug!("Player {} tried to fire {} without ammo", player.id, kind.name());
            return None;
        }
        let record = ProjectileRecord {
            id: mint_id("s"),
            owner_id: player.id.clone(),
            kind,
            position: Vector2::new(request.x, request.y),
            direction: Vector2::new(request.dx, request.dy).normalize(),
            speed: player.weapon.speed(kind),
            damage: player.weapon.damage(kind),
            age: 0.0,
        };
        let dto = record.to_dto();
        self.projectiles.insert(record.id.clone(), record);
        Some(dto)
    }

    pub fn projectile(&self, projectile_id: &str) -> Option<&ProjectileRecord> {
        self.projectiles.get(projectile_id)
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Removes a projectile on behalf of its owner. Foreign and unknown ids
    /// are left alone.
    pub fn retire_projectile(&mut self, projectile_id: &str, owner_id: &str) -> bool {
        match self.projectiles.get(projectile_id) {
            Some(projectile) if projectile.owner_id == owner_id => {
                self.projectiles.remove(projectile_id);
                true
            }
            _ => false,
        }
    }

    // ---- pickups ----

    /// Places a pickup of `kind` at `position`.
    pub fn create_pickup(&mut self, kind: PickupKind, position: Vector2) -> PickupDto {
        let (value, ammo_kind) = match kind {
            PickupKind::Ammo => {
                let ammo = AmmoKind::ALL[self.rng.gen_range(0..AmmoKind::ALL.len())];
                ((ammo.spec().max / 4).max(1), Some(ammo))
            }
            PickupKind::Health => (self.config.health_pickup_amount, None),
            PickupKind::Score => (self.config.score_pickup_points, None),
        };
        let record = PickupRecord {
            id: mint_id("k"),
            kind,
            value,
            ammo_kind,
            position,
            age: 0.0,
        };
        let dto = record.to_dto();
        self.pickups.insert(record.id.clone(), record);
        dto
    }

    /// Rolls the drop chance for a destroyed asteroid.
    pub fn roll_drop(&mut self, position: Vector2) -> Option<PickupDto> {
        if !self.rng.gen_bool(self.config.drop_chance.clamp(0.0, 1.0)) {
            return None;
        }
        let kind = match self.rng.gen_range(0..3) {
            0 => PickupKind::Ammo,
            1 => PickupKind::Health,
            _ => PickupKind::Score,
        };
        Some(self.create_pickup(kind, position))
    }

    pub fn pickup_dtos(&self) -> Vec<PickupDto> {
        self.pickups.values().map(PickupRecord::to_dto).collect()
    }

    pub fn pickup_count(&self) -> usize {
        self.pickups.len()
    }

    /// Removes a live pickup. The first caller wins; later calls see `None`.
    pub fn take_pickup(&mut self, pickup_id: &str) -> Option<PickupRecord> {
        self.pickups.remove(pickup_id)
    }

    /// Applies a collected pickup to the player on `connection`.
    pub fn apply_pickup(&mut self, connection: ConnectionId, pickup: &PickupRecord) -> bool {
        let Some(player) = self.players.get_mut(&connection) else {
            return false;
        };
        match pickup.kind {
            PickupKind::Ammo => {
                if let Some(kind) = pickup.ammo_kind {
                    player.weapon.add_ammo(kind, pickup.value);
                }
            }
            PickupKind::Health => {
                self.health.heal(&player.id, pickup.value as f32);
            }
            PickupKind::Score => {
                player.score = player.score.saturating_add(pickup.value);
                player.level = level_for_score(player.score);
            }
        }
        true
    }

    // ---- helpers ----

    fn damage_tracked(&mut self, id: &str, damage: f32) -> Option<Health> {
        if !self.health.contains(id) || self.health.is_dead(id) {
            return None;
        }
        self.health.damage(id, damage);
        self.health.get(id)
    }

    pub(crate) fn random_point(&mut self) -> Vector2 {
        let bounds = self.config.bounds;
        Vector2::new(
            self.rng.gen_range(0.0..=bounds.width),
            self.rng.gen_range(0.0..=bounds.height),
        )
    }
}

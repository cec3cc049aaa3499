//! Request and response payloads for every event, each with its schema.

use crate::schema::{
    finite, health_pair, max_chars, non_empty, non_negative, positive, FieldPath, Schema,
    ValidationError,
};
use crate::weapon::AmmoKind;
use crate::{Vector2, MAX_LEVEL, MAX_NAME_LEN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `player:join` request sent once the join screen is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_key: Option<String>,
}

impl Schema for JoinRequest {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("name"), &self.name)?;
        max_chars(&at.field("name"), &self.name, MAX_NAME_LEN)?;
        if let Some(key) = &self.sprite_key {
            non_empty(&at.field("spriteKey"), key)?;
        }
        Ok(())
    }

    fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub sprite_key: String,
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
}

impl Schema for PlayerDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        non_empty(&at.field("name"), &self.name)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)?;
        non_empty(&at.field("spriteKey"), &self.sprite_key)?;
        if let Some(angle) = self.angle {
            finite(&at.field("angle"), angle)?;
        }
        match (self.health, self.max_health) {
            (Some(health), Some(max)) => health_pair(at, health, max)?,
            (Some(health), None) => non_negative(&at.field("health"), health)?,
            (None, Some(max)) => positive(&at.field("maxHealth"), max)?,
            (None, None) => {}
        }
        if let Some(level) = self.level {
            if level > MAX_LEVEL {
                return Err(at
                    .field("level")
                    .fail(format!("level {} above maximum {}", level, MAX_LEVEL)));
            }
        }
        Ok(())
    }
}

/// `player:coordinates` in both directions. The server re-stamps `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCoordinatesDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle: f32,
}

impl Schema for PlayerCoordinatesDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)?;
        finite(&at.field("angle"), self.angle)
    }
}

/// `player:hit` request: `damage` dealt to player `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHitDto {
    pub id: String,
    pub damage: f32,
}

impl Schema for PlayerHitDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        non_negative(&at.field("damage"), self.damage)
    }
}

/// `player:hit` response: authoritative health after the hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHealthDto {
    pub id: String,
    pub health: f32,
    pub max_health: f32,
}

impl Schema for PlayerHealthDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        health_pair(at, self.health, self.max_health)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPickupDto {
    pub pickup_id: String,
}

impl Schema for PlayerPickupDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("pickupId"), &self.pickup_id)
    }
}

/// `player:pickup` response: pickup `id` was collected by `player_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupCollectedDto {
    pub id: String,
    pub player_id: String,
}

impl Schema for PickupCollectedDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        non_empty(&at.field("playerId"), &self.player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsDto {
    pub id: String,
    pub health: f32,
    pub max_health: f32,
    pub score: u32,
    pub level: u8,
    pub ammo: BTreeMap<AmmoKind, u32>,
}

impl Schema for PlayerStatsDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        health_pair(at, self.health, self.max_health)?;
        if self.level > MAX_LEVEL {
            return Err(at
                .field("level")
                .fail(format!("level {} above maximum {}", self.level, MAX_LEVEL)));
        }
        for (kind, count) in &self.ammo {
            let max = kind.spec().max;
            if *count > max {
                return Err(at
                    .field("ammo")
                    .field(kind.name())
                    .fail(format!("{} exceeds maximum {}", count, max)));
            }
        }
        Ok(())
    }
}

/// `player:destroy`: `is_local` tells the receiver whether it lost its own ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDestroyDto {
    pub id: String,
    pub is_local: bool,
}

impl Schema for PlayerDestroyDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuitDto {
    pub id: String,
}

impl Schema for QuitDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)
    }
}

/// Removal of an asteroid, projectile or pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyDto {
    pub id: String,
}

impl Schema for DestroyDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
}

impl Schema for AsteroidDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)?;
        health_pair(at, self.health, self.max_health)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidCoordinatesDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

impl Schema for AsteroidCoordinatesDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)
    }
}

/// `asteroid:hit` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidHitDto {
    pub asteroid_id: String,
    pub damage: f32,
}

impl Schema for AsteroidHitDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("asteroidId"), &self.asteroid_id)?;
        non_negative(&at.field("damage"), self.damage)
    }
}

/// `asteroid:hit` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidHealthDto {
    pub asteroid_id: String,
    pub health: f32,
    pub max_health: f32,
}

impl Schema for AsteroidHealthDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("asteroidId"), &self.asteroid_id)?;
        health_pair(at, self.health, self.max_health)
    }
}

/// `projectile:create` request. Speed, damage, owner and id are decided by
/// the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireRequest {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub projectile_type: AmmoKind,
}

impl Schema for FireRequest {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)?;
        finite(&at.field("dx"), self.dx)?;
        finite(&at.field("dy"), self.dy)?;
        if self.dx == 0.0 && self.dy == 0.0 {
            return Err(at.field("dx").fail("direction must not be zero"));
        }
        Ok(())
    }

    fn normalize(mut self) -> Self {
        let direction = Vector2::new(self.dx, self.dy).normalize();
        self.dx = direction.x;
        self.dy = direction.y;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileDto {
    pub id: String,
    pub owner_id: String,
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub speed: f32,
    pub projectile_type: AmmoKind,
    pub damage: f32,
}

impl Schema for ProjectileDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        non_empty(&at.field("ownerId"), &self.owner_id)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)?;
        finite(&at.field("dx"), self.dx)?;
        finite(&at.field("dy"), self.dy)?;
        non_negative(&at.field("speed"), self.speed)?;
        non_negative(&at.field("damage"), self.damage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileCoordinatesDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

impl Schema for ProjectileCoordinatesDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickupKind {
    Ammo,
    Health,
    Score,
}

/// `game:drop` payload. Ammo and health pickups carry `amount`, score pickups
/// carry `points`; ammo pickups also name the `ammo_kind` they refill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PickupKind,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo_kind: Option<AmmoKind>,
}

impl Schema for PickupDto {
    fn check(&self, at: &FieldPath) -> Result<(), ValidationError> {
        non_empty(&at.field("id"), &self.id)?;
        finite(&at.field("x"), self.x)?;
        finite(&at.field("y"), self.y)?;
        match self.kind {
            PickupKind::Ammo | PickupKind::Health => {
                if self.amount.is_none() {
                    return Err(at.field("amount").fail("required for this pickup type"));
                }
                if self.points.is_some() {
                    return Err(at.field("points").fail("only score pickups carry points"));
                }
            }
            PickupKind::Score => {
                if self.points.is_none() {
                    return Err(at.field("points").fail("required for score pickups"));
                }
                if self.amount.is_some() {
                    return Err(at.field("amount").fail("score pickups carry points"));
                }
            }
        }
        match (self.kind, self.ammo_kind) {
            (PickupKind::Ammo, None) => {
                Err(at.field("ammoKind").fail("required for ammo pickups"))
            }
            (PickupKind::Health | PickupKind::Score, Some(_)) => {
                Err(at.field("ammoKind").fail("only ammo pickups name an ammo kind"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate, validate_value};
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    fn player() -> PlayerDto {
        PlayerDto {
            id: "p-1".to_string(),
            name: "Vega".to_string(),
            x: 10.0,
            y: 20.0,
            sprite_key: "ship-blue".to_string(),
            is_local: true,
            health: Some(100.0),
            max_health: Some(100.0),
            level: Some(0),
            angle: Some(0.0),
        }
    }

    #[test]
    fn test_player_dto_wire_names() {
        let json = serde_json::to_value(player()).unwrap();
        assert_eq!(json["spriteKey"], "ship-blue");
        assert_eq!(json["isLocal"], true);
        assert_eq!(json["maxHealth"], 100.0);
    }

    #[test]
    fn test_player_dto_minimal_fields() {
        let dto: PlayerDto = validate(json!({
            "id": "p-2", "name": "Orion", "x": 1.0, "y": 2.0,
            "spriteKey": "rival-red", "isLocal": false
        }))
        .unwrap();
        assert_eq!(dto.health, None);
        assert_eq!(dto.level, None);
    }

    #[test]
    fn test_player_dto_rejects_bad_values() {
        let mut dto = player();
        dto.health = Some(120.0);
        assert_eq!(validate_value(dto).unwrap_err().path, "$.health");

        let mut dto = player();
        dto.level = Some(MAX_LEVEL + 1);
        assert_eq!(validate_value(dto).unwrap_err().path, "$.level");

        let mut dto = player();
        dto.angle = Some(f32::NAN);
        assert_eq!(validate_value(dto).unwrap_err().path, "$.angle");

        let mut dto = player();
        dto.x = f32::INFINITY;
        assert_eq!(validate_value(dto).unwrap_err().path, "$.x");
    }

    #[test]
    fn test_join_request_trims_and_limits_name() {
        let join: JoinRequest = validate(json!({"name": "  Nova  "})).unwrap();
        assert_eq!(join.name, "Nova");

        assert!(validate::<JoinRequest>(json!({"name": "   "})).is_err());
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate::<JoinRequest>(json!({ "name": long })).is_err());
    }

    #[test]
    fn test_hit_rejects_negative_damage() {
        let err = validate::<PlayerHitDto>(json!({"id": "p-1", "damage": -4.0})).unwrap_err();
        assert_eq!(err.path, "$.damage");

        let err = validate::<AsteroidHitDto>(json!({"asteroidId": "", "damage": 4.0})).unwrap_err();
        assert_eq!(err.path, "$.asteroidId");
    }

    #[test]
    fn test_overflowing_float_is_rejected() {
        // 1e39 does not fit an f32 and parses as infinity.
        let result = validate::<AsteroidCoordinatesDto>(json!({"id": "a1", "x": 1e39, "y": 0.0}));
        assert!(result.is_err());
    }

    #[test]
    fn test_fire_request_normalizes_direction() {
        let fire: FireRequest = validate(json!({
            "x": 0.0, "y": 0.0, "dx": 3.0, "dy": 4.0, "projectileType": "rocket"
        }))
        .unwrap();
        assert_approx_eq!(fire.dx, 0.6, 1e-6);
        assert_approx_eq!(fire.dy, 0.8, 1e-6);
        assert_eq!(fire.projectile_type, AmmoKind::Rocket);

        let err = validate::<FireRequest>(json!({
            "x": 0.0, "y": 0.0, "dx": 0.0, "dy": 0.0, "projectileType": "bullet"
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.dx");
    }

    #[test]
    fn test_pickup_value_rules() {
        let ammo: PickupDto = validate(json!({
            "id": "k-1", "type": "ammo", "x": 5.0, "y": 5.0, "amount": 10, "ammoKind": "bullet"
        }))
        .unwrap();
        assert_eq!(ammo.kind, PickupKind::Ammo);

        let score: PickupDto = validate(json!({
            "id": "k-2", "type": "score", "x": 5.0, "y": 5.0, "points": 50
        }))
        .unwrap();
        assert_eq!(score.points, Some(50));

        let missing_kind = validate::<PickupDto>(json!({
            "id": "k-3", "type": "ammo", "x": 5.0, "y": 5.0, "amount": 10
        }));
        assert_eq!(missing_kind.unwrap_err().path, "$.ammoKind");

        let wrong_value = validate::<PickupDto>(json!({
            "id": "k-4", "type": "score", "x": 5.0, "y": 5.0, "amount": 10
        }));
        assert_eq!(wrong_value.unwrap_err().path, "$.points");
    }

    #[test]
    fn test_stats_rejects_ammo_over_max() {
        let mut ammo = BTreeMap::new();
        ammo.insert(AmmoKind::Rocket, 11);
        let stats = PlayerStatsDto {
            id: "p-1".to_string(),
            health: 50.0,
            max_health: 100.0,
            score: 0,
            level: 0,
            ammo,
        };
        assert_eq!(validate_value(stats).unwrap_err().path, "$.ammo.rocket");
    }

    #[test]
    fn test_competitor_list_validates_each_entry() {
        let mut second = player();
        second.y = f32::NAN;
        let err = validate_value(vec![player(), second]).unwrap_err();
        assert_eq!(err.path, "$[1].y");
    }
}

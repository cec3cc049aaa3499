use super::component::{ComponentData, ComponentKind};
use super::entity::{Entity, EntityId};
use super::system::System;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity {0} already exists")]
    IdInUse(EntityId),
    #[error("entity {0} does not exist")]
    NoSuchEntity(EntityId),
}

struct Registered {
    system: Box<dyn System>,
    enabled: bool,
}

/// Owns every entity and system. Entities are visited in insertion order.
pub struct EntityManager {
    next_id: u32,
    entities: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    systems: Vec<Registered>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entities: HashMap::new(),
            order: Vec::new(),
            systems: Vec::new(),
        }
    }

    /// Creates an entity with the next free id.
    pub fn create(&mut self) -> EntityId {
        while self.entities.contains_key(&EntityId(self.next_id)) {
            self.next_id = self.next_id.wrapping_add(1);
        }
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.attach(id);
        id
    }

    pub fn create_with_id(&mut self, id: EntityId) -> Result<EntityId, EcsError> {
        if self.entities.contains_key(&id) {
            return Err(EcsError::IdInUse(id));
        }
        self.attach(id);
        Ok(id)
    }

    fn attach(&mut self, id: EntityId) {
        self.entities.insert(id, Entity::new(id));
        self.order.push(id);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn component<T: ComponentData>(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id).and_then(|entity| entity.get::<T>())
    }

    pub fn component_mut<T: ComponentData>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id).and_then(|entity| entity.get_mut::<T>())
    }

    pub fn insert<T: ComponentData>(&mut self, id: EntityId, value: T) -> Result<(), EcsError> {
        let entity = self.entities.get_mut(&id).ok_or(EcsError::NoSuchEntity(id))?;
        entity.insert(value);
        Ok(())
    }

    /// Deactivates, tears down and forgets an entity. Removing an entity that
    /// is already gone does nothing and returns false.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(mut entity) = self.entities.remove(&id) else {
            return false;
        };
        entity.deactivate();
        self.order.retain(|existing| *existing != id);
        true
    }

    /// Ids of active entities holding every kind in `kinds`, in insertion order.
    pub fn query(&self, kinds: &[ComponentKind]) -> Vec<EntityId> {
        self.order
            .iter()
            .filter(|id| {
                self.entities
                    .get(id)
                    .is_some_and(|entity| entity.is_active() && entity.has_all(kinds))
            })
            .copied()
            .collect()
    }

    pub fn add_system(&mut self, system: Box<dyn System>) {
        debug!("Registered system {}", system.name());
        self.systems.push(Registered {
            system,
            enabled: true,
        });
    }

    /// Returns false when no system with that name is registered.
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for registered in self.systems.iter_mut().filter(|r| r.system.name() == name) {
            registered.enabled = enabled;
            found = true;
        }
        found
    }

    /// Runs every enabled system over the entities it applies to.
    pub fn update(&mut self, dt: f32) {
        for registered in &mut self.systems {
            if !registered.enabled || !registered.system.enabled() {
                continue;
            }
            let requires = registered.system.requires().to_vec();
            for id in &self.order {
                let Some(entity) = self.entities.get_mut(id) else {
                    continue;
                };
                if entity.is_active() && entity.has_all(&requires) {
                    registered.system.run(entity, dt);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

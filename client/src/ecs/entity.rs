use super::component::{Component, ComponentData, ComponentKind};
use std::collections::BTreeMap;
use std::fmt;

/// Local ECS handle. Never sent over the wire; network ids map onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An id, an active flag and at most one component per kind.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    active: bool,
    components: BTreeMap<ComponentKind, Component>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            active: true,
            components: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn has_all(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|kind| self.has(*kind))
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.components.keys().copied().collect()
    }

    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::unwrap_ref)
    }

    pub fn get_mut<T: ComponentData>(&mut self) -> Option<&mut T> {
        self.components.get_mut(&T::KIND).and_then(T::unwrap_mut)
    }

    /// Attaches a component, tearing down any previous one of the same kind.
    pub fn insert<T: ComponentData>(&mut self, value: T) {
        if let Some(mut previous) = self.components.insert(T::KIND, value.wrap()) {
            previous.teardown();
        }
    }

    /// Detaches a component and hands it back without tearing it down.
    pub fn remove<T: ComponentData>(&mut self) -> Option<T> {
        self.components.remove(&T::KIND).and_then(T::unwrap_owned)
    }

    /// Deactivates the entity and tears down and detaches every component.
    pub fn deactivate(&mut self) {
        self.active = false;
        for (_, mut component) in std::mem::take(&mut self.components) {
            component.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Health, Sprite, Transform, Velocity};
    use crate::rendering::{HeadlessRenderer, Renderer};

    #[test]
    fn test_missing_component_is_none() {
        let mut entity = Entity::new(EntityId(1));
        assert!(entity.get::<Transform>().is_none());
        assert!(entity.get_mut::<Health>().is_none());
        assert!(entity.remove::<Velocity>().is_none());
    }

    #[test]
    fn test_insert_replaces_same_kind() {
        let mut entity = Entity::new(EntityId(1));
        entity.insert(Transform::new(1.0, 1.0, 0.0));
        entity.insert(Transform::new(5.0, 6.0, 0.0));

        assert_eq!(entity.kinds(), vec![ComponentKind::Transform]);
        assert_eq!(entity.get::<Transform>().map(|t| t.position.x), Some(5.0));
    }

    #[test]
    fn test_has_all() {
        let mut entity = Entity::new(EntityId(1));
        entity.insert(Transform::default());
        assert!(entity.has_all(&[ComponentKind::Transform]));
        assert!(!entity.has_all(&[ComponentKind::Transform, ComponentKind::Velocity]));
        assert!(entity.has_all(&[]));
    }

    #[test]
    fn test_deactivate_tears_down_visuals() {
        let mut renderer = HeadlessRenderer::new();
        let stats = renderer.stats();
        let mut entity = Entity::new(EntityId(3));
        entity.insert(Sprite::new("ship-blue", renderer.spawn("ship-blue", 0.0, 0.0, 0.0)));
        entity.insert(Transform::default());

        entity.deactivate();
        assert!(!entity.is_active());
        assert!(entity.kinds().is_empty());
        assert_eq!(stats.destroyed(), 1);

        entity.deactivate();
        assert_eq!(stats.destroyed(), 1);
    }
}

//! Explicit server context: everything one server run owns, with a
//! checked `Uninitialized -> Ready -> Destroyed` lifecycle.

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::game::GameState;
use crate::outbox::DomainEvent;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("server context is not initialized")]
    NotInitialized,
    #[error("server context is already initialized")]
    AlreadyInitialized,
    #[error("server context has been destroyed")]
    Destroyed,
}

/// Fan-out of [`DomainEvent`]s to in-process observers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes to every current subscriber. Returns how many received it;
    /// zero subscribers is not an error.
    pub fn publish(&self, event: DomainEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// State shared by the network loop and every handler it calls.
pub struct Shared {
    pub game: GameState,
    pub clients: ClientManager,
    pub bus: EventBus,
}

enum Lifecycle {
    Uninitialized,
    Ready(Box<Shared>),
    Destroyed,
}

pub struct ServerContext {
    state: Lifecycle,
}

impl ServerContext {
    pub fn new() -> Self {
        Self {
            state: Lifecycle::Uninitialized,
        }
    }

    pub fn initialize(&mut self, config: &ServerConfig) -> Result<(), ContextError> {
        match self.state {
            Lifecycle::Uninitialized => {
                self.state = Lifecycle::Ready(Box::new(Shared {
                    game: GameState::new(config.game.clone()),
                    clients: ClientManager::new(config.max_clients, config.idle_timeout),
                    bus: EventBus::new(config.event_bus_capacity),
                }));
                Ok(())
            }
            Lifecycle::Ready(_) => Err(ContextError::AlreadyInitialized),
            Lifecycle::Destroyed => Err(ContextError::Destroyed),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, Lifecycle::Ready(_))
    }

    pub fn get(&self) -> Result<&Shared, ContextError> {
        match &self.state {
            Lifecycle::Ready(shared) => Ok(&**shared),
            Lifecycle::Uninitialized => Err(ContextError::NotInitialized),
            Lifecycle::Destroyed => Err(ContextError::Destroyed),
        }
    }

    pub fn get_mut(&mut self) -> Result<&mut Shared, ContextError> {
        match &mut self.state {
            Lifecycle::Ready(shared) => Ok(&mut **shared),
            Lifecycle::Uninitialized => Err(ContextError::NotInitialized),
            Lifecycle::Destroyed => Err(ContextError::Destroyed),
        }
    }

    /// Tears the context down and hands back what it owned. Terminal.
    pub fn destroy(&mut self) -> Result<Shared, ContextError> {
        match std::mem::replace(&mut self.state, Lifecycle::Destroyed) {
            Lifecycle::Ready(shared) => Ok(*shared),
            Lifecycle::Uninitialized => {
                self.state = Lifecycle::Uninitialized;
                Err(ContextError::NotInitialized)
            }
            Lifecycle::Destroyed => Err(ContextError::Destroyed),
        }
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut context = ServerContext::new();
        assert_eq!(context.get().err(), Some(ContextError::NotInitialized));
        assert_eq!(context.destroy().err(), Some(ContextError::NotInitialized));

        context.initialize(&ServerConfig::default()).unwrap();
        assert!(context.is_ready());
        assert_eq!(
            context.initialize(&ServerConfig::default()),
            Err(ContextError::AlreadyInitialized)
        );
        assert!(context.get_mut().is_ok());

        let shared = context.destroy().unwrap();
        assert!(shared.clients.is_empty());
        assert!(!context.is_ready());
        assert_eq!(context.get().err(), Some(ContextError::Destroyed));
        assert_eq!(context.destroy().err(), Some(ContextError::Destroyed));
        assert_eq!(
            context.initialize(&ServerConfig::default()),
            Err(ContextError::Destroyed)
        );
    }

    #[test]
    fn test_fresh_contexts_are_independent() {
        let mut first = ServerContext::new();
        let mut second = ServerContext::new();
        first.initialize(&ServerConfig::default()).unwrap();
        second.initialize(&ServerConfig::default()).unwrap();

        if let Ok(shared) = first.get_mut() {
            shared.game.add_player(1, "Vega".to_string(), None);
        }
        assert_eq!(first.get().unwrap().game.player_count(), 1);
        assert_eq!(second.get().unwrap().game.player_count(), 0);
    }

    #[test]
    fn test_bus_without_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(DomainEvent::PickupDropped { id: "k1".into() }), 0);
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(DomainEvent::PlayerLeft { id: "p1".into() });
        assert_eq!(
            rx.recv().await.unwrap(),
            DomainEvent::PlayerLeft { id: "p1".into() }
        );
    }
}

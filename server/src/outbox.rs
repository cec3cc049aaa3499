//! Frames and domain events queued by a handler, delivered only after it
//! returns.

use crate::client_manager::ConnectionId;
use arena_shared::{EventName, Frame, Schema, ValidationError};
use serde::Serialize;

/// Who receives a queued frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Unicast(ConnectionId),
    Broadcast,
    BroadcastExcept(ConnectionId),
}

impl Target {
    pub fn includes(&self, connection: ConnectionId) -> bool {
        match self {
            Target::Unicast(id) => *id == connection,
            Target::Broadcast => true,
            Target::BroadcastExcept(id) => *id != connection,
        }
    }

    /// Picks the receivers out of the currently open connections.
    pub fn resolve(&self, connections: &[ConnectionId]) -> Vec<ConnectionId> {
        connections
            .iter()
            .copied()
            .filter(|connection| self.includes(*connection))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub target: Target,
    pub frame: Frame,
}

/// Server-local notifications published on the event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    PlayerJoined { id: String, name: String },
    PlayerLeft { id: String },
    PlayerDied { id: String, by: Option<String> },
    AsteroidDestroyed { id: String, by: Option<String> },
    PickupDropped { id: String },
    PickupCollected { id: String, player_id: String },
}

#[derive(Debug, Default)]
pub struct Outbox {
    frames: Vec<Outgoing>,
    events: Vec<DomainEvent>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `dto` and queues it as a success frame.
    pub fn emit<T: Schema + Serialize>(
        &mut self,
        target: Target,
        event: EventName,
        dto: &T,
    ) -> Result<(), ValidationError> {
        let frame = Frame::success(event, dto)?;
        self.push(target, frame);
        Ok(())
    }

    pub fn push(&mut self, target: Target, frame: Frame) {
        self.frames.push(Outgoing { target, frame });
    }

    pub fn publish(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    /// Appends everything queued in `other`, keeping its order.
    pub fn extend(&mut self, other: Outbox) {
        self.frames.extend(other.frames);
        self.events.extend(other.events);
    }

    pub fn frames(&self) -> &[Outgoing] {
        &self.frames
    }

    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    /// Frames that `connection` would receive, in queue order.
    pub fn frames_for(&self, connection: ConnectionId) -> Vec<&Frame> {
        self.frames
            .iter()
            .filter(|outgoing| outgoing.target.includes(connection))
            .map(|outgoing| &outgoing.frame)
            .collect()
    }

    pub fn into_parts(self) -> (Vec<Outgoing>, Vec<DomainEvent>) {
        (self.frames, self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.events.clear();
    }
}

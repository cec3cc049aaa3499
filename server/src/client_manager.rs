//! Connection bookkeeping for the WebSocket server
//!
//! This module tracks every open connection:
//! - Connection lifecycle (connect, disconnect, idle timeout)
//! - The bounded outbound channel feeding each connection's writer task
//! - Capacity limits and address tracking
//!
//! A connection is not a player. Players are created by `player:join` and
//! live in the game state; the manager only knows who is connected and how to
//! reach them.

use log::info;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Server-assigned connection handle, starting at 1.
pub type ConnectionId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection {0} is gone")]
    ConnectionGone(ConnectionId),
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),
    #[error("outbound queue of connection {0} is full")]
    Backpressure(ConnectionId),
}

/// One open WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Unique id assigned by the server
    pub id: ConnectionId,
    /// Remote address, for logging
    pub addr: SocketAddr,
    /// Last time any frame arrived on this connection
    pub last_seen: Instant,
    sender: mpsc::Sender<String>,
}

impl Connection {
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            sender,
        }
    }

    /// Marks the connection as active right now.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Returns true if nothing arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    /// Queues a text frame for the writer task without waiting. A full queue
    /// means the peer stopped reading.
    pub fn send(&self, text: String) -> Result<(), TransportError> {
        self.sender.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure(self.id),
            TrySendError::Closed(_) => TransportError::ConnectionGone(self.id),
        })
    }
}

/// Manages all open connections.
///
/// Ids are never reused within one server run, so a late message from a
/// closed connection can never be attributed to a newer one.
pub struct ClientManager {
    connections: BTreeMap<ConnectionId, Connection>,
    next_connection_id: ConnectionId,
    max_clients: usize,
    idle_timeout: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, idle_timeout: Duration) -> Self {
        Self {
            connections: BTreeMap::new(),
            next_connection_id: 1,
            max_clients,
            idle_timeout,
        }
    }

    /// Registers a new connection. Returns `None` when the server is full.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::Sender<String>,
    ) -> Option<ConnectionId> {
        if self.connections.len() >= self.max_clients {
            return None;
        }

        let id = self.next_connection_id;
        self.next_connection_id += 1;

        info!("Connection {} opened from {}", id, addr);
        self.connections.insert(id, Connection::new(id, addr, sender));
        Some(id)
    }

    /// Drops a connection and its outbound channel. Returns false if it was
    /// already gone.
    pub fn remove_client(&mut self, id: &ConnectionId) -> bool {
        match self.connections.remove(id) {
            Some(connection) => {
                info!("Connection {} from {} closed", connection.id, connection.addr);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Records activity on a connection. False for unknown ids.
    pub fn touch(&mut self, id: ConnectionId) -> bool {
        match self.connections.get_mut(&id) {
            Some(connection) => {
                connection.touch();
                true
            }
            None => false,
        }
    }

    pub fn addr(&self, id: ConnectionId) -> Option<SocketAddr> {
        self.connections.get(&id).map(|connection| connection.addr)
    }

    pub fn send(&self, id: ConnectionId, text: String) -> Result<(), TransportError> {
        self.connections
            .get(&id)
            .ok_or(TransportError::UnknownConnection(id))?
            .send(text)
    }

    /// Ids of every open connection, in ascending order.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Removes and returns connections idle for longer than the configured
    /// timeout.
    pub fn check_timeouts(&mut self) -> Vec<ConnectionId> {
        let timeout = self.idle_timeout;
        let timed_out: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, connection)| connection.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for id in &timed_out {
            info!("Connection {} timed out", id);
            self.remove_client(id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

//! Server network layer: WebSocket connections and the main event loop

use crate::client_manager::{ConnectionId, TransportError};
use crate::config::ServerConfig;
use crate::context::{ContextError, ServerContext, Shared};
use crate::handlers::player;
use crate::outbox::{DomainEvent, Outbox};
use crate::{router, simulation};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Longest step the simulation is advanced by in one tick, in seconds.
const MAX_TICK_DELTA: f32 = 0.25;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("server is already running")]
    AlreadyRunning,
}

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        addr: SocketAddr,
        sender: mpsc::Sender<String>,
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
    FrameReceived {
        connection: ConnectionId,
        text: String,
    },
    Disconnected {
        connection: ConnectionId,
    },
    Shutdown,
}

/// Main server: owns the context and runs every handler on one task.
pub struct Server {
    listener: Option<TcpListener>,
    context: ServerContext,
    config: ServerConfig,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let mut context = ServerContext::new();
        context.initialize(&config)?;

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            context,
            config,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        match &self.listener {
            Some(listener) => Ok(listener.local_addr()?),
            None => Err(ServerError::AlreadyRunning),
        }
    }

    /// Handle for feeding the loop from outside, e.g. to request shutdown.
    pub fn sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<DomainEvent>, ContextError> {
        Ok(self.context.get()?.bus.subscribe())
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    /// Spawns the task accepting TCP connections and upgrading them.
    fn spawn_acceptor(&self, listener: TcpListener) {
        let server_tx = self.server_tx.clone();
        let capacity = self.config.outbound_capacity.max(1);

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tokio::spawn(serve_connection(stream, addr, capacity, server_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
                if server_tx.is_closed() {
                    break;
                }
            }
        });
    }

    fn handle_message(&mut self, message: ServerMessage) -> Result<(), ContextError> {
        let shared = self.context.get_mut()?;
        match message {
            ServerMessage::Connected {
                addr,
                sender,
                reply,
            } => {
                let connection = shared.clients.add_client(addr, sender);
                if connection.is_none() {
                    warn!("Rejected connection from {}: server full", addr);
                }
                if reply.send(connection).is_err() {
                    debug!("Connection task for {} went away before registration", addr);
                }
            }
            ServerMessage::FrameReceived { connection, text } => {
                if !shared.clients.touch(connection) {
                    debug!("Dropping frame from closed connection {}", connection);
                    return Ok(());
                }
                let mut outbox = Outbox::new();
                // Invariant violations are logged by the listener and queue nothing.
                if let Ok(outcome) = router::route_text(&mut shared.game, connection, &text, &mut outbox) {
                    debug!("Connection {}: {:?}", connection, outcome);
                }
                deliver(shared, outbox);
            }
            ServerMessage::Disconnected { connection } => {
                if shared.clients.remove_client(&connection) {
                    let mut outbox = Outbox::new();
                    player::disconnect(&mut shared.game, connection, &mut outbox);
                    deliver(shared, outbox);
                }
            }
            ServerMessage::Shutdown => {}
        }
        Ok(())
    }

    fn tick(&mut self, dt: f32) -> Result<(), ContextError> {
        let shared = self.context.get_mut()?;
        let has_audience = !shared.clients.is_empty();
        let mut outbox = Outbox::new();
        if let Err(err) = simulation::advance(&mut shared.game, dt, has_audience, &mut outbox) {
            error!("Simulation produced an invalid frame: {}", err);
            outbox.clear();
        }
        deliver(shared, outbox);

        if shared.game.tick % 300 == 0 && has_audience {
            debug!(
                "Tick {}: {} connections, {} players, {} asteroids, {} projectiles, {} pickups",
                shared.game.tick,
                shared.clients.len(),
                shared.game.player_count(),
                shared.game.asteroid_count(),
                shared.game.projectile_count(),
                shared.game.pickup_count()
            );
        }
        Ok(())
    }

    /// Idle connections are dropped exactly like closed ones.
    fn expire_idle(&mut self) -> Result<(), ContextError> {
        let shared = self.context.get_mut()?;
        for connection in shared.clients.check_timeouts() {
            let mut outbox = Outbox::new();
            player::disconnect(&mut shared.game, connection, &mut outbox);
            deliver(shared, outbox);
        }
        Ok(())
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let listener = self.listener.take().ok_or(ServerError::AlreadyRunning)?;
        self.spawn_acceptor(listener);

        let mut tick_interval = interval(self.config.tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut timeout_interval = interval(Duration::from_secs(1));
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                        Some(message) => self.handle_message(message)?,
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let mut dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;
                    if dt > MAX_TICK_DELTA {
                        warn!("Large tick delta ({:.3}s), capping to {:.3}s", dt, MAX_TICK_DELTA);
                        dt = MAX_TICK_DELTA;
                    }
                    self.tick(dt)?;
                },

                _ = timeout_interval.tick() => {
                    self.expire_idle()?;
                },
            }
        }

        self.context.destroy()?;
        Ok(())
    }
}

/// Serializes every queued frame once and hands it to each receiver's writer.
/// Transport failures are logged; state is never rolled back. A connection
/// whose queue is full is closed and its player leaves like on a disconnect.
fn deliver(shared: &mut Shared, outbox: Outbox) {
    let connections = shared.clients.ids();
    let (frames, events) = outbox.into_parts();
    let mut stalled = BTreeSet::new();

    for outgoing in frames {
        let text = match outgoing.frame.to_text() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize {}: {}", outgoing.frame.event, e);
                continue;
            }
        };
        for connection in outgoing.target.resolve(&connections) {
            if stalled.contains(&connection) {
                continue;
            }
            match shared.clients.send(connection, text.clone()) {
                Ok(()) => {}
                Err(TransportError::Backpressure(id)) => {
                    warn!("Connection {} stopped reading, dropping it", id);
                    stalled.insert(id);
                }
                Err(e) => warn!("Failed to send {}: {}", outgoing.frame.event, e),
            }
        }
    }

    for event in events {
        shared.bus.publish(event);
    }

    for connection in stalled {
        if shared.clients.remove_client(&connection) {
            let mut outbox = Outbox::new();
            player::disconnect(&mut shared.game, connection, &mut outbox);
            deliver(shared, outbox);
        }
    }
}

/// Upgrades one TCP stream and shuttles frames between it and the main loop.
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    capacity: usize,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let socket = match accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut sink, mut source) = socket.split();

    let (sender, mut outbound) = mpsc::channel::<String>(capacity);
    let (reply, registered) = oneshot::channel();
    if server_tx
        .send(ServerMessage::Connected {
            addr,
            sender,
            reply,
        })
        .is_err()
    {
        return;
    }
    let connection = match registered.await {
        Ok(Some(connection)) => connection,
        _ => {
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    // Writer: ends once the main loop drops this connection's sender.
    tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = sink.send(Message::text(text)).await {
                debug!("Write to connection {} failed: {}", connection, e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let text = text.as_str().to_string();
                if server_tx
                    .send(ServerMessage::FrameReceived { connection, text })
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read from connection {} failed: {}", connection, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::Disconnected { connection });
}

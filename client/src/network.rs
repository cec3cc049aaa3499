use crate::game::{ClientError, ClientGame, Status};
use crate::input::{InputSource, WanderInput};
use futures_util::{Sink, SinkExt, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

const MAX_TICK_DELTA: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub name: String,
    pub tick_rate: u32,
    /// Stop after this many ticks; run until the server closes otherwise.
    pub ticks: Option<u64>,
    pub respawn_delay: Duration,
    /// Simulated latency added to each direction, in milliseconds.
    pub fake_ping_ms: u64,
    pub seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080".to_string(),
            name: "pilot".to_string(),
            tick_rate: 30,
            ticks: None,
            respawn_delay: Duration::from_secs(3),
            fake_ping_ms: 0,
            seed: None,
        }
    }
}

impl ClientConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }

    fn one_way_latency(&self) -> Duration {
        Duration::from_millis(self.fake_ping_ms / 2)
    }
}

/// Totals for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientReport {
    pub ticks: u64,
    pub frames_sent: u64,
    pub frames_received: u64,
    /// Server frames that failed validation or routing.
    pub rejected: u64,
    pub deaths: u32,
    pub joins: u32,
}

pub struct Client {
    config: ClientConfig,
    game: ClientGame,
    input: Box<dyn InputSource>,
}

impl Client {
    /// Headless client flown by a wandering bot.
    pub fn new(config: ClientConfig) -> Self {
        let input = Box::new(WanderInput::new(config.seed));
        Self::with_parts(config, ClientGame::headless(), input)
    }

    pub fn with_parts(config: ClientConfig, game: ClientGame, input: Box<dyn InputSource>) -> Self {
        Self { config, game, input }
    }

    pub fn game(&self) -> &ClientGame {
        &self.game
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn flush<S>(&mut self, sink: &mut S, report: &mut ClientReport) -> Result<(), ClientError>
    where
        S: Sink<Message, Error = WsError> + Unpin,
    {
        let frames = self.game.drain_outbound();
        if frames.is_empty() {
            return Ok(());
        }
        let latency = self.config.one_way_latency();
        if !latency.is_zero() {
            sleep(latency).await;
        }
        for frame in frames {
            sink.feed(Message::text(frame.to_text()?)).await?;
            report.frames_sent += 1;
        }
        sink.flush().await?;
        Ok(())
    }

    /// Joins, then ticks the local simulation and applies server frames until
    /// the tick limit is reached or the server goes away. A dead player
    /// rejoins after `respawn_delay`.
    pub async fn run(&mut self) -> Result<ClientReport, ClientError> {
        info!("Connecting to {}", self.config.server_url);
        let (socket, _) = connect_async(self.config.server_url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();
        let mut report = ClientReport::default();

        self.game.join(&self.config.name)?;
        report.joins += 1;
        self.flush(&mut sink, &mut report).await?;

        let mut ticker = interval(self.config.tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();
        let mut dead_since: Option<Instant> = None;

        loop {
            tokio::select! {
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        report.frames_received += 1;
                        let latency = self.config.one_way_latency();
                        if !latency.is_zero() {
                            sleep(latency).await;
                        }
                        if let Err(e) = self.game.apply_text(text.as_str()) {
                            report.rejected += 1;
                            warn!("Dropping server frame: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                },

                _ = ticker.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32().min(MAX_TICK_DELTA);
                    last_tick = now;

                    let input = self.input.poll(dt);
                    self.game.tick(dt, input)?;
                    let contacts = self.game.detect_collisions()?;
                    if contacts > 0 {
                        debug!("Reported {} contacts", contacts);
                    }

                    if self.game.status() == Status::Dead {
                        let since = *dead_since.get_or_insert(now);
                        if now.duration_since(since) >= self.config.respawn_delay {
                            info!("Rejoining as {}", self.config.name);
                            self.game.join(&self.config.name)?;
                            report.joins += 1;
                            dead_since = None;
                        }
                    } else {
                        dead_since = None;
                    }

                    self.flush(&mut sink, &mut report).await?;
                    report.ticks += 1;
                    if self.config.ticks.is_some_and(|limit| report.ticks >= limit) {
                        break;
                    }
                }
            }
        }

        if let Err(e) = sink.send(Message::Close(None)).await {
            debug!("Close frame not delivered: {}", e);
        }
        report.deaths = self.game.deaths();
        info!(
            "Session over: {} ticks, {} sent, {} received, {} rejected, {} deaths",
            report.ticks, report.frames_sent, report.frames_received, report.rejected, report.deaths
        );
        Ok(report)
    }
}

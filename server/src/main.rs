use arena_server::{DomainEvent, GameConfig, Server, ServerConfig, ServerMessage};
use clap::Parser;
use log::{info, warn};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "30")]
    tick_rate: u32,
    /// Maximum number of simultaneous connections
    #[clap(short, long, default_value = "32")]
    max_clients: usize,
    /// Seconds without a frame before a connection is dropped
    #[clap(long, default_value = "30")]
    idle_timeout_secs: u64,
    /// Maximum number of live asteroids
    #[clap(long, default_value = "12")]
    max_asteroids: usize,
    /// Seed for the world RNG; random when omitted
    #[clap(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            tick_rate: self.tick_rate,
            max_clients: self.max_clients,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            game: GameConfig {
                max_asteroids: self.max_asteroids,
                seed: self.seed,
                ..GameConfig::default()
            },
            ..ServerConfig::default()
        }
    }
}

/// Logs domain events until the bus closes.
async fn log_events(mut events: broadcast::Receiver<DomainEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => info!("{:?}", event),
            Err(RecvError::Lagged(skipped)) => warn!("Event log skipped {} events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut server = Server::new(args.into_config()).await?;

    tokio::spawn(log_events(server.subscribe()?));

    let shutdown = server.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = shutdown.send(ServerMessage::Shutdown);
        }
    });

    server.run().await?;
    Ok(())
}

use arena_client::{Client, ClientConfig};
use clap::Parser;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server WebSocket URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Player name
    #[arg(short = 'n', long, default_value = "pilot")]
    name: String,

    /// Local simulation rate in Hz
    #[arg(short = 't', long, default_value = "30")]
    tick_rate: u32,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Seconds to wait before rejoining after death
    #[arg(long, default_value = "3")]
    respawn_secs: u64,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Seed for the bot pilot
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        ClientConfig {
            server_url: self.server,
            name: self.name,
            tick_rate: self.tick_rate,
            ticks: self.ticks,
            respawn_delay: Duration::from_secs(self.respawn_secs),
            fake_ping_ms: self.fake_ping,
            seed: self.seed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }

    let mut client = Client::new(args.into_config());
    let report = client.run().await?;
    info!("Final report: {:?}", report);

    Ok(())
}

use clap::Parser;
use host::network::{Server, ServerMessage};
use log::{error, info};
use roster::config::DEFAULT_SOUND_COMMAND_COOLDOWN;
use roster::LocalConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Host IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "20")]
    tick_rate: u32,
    /// Maximum number of peers, not counting the host
    #[clap(short, long, default_value = "16")]
    max_clients: usize,
    /// Name of the local host client
    #[clap(short, long, default_value = "Host")]
    name: String,
    /// Display nickname of the local host client
    #[clap(long, default_value = "")]
    nick: String,
    /// Seconds of silence after which a peer is removed
    #[clap(long, default_value = "5")]
    idle_timeout: u64,
    /// Minimum seconds between two sound commands of one client
    #[clap(long)]
    sound_cooldown: Option<u64>,
    /// Ignore sound commands from other clients
    #[clap(long)]
    mute_sound_commands: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let tick_rate = args.tick_rate.max(1);
    let tick_duration = Duration::from_secs_f64(1.0 / tick_rate as f64);

    let mut config = LocalConfig::with_names(&args.name, &args.nick);
    config.sound_command_cooldown = args
        .sound_cooldown
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SOUND_COMMAND_COOLDOWN);
    config.mute_sound_commands = args.mute_sound_commands;

    let address = format!("{}:{}", args.host, args.port);
    info!(
        "Starting host on {} at {}Hz for up to {} peers",
        address, tick_rate, args.max_clients
    );

    let mut server = Server::new(
        &address,
        tick_duration,
        args.max_clients,
        Duration::from_secs(args.idle_timeout),
        config,
    )
    .await?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
            if let Err(e) = shutdown.send(ServerMessage::Shutdown) {
                error!("Failed to signal shutdown: {}", e);
            }
        }
    });

    server.run().await
}

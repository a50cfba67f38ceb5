use clap::Parser;
use log::info;
use peer::network::Peer;
use peer::session::ConnectionState;
use roster::LocalConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to join
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Name announced to the host
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,

    /// Display nickname
    #[arg(long, default_value = "")]
    nick: String,

    /// Mark ourselves lobby ready right after joining
    #[arg(short = 'r', long)]
    ready: bool,

    /// Heartbeat interval in milliseconds
    #[arg(long, default_value = "1000")]
    heartbeat_ms: u64,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting peer...");
    info!("Joining: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }

    let config = LocalConfig::with_names(&args.name, &args.nick);
    let mut peer = Peer::new(
        &args.server,
        config,
        Duration::from_millis(args.heartbeat_ms.max(1)),
        args.fake_ping,
    )
    .await?;
    peer.set_ready_on_join(args.ready);

    peer.run(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;

    match peer.session().state() {
        ConnectionState::Rejected(reason) => info!("Join rejected: {}", reason),
        ConnectionState::Removed(reason) => info!("Removed from session: {}", reason),
        _ => info!("Left session"),
    }

    Ok(())
}

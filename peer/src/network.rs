use crate::session::PeerSession;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use roster::{LocalConfig, Packet, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

pub struct Peer {
    socket: UdpSocket,
    host_addr: SocketAddr,
    session: PeerSession,

    heartbeat_interval: Duration,
    fake_ping_ms: u64,
    ready_on_join: bool,
}

impl Peer {
    pub async fn new(
        host_addr: &str,
        config: LocalConfig,
        heartbeat_interval: Duration,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let host_addr = host_addr.parse()?;
        let session = PeerSession::new(config)?;

        Ok(Peer {
            socket,
            host_addr,
            session,
            heartbeat_interval,
            fake_ping_ms,
            ready_on_join: false,
        })
    }

    /// Reports lobby readiness as soon as the host accepts us
    pub fn set_ready_on_join(&mut self, ready: bool) {
        self.ready_on_join = ready;
    }

    pub fn session(&self) -> &PeerSession {
        &self.session
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Joining session at {}...", self.host_addr);

        if let Some(packet) = self.session.join_packet() {
            self.send_packet(&packet).await?;
        }
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        if self.fake_ping_ms > 0 {
            sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
        }

        let data = serialize(packet)?;
        self.socket.send_to(&data, self.host_addr).await?;
        Ok(())
    }

    async fn handle_packet(&mut self, packet: Packet) {
        let was_joined = self.session.client_id().is_some();
        self.session.handle_packet(packet);

        if !was_joined && self.ready_on_join {
            if let Some(packet) = self.session.lobby_ready_packet(true) {
                if let Err(e) = self.send_packet(&packet).await {
                    error!("Error sending lobby ready: {}", e);
                }
            }
        }
    }

    /// Runs until the host removes or rejects us, or `shutdown` resolves
    pub async fn run(
        &mut self,
        shutdown: impl std::future::Future<Output = ()>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut heartbeat_interval = interval(self.heartbeat_interval);
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        tokio::pin!(shutdown);

        while !self.session.is_finished() {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, addr)) => {
                            if addr != self.host_addr {
                                warn!("Ignoring packet from {}", addr);
                                continue;
                            }
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }

                            match deserialize::<Packet>(&buffer[0..len]) {
                                Ok(packet) => self.handle_packet(packet).await,
                                Err(_) => warn!("Failed to deserialize packet from host"),
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = heartbeat_interval.tick() => {
                    // Keep retrying the join until the host answers
                    let packet = match self.session.client_id() {
                        Some(_) => Some(Packet::Heartbeat),
                        None => self.session.join_packet(),
                    };
                    if let Some(packet) = packet {
                        if let Err(e) = self.send_packet(&packet).await {
                            error!("Error sending heartbeat: {}", e);
                        }
                    }
                },

                _ = &mut shutdown => {
                    info!("Leaving session");
                    break;
                },
            }
        }

        if self.session.client_id().is_some() && !self.session.is_finished() {
            if let Err(e) = self.send_packet(&Packet::Leave).await {
                error!("Error sending leave: {}", e);
            }
        }

        Ok(())
    }
}

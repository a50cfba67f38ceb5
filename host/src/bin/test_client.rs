use bincode::{deserialize, serialize};
use roster::{ClientIdentity, Packet, CLIENT_ID_UNKNOWN, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = serialize(packet)?;
    println!("Sending {:?}", packet);
    socket.send_to(&data, addr).await?;
    Ok(())
}

// Prints everything the host sends for a while
async fn drain(socket: &UdpSocket, buf: &mut [u8], wait: Duration) {
    while let Ok(Ok((len, _))) = timeout(wait, socket.recv_from(buf)).await {
        match deserialize::<Packet>(&buf[0..len]) {
            Ok(Packet::RosterUpdate { snapshot }) => {
                println!("Roster update with {} clients:", snapshot.len());
                for identity in snapshot.clients() {
                    println!("  {} ready={}", identity, identity.is_lobby_ready());
                }
            }
            Ok(other) => println!("Received packet: {:?}", other),
            Err(e) => println!("Failed to deserialize packet: {}", e),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Test client bound to {}", socket.local_addr()?);

    let host_addr = "127.0.0.1:8080".parse::<SocketAddr>()?;

    let join = Packet::Join {
        version: PROTOCOL_VERSION,
        identity: ClientIdentity::new(CLIENT_ID_UNKNOWN, "TestClient", "tester"),
    };
    send(&socket, &join, host_addr).await?;

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    println!("Waiting for host response...");
    let (len, addr) = socket.recv_from(&mut buf).await?;
    println!("Received {} bytes from {}", len, addr);

    match deserialize::<Packet>(&buf[0..len]) {
        Ok(Packet::Accepted { client_id }) => {
            println!("Joined with client ID: {}", client_id);
            drain(&socket, &mut buf, Duration::from_millis(500)).await;

            // Toggle lobby readiness a few times
            for i in 0..4 {
                send(&socket, &Packet::SetLobbyReady { ready: i % 2 == 0 }, host_addr).await?;
                drain(&socket, &mut buf, Duration::from_millis(200)).await;
                send(&socket, &Packet::Heartbeat, host_addr).await?;
                sleep(Duration::from_millis(500)).await;
            }

            send(&socket, &Packet::Leave, host_addr).await?;
            drain(&socket, &mut buf, Duration::from_millis(500)).await;
            println!("Test client finished");
        }
        Ok(Packet::Rejected { reason }) => println!("Join rejected: {}", reason),
        Ok(other) => println!("Expected Accepted but got: {:?}", other),
        Err(e) => println!("Failed to deserialize response: {}", e),
    }

    Ok(())
}

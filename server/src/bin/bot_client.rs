//! Headless client that joins the arena and steers in a square.
//!
//! Useful for smoke-testing a running server: it connects, joins with the
//! default body, changes heading every few updates and logs what it sees.

use clap::Parser;
use log::{info, warn};
use shared::{default_body, Heading, Packet, SessionId, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3333")]
    server: String,

    /// Number of world updates to receive before leaving
    #[arg(short = 'n', long, default_value = "100")]
    updates: u32,

    /// Updates between turns
    #[arg(short = 't', long, default_value = "10")]
    turn_every: u32,
}

const TURNS: [Heading; 4] = [Heading::Down, Heading::Left, Heading::Up, Heading::Right];

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    server_addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&packet.encode()?, server_addr).await?;
    Ok(())
}

async fn recv(
    socket: &UdpSocket,
    buf: &mut [u8],
) -> Result<Packet, Box<dyn std::error::Error>> {
    let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(buf)).await??;
    Ok(Packet::decode(&buf[..len])?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let server_addr: SocketAddr = args.server.parse()?;
    info!("Client socket bound to {}", socket.local_addr()?);

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    send(
        &socket,
        &Packet::Connect {
            client_version: PROTOCOL_VERSION,
        },
        server_addr,
    )
    .await?;

    let client_id: SessionId = loop {
        match recv(&socket, &mut buf).await? {
            Packet::Connected { client_id } => break client_id,
            Packet::Disconnected { reason } => {
                warn!("Server refused connection: {}", reason);
                return Ok(());
            }
            other => warn!("Unexpected packet while connecting: {:?}", other),
        }
    };
    info!("Connected with session id {}", client_id);

    send(
        &socket,
        &Packet::Join {
            body: default_body(),
        },
        server_addr,
    )
    .await?;

    let mut heartbeat = interval(Duration::from_secs(1));
    let mut updates = 0;
    let mut turn = 0;

    while updates < args.updates {
        tokio::select! {
            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat, server_addr).await?;
            }
            packet = recv(&socket, &mut buf) => {
                match packet? {
                    Packet::Init { world } => {
                        info!(
                            "Init at tick {}: {} snakes, {} fruits",
                            world.tick,
                            world.snakes.len(),
                            world.fruits.len()
                        );
                    }
                    Packet::Update { world } => {
                        updates += 1;
                        if let Some(me) = world.snake(client_id) {
                            info!(
                                "Tick {}: head ({}, {}), length {}",
                                world.tick,
                                me.head().row,
                                me.head().col,
                                me.len()
                            );
                        }
                        if updates % args.turn_every.max(1) == 0 {
                            let heading = TURNS[turn % TURNS.len()];
                            turn += 1;
                            send(&socket, &Packet::Move { heading }, server_addr).await?;
                        }
                    }
                    Packet::JoinRejected { reason } => {
                        warn!("Join rejected: {}", reason);
                        break;
                    }
                    Packet::Disconnected { reason } => {
                        warn!("Disconnected: {}", reason);
                        return Ok(());
                    }
                    other => warn!("Unexpected packet: {:?}", other),
                }
            }
        }
    }

    send(&socket, &Packet::Disconnect, server_addr).await?;
    info!("Bot client finished");

    Ok(())
}

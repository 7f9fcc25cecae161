//! Outbound fan-out of world snapshots
//!
//! The world owner only queues messages here; a dedicated task does the
//! encoding and socket writes, so a slow send never holds up a tick. Delivery
//! is best effort: failures are logged and the packet is dropped.

use crate::client_manager::ClientManager;
use log::{error, warn};
use shared::{Packet, WorldSnapshot, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Messages sent from the game loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// Handle for queueing outbound packets
#[derive(Debug, Clone)]
pub struct Broadcaster {
    game_tx: mpsc::UnboundedSender<GameMessage>,
}

impl Broadcaster {
    pub fn new(game_tx: mpsc::UnboundedSender<GameMessage>) -> Self {
        Self { game_tx }
    }

    /// Spawns the sender task and returns a handle feeding it.
    pub fn spawn(
        socket: Arc<UdpSocket>,
        clients: Arc<RwLock<ClientManager>>,
    ) -> (Self, JoinHandle<()>) {
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_sender(socket, clients, game_rx));
        (Self::new(game_tx), handle)
    }

    /// Queues a packet for a single address
    pub fn send(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Delivers the current world to exactly one session
    pub fn unicast_init(&self, addr: SocketAddr, world: WorldSnapshot) {
        self.send(Packet::Init { world }, addr);
    }

    /// Delivers the current world to every connected session
    pub fn broadcast(&self, world: WorldSnapshot) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket {
            packet: Packet::Update { world },
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }
}

async fn run_sender(
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    mut game_rx: mpsc::UnboundedReceiver<GameMessage>,
) {
    while let Some(message) = game_rx.recv().await {
        match message {
            GameMessage::SendPacket { packet, addr } => {
                let Some(data) = encode(&packet) else {
                    continue;
                };
                if let Err(e) = socket.send_to(&data, addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                }
            }
            GameMessage::BroadcastPacket { packet } => {
                let Some(data) = encode(&packet) else {
                    continue;
                };
                let client_addrs = {
                    let clients_guard = clients.read().await;
                    clients_guard.get_client_addrs()
                };

                for (client_id, addr) in client_addrs {
                    if let Err(e) = socket.send_to(&data, addr).await {
                        error!("Failed to send to client {}: {}", client_id, e);
                    }
                }
            }
        }
    }
}

fn encode(packet: &Packet) -> Option<Vec<u8>> {
    match packet.encode() {
        Ok(data) if data.len() <= MAX_DATAGRAM_SIZE => Some(data),
        Ok(data) => {
            warn!("Dropping {} byte packet, too large for one datagram", data.len());
            None
        }
        Err(e) => {
            error!("Failed to encode packet: {}", e);
            None
        }
    }
}

//! Server network layer handling UDP sessions and the simulation loop
//!
//! [`Server::run`] is the only place the world is touched. It owns the
//! [`GameState`] and the fruit spawner outright and handles one event at a
//! time: either an inbound packet forwarded by the receiver task, a timeout
//! reported by the timeout checker, or a tick of the fixed interval. Joins,
//! heading changes and leaves can therefore never interleave with a tick.

use crate::broadcast::Broadcaster;
use crate::client_manager::ClientManager;
use crate::config::GameConfig;
use crate::error::{Result, ServerError};
use crate::game::GameState;
use crate::spawner::FruitSpawner;
use log::{debug, error, info, warn};
use shared::{
    validate_body, Heading, Packet, Segment, SessionId, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: SessionId },
    Shutdown,
}

/// Main server coordinating networking and game simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,
    spawner: FruitSpawner,
    config: GameConfig,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    broadcaster: Option<Broadcaster>,
}

impl Server {
    pub async fn new(addr: &str, config: GameConfig) -> Result<Self> {
        if config.grid.cell_size <= 0 || config.grid.rows() <= 0 || config.grid.cols() <= 0 {
            return Err(ServerError::InvalidConfig(format!(
                "board {}x{} with cell size {} has no cells",
                config.grid.width, config.grid.height, config.grid.cell_size
            )));
        }
        if config.tick_duration.is_zero() {
            return Err(ServerError::InvalidConfig("tick duration must be positive".into()));
        }

        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| ServerError::InvalidAddress(addr.to_string()))?;
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let mut spawner = match config.seed {
            Some(seed) => FruitSpawner::seeded(config.grid, seed),
            None => FruitSpawner::new(config.grid),
        };
        let game_state = GameState::new(&config, &mut spawner);
        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout,
            ))),
            game_state,
            spawner,
            config,
            server_tx,
            server_rx,
            broadcaster: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Sender that can ask a running server to stop
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match Packet::decode(&buffer[..len]) {
                        Ok(packet) => {
                            if server_tx
                                .send(ServerMessage::PacketReceived { packet, addr })
                                .is_err()
                            {
                                debug!("Main loop gone, stopping receiver");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to decode packet from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let period = (self.config.client_timeout / 4).max(Duration::from_millis(10));

        tokio::spawn(async move {
            let mut interval = interval(period);

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if server_tx
                        .send(ServerMessage::ClientTimeout { client_id })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    fn broadcaster(&self) -> Option<&Broadcaster> {
        self.broadcaster.as_ref()
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Some(broadcaster) = self.broadcaster() {
            broadcaster.send(packet, addr);
        }
    }

    fn broadcast_world(&self) {
        if let Some(broadcaster) = self.broadcaster() {
            broadcaster.broadcast(self.game_state.snapshot());
        }
    }

    /// Dispatches one inbound packet
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let client_id = {
            let mut clients = self.clients.write().await;
            let found = clients.find_client_by_addr(addr);
            if let Some(id) = found {
                clients.touch(id);
            }
            found
        };

        match packet {
            Packet::Connect { client_version } => {
                self.handle_connect(client_version, client_id, addr).await;
            }
            Packet::Join { body } => match client_id {
                Some(id) => self.join(id, addr, body),
                None => debug!("Join from unconnected address {}", addr),
            },
            Packet::Move { heading } => match client_id {
                Some(id) => self.change_heading(id, heading),
                None => debug!("Move from unconnected address {}", addr),
            },
            Packet::Heartbeat => {}
            Packet::Disconnect => {
                if let Some(id) = client_id {
                    let removed = self.clients.write().await.remove_client(id);
                    if removed {
                        self.leave(id);
                    }
                }
            }
            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    async fn handle_connect(
        &mut self,
        client_version: u32,
        existing: Option<SessionId>,
        addr: SocketAddr,
    ) {
        info!("Client connecting from {} (version: {})", addr, client_version);

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: format!(
                        "Protocol version mismatch: server speaks {}, client sent {}",
                        PROTOCOL_VERSION, client_version
                    ),
                },
                addr,
            );
            return;
        }

        if let Some(existing_id) = existing {
            info!("Removing existing client {} from {}", existing_id, addr);
            let removed = self.clients.write().await.remove_client(existing_id);
            if removed {
                self.leave(existing_id);
            }
        }

        let client_id = self.clients.write().await.add_client(addr);
        match client_id {
            Some(client_id) => {
                self.send_packet(Packet::Connected { client_id }, addr);
                if let Some(broadcaster) = self.broadcaster() {
                    broadcaster.unicast_init(addr, self.game_state.snapshot());
                }
            }
            None => {
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
            }
        }
    }

    /// Puts a new snake for `client_id` into the world
    ///
    /// The joining session gets the full world first, then everyone gets the
    /// update. A body that fails validation is refused and the world is left
    /// as it was.
    fn join(&mut self, client_id: SessionId, addr: SocketAddr, body: Vec<Segment>) {
        if let Err(e) = validate_body(self.game_state.grid(), &body) {
            warn!("Rejected join from client {}: {}", client_id, e);
            self.send_packet(
                Packet::JoinRejected {
                    reason: e.to_string(),
                },
                addr,
            );
            return;
        }

        let added = self.game_state.add_snake(client_id, body);
        if let Some(broadcaster) = self.broadcaster() {
            broadcaster.unicast_init(addr, self.game_state.snapshot());
        }
        if added {
            self.broadcast_world();
        }
    }

    /// Takes effect on the next tick; unknown sessions are ignored
    fn change_heading(&mut self, client_id: SessionId, heading: Heading) {
        if !self.game_state.set_heading(client_id, heading) {
            debug!("Ignoring move from client {} without a snake", client_id);
        }
    }

    /// Drops the session's snake and tells the remaining sessions
    ///
    /// Callers must have removed the session from the roster first.
    fn leave(&mut self, client_id: SessionId) {
        self.game_state.remove_snake(client_id);
        self.broadcast_world();
    }

    /// Advances the world one tick and broadcasts the result
    fn tick(&mut self) {
        let report = self.game_state.tick(&mut self.spawner);
        for (client_id, fruit) in &report.consumed {
            debug!(
                "Tick {}: snake {} ate fruit at ({}, {})",
                report.tick, client_id, fruit.row, fruit.col
            );
        }
        if report.tick % 100 == 0 {
            debug!(
                "Tick {}: {} snakes, {} fruits",
                report.tick,
                self.game_state.snakes.len(),
                self.game_state.fruits.len()
            );
        }
        self.broadcast_world();
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<()> {
        let (broadcaster, _sender) =
            Broadcaster::spawn(Arc::clone(&self.socket), Arc::clone(&self.clients));
        self.broadcaster = Some(broadcaster);
        self.spawn_network_receiver();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.config.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately
        tick_interval.tick().await;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        }
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.leave(client_id);
                        }
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                }

                _ = tick_interval.tick() => {
                    self.tick();
                }
            }
        }

        Ok(())
    }
}

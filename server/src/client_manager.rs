//! Session roster for the multiplayer server
//!
//! This module tracks which network address belongs to which session:
//! - Session lifecycle (connect, disconnect, timeout)
//! - Liveness tracking so silent clients are dropped
//! - Capacity limits and address lookup for routing replies
//!
//! Removal always goes through [`ClientManager::remove_client`], and only the
//! call that actually removes a session reports `true`. The server uses that to
//! run a session's leave handling exactly once.

use log::info;
use shared::SessionId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected session
#[derive(Debug)]
pub struct Client {
    /// Unique session identifier assigned by the server
    pub id: SessionId,
    /// Network address for sending replies
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: SessionId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Marks the client as recently active
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// True when nothing has been heard from the client within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected sessions
///
/// Ids start at 1 and are never handed out twice, so a late packet from a
/// closed session can never be mistaken for a newer one.
#[derive(Debug)]
pub struct ClientManager {
    /// Connected clients indexed by their session id
    clients: HashMap<SessionId, Client>,
    /// Next available id for new connections
    next_client_id: SessionId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Registers a new session
    ///
    /// Returns `None` if the server is at capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<SessionId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Removes a session. Returns false if it was already gone.
    pub fn remove_client(&mut self, client_id: SessionId) -> bool {
        if let Some(client) = self.clients.remove(&client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<SessionId> {
        self.clients
            .values()
            .find(|client| client.addr == addr)
            .map(|client| client.id)
    }

    pub fn addr_of(&self, client_id: SessionId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Refreshes a session's liveness. Returns false for unknown ids.
    pub fn touch(&mut self, client_id: SessionId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.touch();
                true
            }
            None => false,
        }
    }

    /// Removes every session that has been silent longer than the timeout
    ///
    /// Returns the removed ids so the caller can run their leave handling.
    pub fn check_timeouts(&mut self) -> Vec<SessionId> {
        let timeout = self.timeout;
        let timed_out: Vec<SessionId> = self
            .clients
            .values()
            .filter(|client| client.is_timed_out(timeout))
            .map(|client| client.id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    /// All (id, address) pairs, used for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(SessionId, SocketAddr)> {
        self.clients
            .values()
            .map(|client| (client.id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

//! # Snake Arena Server Library
//!
//! This library provides the authoritative server for a multiplayer grid snake
//! game. It owns the canonical world, applies client commands, advances the
//! simulation on a fixed tick, and broadcasts the full world to every session.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Clients never simulate. They send a join request with their starting body
//! and heading changes; the server moves every snake, resolves fruit
//! consumption and pushes the result back out.
//!
//! ### Session Management
//! Handles the lifecycle of client sessions:
//! - Connection, protocol version check and capacity limit
//! - Join validation and snake creation
//! - Heading changes from known sessions
//! - Disconnection and timeout cleanup, exactly once per session
//!
//! ### State Broadcasting
//! A joining session receives the full current world, and every session
//! receives the full world after each tick, join and leave.
//!
//! ## Architecture Design
//!
//! ### Single-Owner Event Loop
//! The world is owned by one task that processes inbound commands and ticks
//! one at a time. Network receive, network send and timeout detection run as
//! separate tasks that talk to it over channels, so no lock ever guards the
//! world and no socket write ever runs inside a tick.
//!
//! ### UDP-Based Communication
//! Packets are `bincode`-encoded [`shared::Packet`] values, one per datagram.
//! State updates are full snapshots, so a lost datagram is repaired by the
//! next tick.
//!
//! ## Module Organization
//!
//! - `config`: runtime settings, defaulting to the shared constants
//! - `spawner`: random fruit placement
//! - `motion`: per-snake advance and growth rules
//! - `game`: the world store and the per-tick update
//! - `client_manager`: the session roster and timeout detection
//! - `broadcast`: outbound unicast and fan-out
//! - `network`: the UDP server and main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::GameConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:3333", GameConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod error;
pub mod game;
pub mod motion;
pub mod network;
pub mod spawner;

//! Runtime configuration for the authoritative server
//!
//! Every field defaults to the constants in `shared`, which clients also compile
//! against. Overriding them is meant for testing and local experiments; a client
//! built with the defaults will render a board of the default size.

use shared::{
    Grid, Position, BOARD_HEIGHT, BOARD_WIDTH, CELL_SIZE, CLIENT_TIMEOUT_SECS,
    INITIAL_FRUIT_COUNT, RESPAWN_POSITION, TICK_MS,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed interval between simulation ticks
    pub tick_duration: Duration,
    pub grid: Grid,
    /// Number of fruits kept on the board at all times
    pub fruit_count: usize,
    /// Where a snake's head lands after it leaves the board
    pub respawn: Position,
    pub max_clients: usize,
    /// Silence after which a session counts as disconnected
    pub client_timeout: Duration,
    /// Seed for the fruit spawner; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_duration: Duration::from_millis(TICK_MS),
            grid: Grid::new(BOARD_WIDTH, BOARD_HEIGHT, CELL_SIZE),
            fruit_count: INITIAL_FRUIT_COUNT,
            respawn: RESPAWN_POSITION,
            max_clients: 32,
            client_timeout: Duration::from_secs(CLIENT_TIMEOUT_SECS),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shared_constants() {
        let config = GameConfig::default();
        assert_eq!(config.tick_duration, Duration::from_millis(100));
        assert_eq!(config.grid, Grid::default());
        assert_eq!(config.fruit_count, 5);
        assert_eq!(config.respawn, Position::new(50, 50));
        assert_eq!(config.client_timeout, Duration::from_secs(5));
        assert!(config.seed.is_none());
    }
}

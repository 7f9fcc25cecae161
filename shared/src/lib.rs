use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TICK_MS: u64 = 100;
pub const BOARD_WIDTH: i32 = 1200;
pub const BOARD_HEIGHT: i32 = 950;
pub const CELL_SIZE: i32 = 10;
pub const INITIAL_FRUIT_COUNT: usize = 5;
pub const RESPAWN_POSITION: Position = Position { row: 50, col: 50 };
pub const INITIAL_BODY_LEN: usize = 5;
pub const MAX_JOIN_SEGMENTS: usize = 256;
pub const PROTOCOL_VERSION: u32 = 1;
pub const CLIENT_TIMEOUT_SECS: u64 = 5;
/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Identifies one connected session, and the snake it controls.
pub type SessionId = u32;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// Unit step as `(d_row, d_col)`. Rows grow downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (-1, 0),
            Heading::Down => (1, 0),
            Heading::Left => (0, -1),
            Heading::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Moves `distance` units in `heading`.
    pub fn step(self, heading: Heading, distance: i32) -> Self {
        let (d_row, d_col) = heading.delta();
        Self {
            row: self.row + d_row * distance,
            col: self.col + d_col * distance,
        }
    }
}

/// Board dimensions. All coordinates on the board are multiples of `cell_size`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    pub cell_size: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            cell_size: CELL_SIZE,
        }
    }
}

impl Grid {
    pub fn new(width: i32, height: i32, cell_size: i32) -> Self {
        Self {
            width,
            height,
            cell_size,
        }
    }

    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
    }

    pub fn is_aligned(&self, pos: Position) -> bool {
        pos.row % self.cell_size == 0 && pos.col % self.cell_size == 0
    }

    /// Number of cell rows a fruit can be placed on.
    pub fn rows(&self) -> i32 {
        self.height / self.cell_size
    }

    pub fn cols(&self) -> i32 {
        self.width / self.cell_size
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub heading: Heading,
    pub row: i32,
    pub col: i32,
}

impl Segment {
    pub fn new(heading: Heading, row: i32, col: i32) -> Self {
        Self { heading, row, col }
    }

    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Snake {
    pub id: SessionId,
    /// Head first.
    pub body: Vec<Segment>,
    pub heading: Heading,
}

impl Snake {
    pub fn new(id: SessionId, body: Vec<Segment>) -> Self {
        Self {
            id,
            body,
            heading: Heading::Right,
        }
    }

    pub fn head(&self) -> Position {
        self.body[0].position()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Fruit {
    pub row: i32,
    pub col: i32,
}

impl Fruit {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}

/// Point-in-time copy of the whole world, as sent to clients.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub snakes: Vec<Snake>,
    pub fruits: Vec<Fruit>,
}

impl WorldSnapshot {
    pub fn snake(&self, id: SessionId) -> Option<&Snake> {
        self.snakes.iter().find(|snake| snake.id == id)
    }
}

/// The body every client joins with: five segments along row 50, heading right.
pub fn default_body() -> Vec<Segment> {
    (0..INITIAL_BODY_LEN as i32)
        .map(|i| {
            Segment::new(
                Heading::Right,
                RESPAWN_POSITION.row,
                RESPAWN_POSITION.col - i * CELL_SIZE,
            )
        })
        .collect()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("join body is empty")]
    EmptyBody,
    #[error("join body has {0} segments, limit is {}", MAX_JOIN_SEGMENTS)]
    TooLong(usize),
    #[error("segment {index} at ({row}, {col}) is outside the board")]
    OutOfBounds { index: usize, row: i32, col: i32 },
    #[error("segment {index} at ({row}, {col}) is not aligned to the cell size")]
    Misaligned { index: usize, row: i32, col: i32 },
}

/// Checks a client-supplied body before it enters the world.
pub fn validate_body(grid: &Grid, body: &[Segment]) -> Result<(), JoinError> {
    if body.is_empty() {
        return Err(JoinError::EmptyBody);
    }
    if body.len() > MAX_JOIN_SEGMENTS {
        return Err(JoinError::TooLong(body.len()));
    }
    for (index, segment) in body.iter().enumerate() {
        let pos = segment.position();
        if !grid.is_in_bounds(pos) {
            return Err(JoinError::OutOfBounds {
                index,
                row: pos.row,
                col: pos.col,
            });
        }
        if !grid.is_aligned(pos) {
            return Err(JoinError::Misaligned {
                index,
                row: pos.row,
                col: pos.col,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Join {
        body: Vec<Segment>,
    },
    Move {
        heading: Heading,
    },
    Heartbeat,
    Disconnect,

    Connected {
        client_id: SessionId,
    },
    /// Full world sent to a single session on connect and on join.
    Init {
        world: WorldSnapshot,
    },
    /// Full world sent to every session after each tick, join and leave.
    Update {
        world: WorldSnapshot,
    },
    JoinRejected {
        reason: String,
    },
    Disconnected {
        reason: String,
    },
}

impl Packet {
    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Packet> {
        bincode::deserialize(bytes)
    }
}

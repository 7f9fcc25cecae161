use crate::config::GameConfig;
use crate::motion;
use crate::spawner::FruitSpawner;
use log::{debug, info};
use shared::{Fruit, Grid, Heading, Position, Segment, SessionId, Snake, WorldSnapshot};

/// What happened during one tick, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Snakes that ate, in the order they ate, with the fruit they ate
    pub consumed: Vec<(SessionId, Fruit)>,
    /// Snakes whose head left the board and was respawned
    pub respawned: Vec<SessionId>,
}

/// The authoritative world: every snake and every fruit.
///
/// Snakes are kept in join order, which is also the order they are processed
/// in each tick. Mutation goes through `&mut self`, so whoever owns the value
/// is the single writer.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u64,
    pub snakes: Vec<Snake>,
    pub fruits: Vec<Fruit>,
    grid: Grid,
    respawn: Position,
}

impl GameState {
    /// Builds an empty world and seeds it with `config.fruit_count` fruits.
    pub fn new(config: &GameConfig, spawner: &mut FruitSpawner) -> Self {
        let fruits = (0..config.fruit_count).map(|_| spawner.spawn()).collect();

        Self {
            tick: 0,
            snakes: Vec::new(),
            fruits,
            grid: config.grid,
            respawn: config.respawn,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Adds a snake heading right. Returns false, leaving the world untouched,
    /// if the session already has one.
    pub fn add_snake(&mut self, id: SessionId, body: Vec<Segment>) -> bool {
        if self.snake(id).is_some() {
            debug!("Session {} already has a snake", id);
            return false;
        }

        let snake = Snake::new(id, body);
        info!("Added snake {} at ({}, {})", id, snake.head().row, snake.head().col);
        self.snakes.push(snake);
        true
    }

    pub fn remove_snake(&mut self, id: SessionId) -> bool {
        let before = self.snakes.len();
        self.snakes.retain(|snake| snake.id != id);
        let removed = self.snakes.len() != before;
        if removed {
            info!("Removed snake {}", id);
        }
        removed
    }

    /// Changes the heading only; the snake moves on the next tick.
    pub fn set_heading(&mut self, id: SessionId, heading: Heading) -> bool {
        match self.snakes.iter_mut().find(|snake| snake.id == id) {
            Some(snake) => {
                snake.heading = heading;
                true
            }
            None => false,
        }
    }

    pub fn snake(&self, id: SessionId) -> Option<&Snake> {
        self.snakes.iter().find(|snake| snake.id == id)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            snakes: self.snakes.clone(),
            fruits: self.fruits.clone(),
        }
    }

    /// Advances the world by one tick.
    ///
    /// All snakes move first. Then, in join order, each snake whose head sits
    /// on a fruit eats the first such fruit in stored order, grows by one, and
    /// the fruit is replaced by a freshly spawned one at the end of the list.
    /// A fruit eaten by an earlier snake is gone for later snakes in the same
    /// tick.
    pub fn tick(&mut self, spawner: &mut FruitSpawner) -> TickReport {
        let mut report = TickReport::default();

        for snake in &mut self.snakes {
            if motion::advance(snake, &self.grid, self.respawn) {
                debug!("Snake {} left the board, respawning", snake.id);
                report.respawned.push(snake.id);
            }
        }

        for snake in &mut self.snakes {
            let head = snake.head();
            let Some(index) = self.fruits.iter().position(|fruit| fruit.position() == head)
            else {
                continue;
            };

            motion::grow(snake, &self.grid);
            let eaten = self.fruits.remove(index);
            self.fruits.push(spawner.spawn());
            report.consumed.push((snake.id, eaten));
        }

        self.tick += 1;
        report.tick = self.tick;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{default_body, RESPAWN_POSITION};

    fn new_world() -> (GameState, FruitSpawner) {
        let config = GameConfig::default();
        let mut spawner = FruitSpawner::seeded(config.grid, 7);
        let state = GameState::new(&config, &mut spawner);
        (state, spawner)
    }

    fn body_at(row: i32, col: i32, len: i32) -> Vec<Segment> {
        (0..len)
            .map(|i| Segment::new(Heading::Right, row, col - i * 10))
            .collect()
    }

    #[test]
    fn test_new_world() {
        let (state, _) = new_world();
        assert_eq!(state.tick, 0);
        assert!(state.snakes.is_empty());
        assert_eq!(state.fruits.len(), 5);
    }

    #[test]
    fn test_add_snake() {
        let (mut state, _) = new_world();

        assert!(state.add_snake(1, default_body()));

        let snake = state.snake(1).unwrap();
        assert_eq!(snake.heading, Heading::Right);
        assert_eq!(snake.len(), 5);
        assert_eq!(state.fruits.len(), 5);
    }

    #[test]
    fn test_add_duplicate_snake_is_ignored() {
        let (mut state, _) = new_world();
        state.add_snake(1, default_body());

        assert!(!state.add_snake(1, body_at(300, 300, 2)));

        assert_eq!(state.snakes.len(), 1);
        assert_eq!(state.snake(1).unwrap().len(), 5);
    }

    #[test]
    fn test_remove_snake_is_idempotent() {
        let (mut state, _) = new_world();
        state.add_snake(1, default_body());
        state.add_snake(2, default_body());

        assert!(state.remove_snake(1));
        assert!(!state.remove_snake(1));
        assert!(!state.remove_snake(99));
        assert_eq!(state.snakes.len(), 1);
        assert_eq!(state.snakes[0].id, 2);
    }

    #[test]
    fn test_set_heading() {
        let (mut state, _) = new_world();
        state.add_snake(1, default_body());

        assert!(state.set_heading(1, Heading::Down));

        let snake = state.snake(1).unwrap();
        assert_eq!(snake.heading, Heading::Down);
        // no movement until the next tick
        assert_eq!(snake.head(), RESPAWN_POSITION);
    }

    #[test]
    fn test_unknown_session_commands_change_nothing() {
        let (mut state, _) = new_world();
        state.add_snake(1, default_body());
        let before = state.snapshot();

        assert!(!state.set_heading(42, Heading::Up));
        assert!(!state.remove_snake(42));

        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_tick_moves_every_snake() {
        let (mut state, mut spawner) = new_world();
        state.fruits.clear();
        state.add_snake(1, body_at(100, 100, 3));
        state.add_snake(2, body_at(500, 500, 3));
        state.set_heading(2, Heading::Down);

        let report = state.tick(&mut spawner);

        assert_eq!(report.tick, 1);
        assert_eq!(state.tick, 1);
        assert_eq!(state.snake(1).unwrap().head(), Position::new(100, 110));
        assert_eq!(state.snake(2).unwrap().head(), Position::new(510, 500));
        assert_eq!(state.snake(1).unwrap().len(), 3);
    }

    #[test]
    fn test_tick_reports_respawn() {
        let (mut state, mut spawner) = new_world();
        state.fruits.clear();
        state.add_snake(1, body_at(50, 1190, 2));

        let report = state.tick(&mut spawner);

        assert_eq!(report.respawned, vec![1]);
        assert_eq!(state.snake(1).unwrap().head(), Position::new(50, 50));
    }

    #[test]
    fn test_eating_grows_and_replaces_fruit() {
        let (mut state, mut spawner) = new_world();
        let target = Fruit::new(200, 210);
        state.fruits = vec![
            Fruit::new(0, 0),
            Fruit::new(10, 10),
            target,
            Fruit::new(20, 20),
            Fruit::new(30, 30),
        ];
        state.add_snake(1, body_at(200, 200, 5));
        let others: Vec<Fruit> = state
            .fruits
            .iter()
            .copied()
            .filter(|fruit| *fruit != target)
            .collect();

        let report = state.tick(&mut spawner);

        assert_eq!(report.consumed, vec![(1, target)]);
        assert_eq!(state.snake(1).unwrap().len(), 6);
        assert_eq!(state.fruits.len(), 5);
        // survivors keep their relative order, replacement goes last
        assert_eq!(&state.fruits[..4], others.as_slice());
    }

    #[test]
    fn test_first_matching_fruit_in_stored_order_is_eaten() {
        let (mut state, mut spawner) = new_world();
        state.fruits = vec![
            Fruit::new(0, 0),
            Fruit::new(200, 210),
            Fruit::new(200, 210),
        ];
        state.add_snake(1, body_at(200, 200, 1));

        state.tick(&mut spawner);

        assert_eq!(state.fruits.len(), 3);
        assert_eq!(state.fruits[0], Fruit::new(0, 0));
        assert_eq!(state.fruits[1], Fruit::new(200, 210));
        assert_eq!(state.snake(1).unwrap().len(), 2);
    }

    #[test]
    fn test_contested_fruit_goes_to_first_snake_in_order() {
        let config = GameConfig::default();
        // replacements from a one-cell grid always land on (0, 0)
        let mut spawner = FruitSpawner::seeded(Grid::new(10, 10, 10), 3);
        let mut state = GameState::new(&config, &mut spawner);
        state.fruits = vec![Fruit::new(300, 310)];

        // both heads arrive on (300, 310) this tick
        state.add_snake(1, body_at(300, 300, 2));
        let mut from_right = vec![Segment::new(Heading::Left, 300, 320)];
        from_right.push(Segment::new(Heading::Left, 300, 330));
        state.add_snake(2, from_right);
        state.set_heading(2, Heading::Left);

        let report = state.tick(&mut spawner);

        assert_eq!(report.consumed, vec![(1, Fruit::new(300, 310))]);
        assert_eq!(state.snake(1).unwrap().len(), 3);
        assert_eq!(state.snake(2).unwrap().len(), 2);
        assert_eq!(state.fruits, vec![Fruit::new(0, 0)]);
    }

    #[test]
    fn test_join_order_decides_contested_fruit() {
        let config = GameConfig::default();
        let mut spawner = FruitSpawner::seeded(Grid::new(10, 10, 10), 3);
        let mut state = GameState::new(&config, &mut spawner);
        state.fruits = vec![Fruit::new(300, 310)];

        let mut from_right = vec![Segment::new(Heading::Left, 300, 320)];
        from_right.push(Segment::new(Heading::Left, 300, 330));
        state.add_snake(2, from_right);
        state.set_heading(2, Heading::Left);
        state.add_snake(1, body_at(300, 300, 2));

        let report = state.tick(&mut spawner);

        assert_eq!(report.consumed, vec![(2, Fruit::new(300, 310))]);
        assert_eq!(state.snake(2).unwrap().len(), 3);
        assert_eq!(state.snake(1).unwrap().len(), 2);
    }

    #[test]
    fn test_fruit_count_is_constant_across_ticks() {
        let (mut state, mut spawner) = new_world();
        state.add_snake(1, default_body());
        state.add_snake(2, body_at(500, 500, 4));
        state.set_heading(2, Heading::Up);

        for _ in 0..500 {
            let before = state.fruits.len();
            state.tick(&mut spawner);
            assert_eq!(state.fruits.len(), before);
        }
    }

    #[test]
    fn test_length_changes_only_by_eating() {
        let (mut state, mut spawner) = new_world();
        state.add_snake(1, default_body());
        state.set_heading(1, Heading::Down);

        for _ in 0..300 {
            let before = state.snake(1).unwrap().len();
            let report = state.tick(&mut spawner);
            let ate = report.consumed.iter().filter(|(id, _)| *id == 1).count();
            assert!(ate <= 1);
            assert_eq!(state.snake(1).unwrap().len(), before + ate);
        }
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let (mut state, mut spawner) = new_world();
        state.add_snake(1, default_body());
        let snapshot = state.snapshot();

        state.tick(&mut spawner);

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.snakes[0].head(), RESPAWN_POSITION);
        assert_ne!(state.snapshot(), snapshot);
    }

    #[test]
    fn test_fruit_may_spawn_on_snake_body() {
        // Known permissive behavior: spawning ignores occupancy
        let config = GameConfig::default();
        let mut spawner = FruitSpawner::seeded(Grid::new(10, 10, 10), 11);
        let mut state = GameState::new(&config, &mut spawner);
        state.fruits = vec![Fruit::new(0, 10)];
        state.add_snake(1, vec![Segment::new(Heading::Right, 0, 0)]);

        state.tick(&mut spawner);

        // replacement landed on (0, 0), the cell the grown tail occupies
        assert_eq!(state.fruits, vec![Fruit::new(0, 0)]);
        assert_eq!(state.snake(1).unwrap().body[1].position(), Position::new(0, 0));
    }
}

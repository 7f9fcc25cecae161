use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Fruit, Grid};

/// Places fruit uniformly over the cells of the board.
///
/// Positions are not checked against existing fruit or snake bodies, so a
/// fruit may land on top of either.
#[derive(Debug)]
pub struct FruitSpawner {
    grid: Grid,
    rng: StdRng,
}

impl FruitSpawner {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible spawner, used by tests and the `--seed` flag.
    pub fn seeded(grid: Grid, seed: u64) -> Self {
        Self {
            grid,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn spawn(&mut self) -> Fruit {
        let row = self.rng.gen_range(0..self.grid.rows()) * self.grid.cell_size;
        let col = self.rng.gen_range(0..self.grid.cols()) * self.grid.cell_size;
        Fruit::new(row, col)
    }
}

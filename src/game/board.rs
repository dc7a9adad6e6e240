use super::constants::{
    MAX_PLACEMENT_ATTEMPTS, MOUSE_COUNT, OBSTACLE_COUNT, TELEPORT_PAIRS, TURBO_COUNT,
};
use super::snake::Snake;
use super::types::{MoveResult, Position};
use rand::Rng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub obstacles: usize,
    pub mice: usize,
    pub turbo_pads: usize,
    pub teleport_pairs: usize,
    pub respawn_mice: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            obstacles: OBSTACLE_COUNT,
            mice: MOUSE_COUNT,
            turbo_pads: TURBO_COUNT,
            teleport_pairs: TELEPORT_PAIRS,
            respawn_mice: false,
        }
    }
}

/// Shared grid. The cell sets live behind one mutex; a whole `step` holds it,
/// so contested pickups resolve to exactly one consumer.
#[derive(Debug)]
pub struct Board {
    width: i32,
    height: i32,
    respawn_mice: bool,
    cells: Mutex<Cells>,
}

#[derive(Debug, Default)]
struct Cells {
    obstacles: HashSet<Position>,
    mice: HashSet<Position>,
    turbo: HashSet<Position>,
    teleports: HashMap<Position, Position>,
}

impl Cells {
    fn is_special(&self, position: Position) -> bool {
        self.obstacles.contains(&position)
            || self.mice.contains(&position)
            || self.turbo.contains(&position)
            || self.teleports.contains_key(&position)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub width: i32,
    pub height: i32,
    pub obstacles: Vec<Position>,
    pub mice: Vec<Position>,
    pub turbo: Vec<Position>,
    pub teleports: Vec<(Position, Position)>,
}

impl Board {
    pub fn empty(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            respawn_mice: false,
            cells: Mutex::new(Cells::default()),
        }
    }

    /// Random layout with the configured number of special cells. Placement
    /// retries a bounded number of times per cell, so a crowded grid yields
    /// fewer specials instead of spinning.
    pub fn generate(width: i32, height: i32, config: &BoardConfig) -> Self {
        let mut cells = Cells::default();
        let mut rng = rand::thread_rng();

        for _ in 0..config.obstacles {
            if let Some(spot) = random_free_cell(&mut rng, &cells, width, height) {
                cells.obstacles.insert(spot);
            }
        }
        for _ in 0..config.mice {
            if let Some(spot) = random_free_cell(&mut rng, &cells, width, height) {
                cells.mice.insert(spot);
            }
        }
        for _ in 0..config.turbo_pads {
            if let Some(spot) = random_free_cell(&mut rng, &cells, width, height) {
                cells.turbo.insert(spot);
            }
        }
        for _ in 0..config.teleport_pairs {
            let Some(entry) = random_free_cell(&mut rng, &cells, width, height) else {
                continue;
            };
            cells.teleports.insert(entry, entry);
            match random_free_cell(&mut rng, &cells, width, height) {
                Some(exit) => {
                    cells.teleports.insert(entry, exit);
                    cells.teleports.insert(exit, entry);
                }
                None => {
                    cells.teleports.remove(&entry);
                }
            }
        }

        Self {
            width,
            height,
            respawn_mice: config.respawn_mice,
            cells: Mutex::new(cells),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn wrap(&self, position: Position) -> Position {
        Position::new(position.x.rem_euclid(self.width), position.y.rem_euclid(self.height))
    }

    /// Advance one snake by one cell and report the outcome. Resolution order
    /// doubles as the precedence for overlapping special cells:
    /// obstacle > teleport > mouse > turbo.
    pub async fn step(&self, snake: &Snake) -> MoveResult {
        let (head, direction) = snake.heading();
        let candidate = self.wrap(head.neighbor(direction));
        let mut cells = self.cells.lock().await;

        if cells.obstacles.contains(&candidate) {
            // the caller marks the snake dead; the body stays where it was
            return MoveResult::HitObstacle;
        }
        if let Some(exit) = cells.teleports.get(&candidate).copied() {
            snake.advance(exit, false);
            return MoveResult::Teleported;
        }
        if cells.mice.remove(&candidate) {
            if self.respawn_mice {
                let mut rng = rand::thread_rng();
                if let Some(spot) = random_free_cell(&mut rng, &cells, self.width, self.height) {
                    cells.mice.insert(spot);
                }
            }
            snake.advance(candidate, true);
            return MoveResult::AteMouse;
        }
        if cells.turbo.remove(&candidate) {
            snake.advance(candidate, false);
            return MoveResult::AteTurbo;
        }
        snake.advance(candidate, false);
        MoveResult::None
    }

    pub async fn place_obstacle(&self, position: Position) {
        self.cells.lock().await.obstacles.insert(position);
    }

    pub async fn place_mouse(&self, position: Position) {
        self.cells.lock().await.mice.insert(position);
    }

    pub async fn place_turbo(&self, position: Position) {
        self.cells.lock().await.turbo.insert(position);
    }

    pub async fn link_teleport(&self, entry: Position, exit: Position) {
        let mut cells = self.cells.lock().await;
        cells.teleports.insert(entry, exit);
        cells.teleports.insert(exit, entry);
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        let cells = self.cells.lock().await;
        BoardSnapshot {
            width: self.width,
            height: self.height,
            obstacles: cells.obstacles.iter().copied().collect(),
            mice: cells.mice.iter().copied().collect(),
            turbo: cells.turbo.iter().copied().collect(),
            teleports: cells.teleports.iter().map(|(from, to)| (*from, *to)).collect(),
        }
    }
}

fn random_free_cell(
    rng: &mut impl Rng,
    cells: &Cells,
    width: i32,
    height: i32,
) -> Option<Position> {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = Position::new(rng.gen_range(0..width), rng.gen_range(0..height));
        if !cells.is_special(candidate) {
            return Some(candidate);
        }
    }
    None
}

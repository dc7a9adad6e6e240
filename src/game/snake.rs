use super::constants::INITIAL_MAX_LENGTH;
use super::now_millis;
use super::stats::SnakeStats;
use super::types::{Direction, Position};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One simulated snake. Every mutating or reading method locks the single
/// internal mutex, so concurrent callers (its runner, the input source, the
/// stats sweep, the render task) always observe a fully-applied state.
#[derive(Debug)]
pub struct Snake {
    id: u32,
    start_time: i64,
    inner: Mutex<SnakeBody>,
}

#[derive(Debug)]
struct SnakeBody {
    body: VecDeque<Position>,
    direction: Direction,
    max_length: usize,
    death_time: Option<i64>,
    mice_eaten: u32,
}

impl Snake {
    pub fn new(id: u32, start: Position, direction: Direction) -> Self {
        let mut body = VecDeque::new();
        body.push_front(start);
        Self {
            id,
            start_time: now_millis(),
            inner: Mutex::new(SnakeBody {
                body,
                direction,
                max_length: INITIAL_MAX_LENGTH,
                death_time: None,
                mice_eaten: 0,
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    // Guarded sections are straight-line and cannot leave the body
    // half-applied, so a poisoned lock is safe to re-enter.
    fn lock(&self) -> MutexGuard<'_, SnakeBody> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn direction(&self) -> Direction {
        self.lock().direction
    }

    pub fn head(&self) -> Position {
        let inner = self.lock();
        // body always holds at least the starting cell
        inner.body.front().copied().unwrap_or(Position::new(0, 0))
    }

    pub fn heading(&self) -> (Position, Direction) {
        let inner = self.lock();
        let head = inner.body.front().copied().unwrap_or(Position::new(0, 0));
        (head, inner.direction)
    }

    /// Rejects an exact reversal, which would fold the snake onto itself.
    pub fn turn(&self, direction: Direction) {
        let mut inner = self.lock();
        if direction == inner.direction.opposite() {
            return;
        }
        inner.direction = direction;
    }

    pub fn advance(&self, new_head: Position, grow: bool) {
        let mut inner = self.lock();
        inner.body.push_front(new_head);
        if grow {
            inner.max_length += 1;
        }
        while inner.body.len() > inner.max_length {
            inner.body.pop_back();
        }
    }

    /// Independent copy of the body, head first.
    pub fn snapshot(&self) -> Vec<Position> {
        self.lock().body.iter().copied().collect()
    }

    pub fn record_mouse_eaten(&self) {
        self.lock().mice_eaten += 1;
    }

    /// First caller wins; later calls keep the original death timestamp.
    pub fn mark_dead(&self) {
        let mut inner = self.lock();
        if inner.death_time.is_none() {
            inner.death_time = Some(now_millis());
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lock().death_time.is_none()
    }

    pub fn stats(&self) -> SnakeStats {
        let inner = self.lock();
        SnakeStats {
            snake_id: self.id,
            length: inner.body.len(),
            start_time: self.start_time,
            death_time: inner.death_time,
            mice_eaten: inner.mice_eaten,
            head: inner.body.front().copied().unwrap_or(Position::new(0, 0)),
        }
    }
}

use super::clock::GameClock;
use super::snake::Snake;
use super::stats::SnakeStats;
use super::types::GameState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Process-wide coordination point: the canonical run/pause register, the
/// snake roster, and the statistics cached at the last pause.
#[derive(Debug)]
pub struct GameController {
    snakes: Vec<Arc<Snake>>,
    clock: Arc<GameClock>,
    state: watch::Sender<GameState>,
    shutdown: watch::Sender<bool>,
    stats: Mutex<StatsSummary>,
}

#[derive(Debug, Default)]
struct StatsSummary {
    longest: Option<SnakeStats>,
    worst: Option<SnakeStats>,
}

impl GameController {
    pub fn new(snakes: Vec<Arc<Snake>>, clock: Arc<GameClock>) -> Self {
        Self {
            snakes,
            clock,
            state: watch::channel(GameState::Running).0,
            shutdown: watch::channel(false).0,
            stats: Mutex::new(StatsSummary::default()),
        }
    }

    pub fn snakes(&self) -> &[Arc<Snake>] {
        &self.snakes
    }

    pub fn state(&self) -> GameState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<GameState> {
        self.state.subscribe()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Publish PAUSED first so every runner's next poll parks, then cache a
    /// statistics sweep. Runners may finish one in-flight step before they
    /// observe the flip; the sweep reads whatever state exists when it runs.
    pub fn pause(&self) {
        self.state.send_replace(GameState::Paused);
        self.clock.pause();
        self.recompute_stats();
        tracing::debug!("simulation paused");
    }

    /// Watch subscribers get a broadcast wake; no per-runner signal exists.
    pub fn resume(&self) {
        self.state.send_replace(GameState::Running);
        self.clock.resume();
        tracing::debug!("simulation resumed");
    }

    /// Every runner exits at its next suspension point.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        self.clock.stop();
        tracing::debug!("simulation shut down");
    }

    pub fn longest_snake(&self) -> Option<SnakeStats> {
        self.stats_lock().longest.clone()
    }

    pub fn worst_snake(&self) -> Option<SnakeStats> {
        self.stats_lock().worst.clone()
    }

    pub fn all_stats(&self) -> Vec<SnakeStats> {
        self.snakes.iter().map(|snake| snake.stats()).collect()
    }

    fn recompute_stats(&self) {
        let all = self.all_stats();
        let longest = all
            .iter()
            .filter(|stats| stats.is_alive())
            .max_by_key(|stats| stats.length)
            .cloned();
        let worst = all
            .iter()
            .filter(|stats| !stats.is_alive())
            .min_by_key(|stats| stats.death_time.unwrap_or(i64::MAX))
            .cloned();

        let mut cached = self.stats_lock();
        cached.longest = longest;
        cached.worst = worst;
    }

    fn stats_lock(&self) -> MutexGuard<'_, StatsSummary> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::CLOCK_FPS;
    use crate::game::types::{Direction, Position};
    use std::thread::sleep;
    use std::time::Duration;

    fn make_controller(count: u32) -> GameController {
        let snakes = (0..count)
            .map(|id| Arc::new(Snake::new(id, Position::new(id as i32, 0), Direction::Right)))
            .collect();
        GameController::new(snakes, Arc::new(GameClock::new(CLOCK_FPS)))
    }

    fn grow(snake: &Snake, cells: i32) {
        let head = snake.head();
        for step in 1..=cells {
            snake.advance(Position::new(head.x, head.y + step), true);
        }
    }

    #[test]
    fn pause_caches_longest_alive_snake() {
        let controller = make_controller(3);
        grow(&controller.snakes()[1], 3);
        grow(&controller.snakes()[2], 1);

        controller.pause();

        let longest = controller.longest_snake().expect("one snake is longest");
        assert_eq!(longest.snake_id, 1);
        assert_eq!(longest.length, 4);
        assert!(controller.worst_snake().is_none());
    }

    #[test]
    fn pause_caches_earliest_death_as_worst() {
        let controller = make_controller(3);
        controller.snakes()[2].mark_dead();
        sleep(Duration::from_millis(5));
        controller.snakes()[0].mark_dead();

        controller.pause();

        let worst = controller.worst_snake().expect("two snakes died");
        assert_eq!(worst.snake_id, 2);
        assert!(!worst.is_alive());
    }

    #[test]
    fn no_alive_snakes_means_no_longest() {
        let controller = make_controller(2);
        for snake in controller.snakes() {
            snake.mark_dead();
        }

        controller.pause();

        assert!(controller.longest_snake().is_none());
        assert!(controller.worst_snake().is_some());
    }

    #[test]
    fn stats_are_empty_before_first_pause() {
        let controller = make_controller(2);
        assert!(controller.longest_snake().is_none());
        assert!(controller.worst_snake().is_none());
    }

    #[test]
    fn repeated_pause_recomputes_stats() {
        let controller = make_controller(2);
        grow(&controller.snakes()[0], 2);
        controller.pause();
        assert_eq!(controller.longest_snake().map(|s| s.snake_id), Some(0));

        controller.snakes()[0].mark_dead();
        controller.pause();
        assert_eq!(controller.longest_snake().map(|s| s.snake_id), Some(1));
        assert_eq!(controller.worst_snake().map(|s| s.snake_id), Some(0));
    }

    #[test]
    fn state_register_round_trips() {
        let controller = make_controller(1);
        assert_eq!(controller.state(), GameState::Running);
        controller.pause();
        assert_eq!(controller.state(), GameState::Paused);
        controller.resume();
        assert_eq!(controller.state(), GameState::Running);
        // resuming again is a no-op
        controller.resume();
        assert_eq!(controller.state(), GameState::Running);
    }
}

use super::board::Board;
use super::constants::{
    BASE_SLEEP_MS, PAUSE_POLL_MS, TURBO_SLEEP_MS, TURBO_TURN_PROBABILITY, TURBO_WINDOW_STEPS,
    TURN_PROBABILITY,
};
use super::controller::GameController;
use super::snake::Snake;
use super::types::{Direction, GameState, MoveResult};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// One independent loop per snake: poll the pause register, maybe wander,
/// step on the board, react, sleep. Terminal on obstacle or shutdown.
pub struct SnakeRunner {
    snake: Arc<Snake>,
    board: Arc<Board>,
    state: watch::Receiver<GameState>,
    shutdown: watch::Receiver<bool>,
    turbo_steps: u32,
}

impl SnakeRunner {
    pub fn new(snake: Arc<Snake>, board: Arc<Board>, controller: &GameController) -> Self {
        Self {
            snake,
            board,
            state: controller.subscribe_state(),
            shutdown: controller.subscribe_shutdown(),
            turbo_steps: 0,
        }
    }

    pub async fn run(mut self) {
        let id = self.snake.id();
        loop {
            if !self.wait_while_paused().await {
                break;
            }

            self.maybe_turn();
            match self.board.step(&self.snake).await {
                MoveResult::HitObstacle => {
                    self.snake.mark_dead();
                    tracing::debug!(snake = id, "hit an obstacle");
                    break;
                }
                MoveResult::AteMouse => self.snake.record_mouse_eaten(),
                MoveResult::AteTurbo => self.turbo_steps = TURBO_WINDOW_STEPS,
                MoveResult::Teleported | MoveResult::None => {}
            }

            let delay = if self.turbo_steps > 0 {
                self.turbo_steps -= 1;
                TURBO_SLEEP_MS
            } else {
                BASE_SLEEP_MS
            };
            if !self.sleep(Duration::from_millis(delay)).await {
                break;
            }
        }
        tracing::debug!(snake = id, "runner stopped");
    }

    fn maybe_turn(&self) {
        let probability = if self.turbo_steps > 0 {
            TURBO_TURN_PROBABILITY
        } else {
            TURN_PROBABILITY
        };
        let mut rng = rand::thread_rng();
        if rng.gen::<f64>() < probability {
            let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
            self.snake.turn(direction);
        }
    }

    // Parks until the register leaves PAUSED. Watch notifications give the
    // broadcast wake; the coarse poll is a fallback bound on wake latency.
    // Returns false once the shutdown signal fired.
    async fn wait_while_paused(&mut self) -> bool {
        loop {
            if *self.shutdown.borrow() {
                return false;
            }
            if *self.state.borrow() != GameState::Paused {
                return true;
            }
            tokio::select! {
                changed = self.state.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
                _ = self.shutdown.changed() => return false,
                _ = tokio::time::sleep(Duration::from_millis(PAUSE_POLL_MS)) => {}
            }
        }
    }

    async fn sleep(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.shutdown.changed() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::clock::GameClock;
    use crate::game::constants::CLOCK_FPS;
    use crate::game::types::Position;
    use tokio::time::{sleep, timeout};

    fn make_world(snake_count: u32) -> (Arc<Board>, Vec<Arc<Snake>>, Arc<GameController>) {
        let board = Arc::new(Board::empty(12, 12));
        let snakes: Vec<Arc<Snake>> = (0..snake_count)
            .map(|id| {
                Arc::new(Snake::new(
                    id,
                    Position::new(2 + 3 * id as i32, 6),
                    Direction::Right,
                ))
            })
            .collect();
        let controller = Arc::new(GameController::new(
            snakes.clone(),
            Arc::new(GameClock::new(CLOCK_FPS)),
        ));
        (board, snakes, controller)
    }

    async fn surround_with_obstacles(board: &Board, center: Position) {
        for direction in Direction::ALL {
            board.place_obstacle(center.neighbor(direction)).await;
        }
    }

    #[tokio::test]
    async fn hitting_an_obstacle_terminates_the_runner() {
        let (board, snakes, controller) = make_world(1);
        surround_with_obstacles(&board, snakes[0].head()).await;

        let handle = tokio::spawn(SnakeRunner::new(snakes[0].clone(), board, &controller).run());
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("runner kept going after the crash")
            .expect("runner panicked");

        assert!(!snakes[0].is_alive());
        let first = snakes[0].stats().death_time;
        sleep(Duration::from_millis(10)).await;
        assert_eq!(snakes[0].stats().death_time, first);
    }

    #[tokio::test]
    async fn pause_parks_the_runner_and_resume_wakes_it() {
        let (board, snakes, controller) = make_world(1);
        tokio::spawn(SnakeRunner::new(snakes[0].clone(), board, &controller).run());

        // let it take a few steps first
        sleep(Duration::from_millis(200)).await;
        controller.pause();
        // an in-flight step may still land right after the flip
        sleep(Duration::from_millis(200)).await;

        let parked = snakes[0].head();
        sleep(Duration::from_millis(300)).await;
        assert_eq!(snakes[0].head(), parked);

        controller.resume();
        let moved = timeout(Duration::from_secs(2), async {
            loop {
                if snakes[0].head() != parked {
                    break;
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(moved.is_ok(), "runner never resumed stepping");

        controller.shutdown();
    }

    #[tokio::test]
    async fn all_runners_park_and_resume_together() {
        let (board, snakes, controller) = make_world(3);
        for snake in &snakes {
            tokio::spawn(SnakeRunner::new(snake.clone(), board.clone(), &controller).run());
        }

        sleep(Duration::from_millis(200)).await;
        controller.pause();
        sleep(Duration::from_millis(200)).await;

        let parked: Vec<Position> = snakes.iter().map(|snake| snake.head()).collect();
        sleep(Duration::from_millis(300)).await;
        let still: Vec<Position> = snakes.iter().map(|snake| snake.head()).collect();
        assert_eq!(parked, still);

        controller.resume();
        let moved = timeout(Duration::from_secs(2), async {
            loop {
                let all_moved = snakes
                    .iter()
                    .zip(&parked)
                    .all(|(snake, old)| snake.head() != *old);
                if all_moved {
                    break;
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(moved.is_ok(), "a runner never resumed stepping");

        controller.shutdown();
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_step_sleep() {
        let (board, snakes, controller) = make_world(1);
        let handle = tokio::spawn(SnakeRunner::new(snakes[0].clone(), board, &controller).run());

        sleep(Duration::from_millis(100)).await;
        controller.shutdown();

        timeout(Duration::from_secs(1), handle)
            .await
            .expect("runner ignored shutdown")
            .expect("runner panicked");
        assert!(snakes[0].is_alive());
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_pause_park() {
        let (board, snakes, controller) = make_world(1);
        controller.pause();
        let handle = tokio::spawn(SnakeRunner::new(snakes[0].clone(), board, &controller).run());

        sleep(Duration::from_millis(100)).await;
        controller.shutdown();

        timeout(Duration::from_secs(1), handle)
            .await
            .expect("parked runner ignored shutdown")
            .expect("runner panicked");
    }
}

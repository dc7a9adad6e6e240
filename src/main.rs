use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use snake_race::game::board::{Board, BoardConfig, BoardSnapshot};
use snake_race::game::clock::GameClock;
use snake_race::game::constants::{BOARD_HEIGHT, BOARD_WIDTH, CLOCK_FPS, SNAKE_COUNT};
use snake_race::game::controller::GameController;
use snake_race::game::runner::SnakeRunner;
use snake_race::game::snake::Snake;
use snake_race::game::stats::SnakeStats;
use snake_race::game::types::{Direction, GameState, Position};

#[derive(Debug, Serialize)]
struct FrameSnapshot {
    state: GameState,
    board: BoardSnapshot,
    snakes: Vec<SnakeFrame>,
}

#[derive(Debug, Serialize)]
struct SnakeFrame {
    stats: SnakeStats,
    body: Vec<Position>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let width: i32 = env_parse("BOARD_WIDTH", BOARD_WIDTH);
    let height: i32 = env_parse("BOARD_HEIGHT", BOARD_HEIGHT);
    let snake_count: usize = env_parse("SNAKES", SNAKE_COUNT);
    let fps: u32 = env_parse("CLOCK_FPS", CLOCK_FPS);
    let respawn_mice = env::var("RESPAWN_MICE")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE"))
        .unwrap_or(false);

    let config = BoardConfig {
        respawn_mice,
        ..BoardConfig::default()
    };
    let board = Arc::new(Board::generate(width, height, &config));
    let snakes = starting_roster(snake_count, width, height);
    let clock = Arc::new(GameClock::new(fps));
    let controller = Arc::new(GameController::new(snakes.clone(), Arc::clone(&clock)));

    for snake in &snakes {
        let runner = SnakeRunner::new(Arc::clone(snake), Arc::clone(&board), &controller);
        tokio::spawn(runner.run());
    }
    Arc::clone(&clock).start();
    spawn_render_task(Arc::clone(&board), Arc::clone(&controller), &clock);

    tracing::info!(width, height, snakes = snake_count, "snake race started");
    tracing::info!("commands: pause | resume | turn <id> <up|down|left|right> | stats | quit");

    command_loop(&controller, &snakes).await?;

    controller.shutdown();
    Ok(())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

// Original roster placement: snakes fan out from (2, 2) in a diagonal
// lattice, cycling through the four headings.
fn starting_roster(count: usize, width: i32, height: i32) -> Vec<Arc<Snake>> {
    (0..count)
        .map(|index| {
            let x = (2 + (index as i32 * 3) % width) % width;
            let y = (2 + (index as i32 * 2) % height) % height;
            let direction = Direction::ALL[index % Direction::ALL.len()];
            Arc::new(Snake::new(index as u32, Position::new(x, y), direction))
        })
        .collect()
}

fn spawn_render_task(board: Arc<Board>, controller: Arc<GameController>, clock: &Arc<GameClock>) {
    let mut ticks = clock.subscribe();
    let mut shutdown = controller.subscribe_shutdown();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = ticks.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }

            let frame = FrameSnapshot {
                state: controller.state(),
                board: board.snapshot().await,
                snakes: controller
                    .snakes()
                    .iter()
                    .map(|snake| SnakeFrame {
                        stats: snake.stats(),
                        body: snake.snapshot(),
                    })
                    .collect(),
            };
            match serde_json::to_string(&frame) {
                Ok(json) => tracing::trace!(target: "snake_race::frame", %json),
                Err(error) => tracing::warn!(?error, "failed to serialize frame"),
            }
        }
    });
}

async fn command_loop(controller: &Arc<GameController>, snakes: &[Arc<Snake>]) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("pause") | Some("p") => {
                controller.pause();
                print_stats(controller);
            }
            Some("resume") | Some("r") => controller.resume(),
            Some("stats") => print_stats(controller),
            Some("turn") | Some("t") => {
                let id = parts.next().and_then(|value| value.parse::<u32>().ok());
                let direction = parts.next().and_then(Direction::parse);
                match (id, direction) {
                    (Some(id), Some(direction)) => match snakes.iter().find(|s| s.id() == id) {
                        Some(snake) => snake.turn(direction),
                        None => tracing::warn!(id, "no such snake"),
                    },
                    _ => tracing::warn!("usage: turn <id> <up|down|left|right>"),
                }
            }
            Some("quit") | Some("q") => break,
            Some(other) => tracing::warn!(command = other, "unknown command"),
        }
    }
    Ok(())
}

fn print_stats(controller: &GameController) {
    if controller.state() != GameState::Paused {
        tracing::info!("statistics reflect the last pause; pause to refresh them");
    }
    match controller.longest_snake() {
        Some(stats) => tracing::info!(
            snake = stats.snake_id,
            length = stats.length,
            mice = stats.mice_eaten,
            "longest surviving snake"
        ),
        None => tracing::info!("longest surviving snake: none alive"),
    }
    match controller.worst_snake() {
        Some(stats) => tracing::info!(
            snake = stats.snake_id,
            survived_ms = stats.survival_time(),
            "first snake to die"
        ),
        None => tracing::info!("first snake to die: none dead yet"),
    }
}

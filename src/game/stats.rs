use super::now_millis;
use super::types::Position;
use serde::Serialize;

/// Point-in-time snapshot of one snake, taken under the snake's lock.
#[derive(Debug, Clone, Serialize)]
pub struct SnakeStats {
    pub snake_id: u32,
    pub length: usize,
    pub start_time: i64,
    pub death_time: Option<i64>,
    pub mice_eaten: u32,
    pub head: Position,
}

impl SnakeStats {
    pub fn is_alive(&self) -> bool {
        self.death_time.is_none()
    }

    /// Milliseconds between creation and death, or creation and now while
    /// the snake is still alive.
    pub fn survival_time(&self) -> i64 {
        self.death_time.unwrap_or_else(now_millis) - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_stats(death_time: Option<i64>) -> SnakeStats {
        SnakeStats {
            snake_id: 3,
            length: 7,
            start_time: 1_000,
            death_time,
            mice_eaten: 2,
            head: Position::new(1, 1),
        }
    }

    #[test]
    fn alive_iff_no_death_time() {
        assert!(make_stats(None).is_alive());
        assert!(!make_stats(Some(2_000)).is_alive());
    }

    #[test]
    fn survival_time_uses_death_time_when_dead() {
        assert_eq!(make_stats(Some(4_500)).survival_time(), 3_500);
    }

    #[test]
    fn survival_time_keeps_counting_while_alive() {
        let stats = make_stats(None);
        let first = stats.survival_time();
        assert!(first >= 0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(stats.survival_time() >= first);
    }
}

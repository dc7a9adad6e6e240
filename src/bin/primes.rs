use std::env;
use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_WORKERS: usize = 3;
const DEFAULT_MAX_VALUE: u64 = 300_000_000;
const DEFAULT_REPORT_MS: u64 = 5_000;

/// Pause gate shared by all workers: a flag under a mutex plus a condvar, so
/// one resume wakes every parked worker.
struct PauseGate {
    paused: Mutex<bool>,
    resumed: Condvar,
}

impl PauseGate {
    fn new() -> Self {
        Self {
            paused: Mutex::new(false),
            resumed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pause(&self) {
        *self.lock() = true;
    }

    fn resume(&self) {
        *self.lock() = false;
        self.resumed.notify_all();
    }

    fn wait_if_paused(&self) {
        let mut paused = self.lock();
        while *paused {
            paused = self
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor = 3;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

// Workers re-check the gate once per candidate, so pause latency is bounded
// by a single primality test.
fn scan_range(from: u64, to: u64, gate: &PauseGate, found: &AtomicUsize) -> Vec<u64> {
    let mut primes = Vec::new();
    for candidate in from..to {
        gate.wait_if_paused();
        if is_prime(candidate) {
            primes.push(candidate);
            found.fetch_add(1, Ordering::Relaxed);
        }
    }
    primes
}

// Contiguous half-open ranges; the last one absorbs the remainder and the
// inclusive maximum.
fn split_ranges(max_value: u64, workers: usize) -> Vec<(u64, u64)> {
    let workers = workers.max(1) as u64;
    let chunk = max_value / workers;
    (0..workers)
        .map(|index| {
            let from = index * chunk;
            let to = if index == workers - 1 {
                max_value + 1
            } else {
                (index + 1) * chunk
            };
            (from, to)
        })
        .collect()
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let workers: usize = env_parse("PRIME_WORKERS", DEFAULT_WORKERS);
    let max_value: u64 = env_parse("PRIME_MAX", DEFAULT_MAX_VALUE);
    let report_interval = Duration::from_millis(env_parse("PRIME_REPORT_MS", DEFAULT_REPORT_MS));

    tracing::info!(workers, max_value, "prime scan started");

    let gate = Arc::new(PauseGate::new());
    let found = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = split_ranges(max_value, workers)
        .into_iter()
        .map(|(from, to)| {
            let gate = Arc::clone(&gate);
            let found = Arc::clone(&found);
            thread::spawn(move || scan_range(from, to, &gate, &found))
        })
        .collect();

    let stdin = io::stdin();
    while handles.iter().any(|handle| !handle.is_finished()) {
        thread::sleep(report_interval);
        gate.pause();
        println!("{} primes found so far", found.load(Ordering::Relaxed));
        println!("Press Enter to continue...");
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        gate.resume();
    }

    let mut total = 0usize;
    for handle in handles {
        let primes = handle
            .join()
            .map_err(|_| anyhow::anyhow!("prime worker panicked"))?;
        total += primes.len();
    }
    tracing::info!(total, "prime scan finished");
    println!("{total} primes up to {max_value}");
    Ok(())
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Fixed-rate tick source for redraw cadence. Pausing gates tick publication;
/// the interval task itself keeps running until `stop`.
#[derive(Debug)]
pub struct GameClock {
    period: Duration,
    started: AtomicBool,
    paused: AtomicBool,
    stopped: AtomicBool,
    ticks: watch::Sender<u64>,
}

impl GameClock {
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            period: Duration::from_millis((1_000 / u64::from(fps)).max(1)),
            started: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            ticks: watch::channel(0).0,
        }
    }

    /// Spawns the tick task. Only the first call does anything.
    pub fn start(self: Arc<Self>) {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            loop {
                interval.tick().await;
                if self.stopped.load(Ordering::SeqCst) {
                    break;
                }
                if !self.paused.load(Ordering::SeqCst) {
                    self.ticks.send_modify(|tick| *tick += 1);
                }
            }
        });
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks.subscribe()
    }
}

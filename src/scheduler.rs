use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct TickScheduler<C: Clock> {
    clock: C,
    interval: Duration,
    last_tick_at: Option<Instant>,
    tick_started_at: Option<Instant>,
}

impl<C: Clock> TickScheduler<C> {
    pub fn new(interval: Duration, clock: C) -> Self {
        Self {
            clock,
            interval,
            last_tick_at: None,
            tick_started_at: None,
        }
    }

    pub fn begin_tick(&mut self) -> Duration {
        let now = self.clock.now();
        let dt = self
            .last_tick_at
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(self.interval);
        self.last_tick_at = Some(now);
        self.tick_started_at = Some(now);
        dt
    }

    pub fn remaining(&self) -> Duration {
        let Some(started) = self.tick_started_at else {
            return Duration::ZERO;
        };
        let spent = self.clock.now().saturating_duration_since(started);
        self.interval.saturating_sub(spent)
    }

    pub fn next_deadline(&self) -> Instant {
        self.clock.now() + self.remaining()
    }
}

//! Header refresh countdown.
//!
//! Cosmetic only: it counts down once per second from `start` to zero, then
//! starts over. It is not synchronised with the pollers.

use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Countdown {
    start: u32,
    remaining: u32,
    last_tick: Option<Instant>,
}

impl Countdown {
    pub fn new(start: u32) -> Self {
        Self {
            start,
            remaining: start,
            last_tick: None,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advance one second. Returns the new value.
    pub fn tick(&mut self) -> u32 {
        self.remaining = if self.remaining == 0 {
            self.start
        } else {
            self.remaining - 1
        };
        self.remaining
    }

    /// Apply every whole second elapsed since the last call.
    ///
    /// The first call only anchors the clock.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return self.remaining;
        };
        let elapsed = now.saturating_duration_since(last);
        let whole = elapsed.as_secs();
        if whole == 0 {
            return self.remaining;
        }
        // After a long stall only the position in the cycle matters.
        let cycle = u64::from(self.start) + 1;
        for _ in 0..(whole % cycle) {
            self.tick();
        }
        self.last_tick = Some(last + TICK * whole as u32);
        self.remaining
    }

}

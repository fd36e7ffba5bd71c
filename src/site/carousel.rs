//! Auto-advancing index over a list (hero roles, project images).
//!
//! Time is fed in by the caller, so the same model drives a real timer or a test.

use std::time::Duration;

pub const HERO_INTERVAL: Duration = Duration::from_millis(3000);
pub const IMAGE_INTERVAL: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone)]
pub struct Carousel {
    len: usize,
    index: usize,
    hovered: bool,
    elapsed: Duration,
    interval: Duration,
}

impl Carousel {
    pub fn new(len: usize, interval: Duration) -> Self {
        Self {
            len,
            index: 0,
            hovered: false,
            elapsed: Duration::ZERO,
            interval,
        }
    }

    pub fn hero(len: usize) -> Self {
        Self::new(len, HERO_INTERVAL)
    }

    pub fn images(len: usize) -> Self {
        Self::new(len, IMAGE_INTERVAL)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_paused(&self) -> bool {
        self.hovered
    }

    /// Let `dt` pass. Returns how many steps the index moved.
    pub fn advance_by(&mut self, dt: Duration) -> usize {
        if self.hovered || self.len < 2 || self.interval.is_zero() {
            return 0;
        }
        self.elapsed += dt;
        let mut steps = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.index = (self.index + 1) % self.len;
            steps += 1;
        }
        steps
    }

    /// Pointer enter/leave. Time spent hovered does not count.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// The list changed; a different length restarts the cycle
    pub fn set_len(&mut self, len: usize) {
        if len == self.len {
            return;
        }
        self.len = len;
        self.index = 0;
        self.elapsed = Duration::ZERO;
    }

    /// Manual navigation (dots, arrows); restarts the timer
    pub fn go_to(&mut self, index: usize) {
        if index < self.len {
            self.index = index;
            self.elapsed = Duration::ZERO;
        }
    }
}

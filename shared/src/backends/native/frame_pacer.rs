use std::time::{Duration, Instant};

/// Blocks the calling thread until the next fixed-step deadline
pub struct FramePacer {
    next_tick: Option<Instant>,
}

impl FramePacer {
    pub fn new() -> Self {
        Self { next_tick: None }
    }

    /// Forgets the schedule; the next `wait` returns immediately and starts a new one
    pub fn reset(&mut self) {
        self.next_tick = None;
    }

    pub fn wait(&mut self, interval: Duration) {
        let now = Instant::now();
        let deadline = *self.next_tick.get_or_insert(now);

        if now < deadline {
            std::thread::sleep(deadline - now);
        }

        let mut next_tick = deadline + interval;
        // Fell behind by more than a tick: resume from now rather than catching up
        let now = Instant::now();
        if next_tick < now {
            next_tick = now + interval;
        }
        self.next_tick = Some(next_tick);
    }
}

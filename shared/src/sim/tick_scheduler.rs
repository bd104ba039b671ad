use std::time::Duration;

use log::debug;

use crate::{backends::FramePacer, constants::DEFAULT_TICK_RATE, Tick};

/// Drives the simulation at a fixed rate. Each `tick` runs the callback once
/// with the fixed delta time.
pub struct TickScheduler {
    tick_rate: u32,
    current_tick: Tick,
    frame_pacing: bool,
    pacer: FramePacer,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl TickScheduler {
    /// Frame pacing starts disabled
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_rate: tick_rate.max(1),
            current_tick: 0,
            frame_pacing: false,
            pacer: FramePacer::new(),
        }
    }

    /// Sets the rate in Hz. Zero is clamped to 1.
    pub fn set_tick_rate(&mut self, tick_rate: u32) {
        self.tick_rate = tick_rate.max(1);
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn fixed_delta_time(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.tick_rate))
    }

    /// Runs one fixed step. With frame pacing enabled this blocks until the
    /// step's scheduled instant.
    pub fn tick<F: FnOnce(f32)>(&mut self, callback: F) {
        if self.frame_pacing {
            let interval = self.tick_interval();
            self.pacer.wait(interval);
        }
        callback(self.fixed_delta_time());
        self.current_tick += 1;
    }

    /// Number of completed ticks
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Re-aligns the counter after a rollback so the next tick run is `tick`
    pub fn rewind_to(&mut self, tick: Tick) {
        debug!("TickScheduler: rewinding from tick {} to {}", self.current_tick, tick);
        self.current_tick = tick;
    }

    pub fn set_frame_pacing(&mut self, enabled: bool) {
        self.frame_pacing = enabled;
        if enabled {
            self.pacer.reset();
        }
    }

    pub fn frame_pacing_enabled(&self) -> bool {
        self.frame_pacing
    }
}

use std::default::Default;

use crate::constants::DEFAULT_TICK_RATE;

/// Contains Config properties which will be used by a NetContext
#[derive(Clone, Debug)]
pub struct NetConfig {
    /// Fixed simulation rate. Replay advances the store by `1 / tick_rate`
    /// seconds per input frame.
    pub tick_rate: u32,
    /// How many rollback snapshots to retain. `None` keeps every snapshot
    /// until a rollback discards it.
    pub max_snapshots: Option<usize>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_snapshots: None,
        }
    }
}

impl NetConfig {
    pub fn fixed_delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

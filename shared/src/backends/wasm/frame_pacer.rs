use std::time::Duration;

/// The browser drives the frame loop, so pacing never blocks here
pub struct FramePacer;

impl FramePacer {
    pub fn new() -> Self {
        Self
    }

    pub fn reset(&mut self) {}

    pub fn wait(&mut self, _interval: Duration) {}
}

use log::warn;

use crate::Tick;

/// A simulation that can be stepped in lockstep with another
pub trait Simulation {
    /// Advances one tick with the given input frame
    fn step(&mut self, input: &[u8]);
    /// Deterministic hash of the current world state
    fn world_hash(&self) -> u64;
    fn current_tick(&self) -> Tick;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MirrorDesyncEvent {
    pub tick: Tick,
    pub server_hash: u64,
    pub client_hash: u64,
}

pub type DesyncCallback = Box<dyn FnMut(&MirrorDesyncEvent) + Send>;

/// Steps a server and a client simulation with identical input and records
/// every tick at which their world hashes disagree
pub struct SimMirror<S: Simulation, C: Simulation> {
    server: S,
    client: C,
    desyncs: Vec<MirrorDesyncEvent>,
    frame_count: u64,
    enabled: bool,
    desync_callback: Option<DesyncCallback>,
}

impl<S: Simulation, C: Simulation> SimMirror<S, C> {
    pub fn new(server: S, client: C) -> Self {
        Self {
            server,
            client,
            desyncs: Vec::new(),
            frame_count: 0,
            enabled: true,
            desync_callback: None,
        }
    }

    /// Steps both sides. Returns false if their hashes now differ. A disabled
    /// mirror steps nothing and reports a match.
    pub fn step(&mut self, input: &[u8]) -> bool {
        if !self.enabled {
            return true;
        }

        self.server.step(input);
        self.client.step(input);
        self.frame_count += 1;

        let server_hash = self.server.world_hash();
        let client_hash = self.client.world_hash();
        if server_hash == client_hash {
            return true;
        }

        let event = MirrorDesyncEvent {
            tick: self.server.current_tick(),
            server_hash,
            client_hash,
        };
        warn!(
            "SimMirror: desync at tick {}: server {:#018x}, client {:#018x}",
            event.tick, server_hash, client_hash
        );
        if let Some(callback) = self.desync_callback.as_mut() {
            callback(&event);
        }
        self.desyncs.push(event);
        false
    }

    /// Steps through `inputs`, stopping at the first desync. Returns its tick.
    pub fn run_frames<I, B>(&mut self, inputs: I) -> Option<Tick>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        for input in inputs {
            if !self.step(input.as_ref()) {
                return self.desyncs.last().map(|event| event.tick);
            }
        }
        None
    }

    pub fn has_desync(&self) -> bool {
        !self.desyncs.is_empty()
    }

    pub fn desyncs(&self) -> &[MirrorDesyncEvent] {
        &self.desyncs
    }

    pub fn first_desync(&self) -> Option<&MirrorDesyncEvent> {
        self.desyncs.first()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Clears the desync history and frame count. The simulations are untouched.
    pub fn reset(&mut self) {
        self.desyncs.clear();
        self.frame_count = 0;
    }

    pub fn set_desync_callback(&mut self, callback: impl FnMut(&MirrorDesyncEvent) + Send + 'static) {
        self.desync_callback = Some(Box::new(callback));
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn server_mut(&mut self) -> &mut S {
        &mut self.server
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

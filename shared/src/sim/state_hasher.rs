use log::debug;

use crate::{
    constants::{FNV_OFFSET_BASIS, FNV_PRIME},
    Tick,
};

/// One rung of the hash ladder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashEntry {
    pub tick: Tick,
    pub hash: u64,
}

/// Folds `bytes` into `prev` with FNV-1a (64 bit)
pub fn hash_combine(prev: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(prev, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash of a snapshot's ECS and auxiliary bytes, independent of any chain.
/// Empty auxiliary data contributes nothing.
pub fn point_hash(ecs_data: &[u8], aux_data: &[u8]) -> u64 {
    let hash = hash_combine(0, ecs_data);
    hash_combine(hash, aux_data)
}

/// Chained hash over every tick's state and input bytes.
///
/// `hash[n] = fnv(hash[n-1], tick_le_bytes, state, input)`, so a single byte
/// difference at tick `n` changes every later hash.
#[derive(Clone, Debug)]
pub struct StateHasher {
    current_hash: u64,
    current_tick: Tick,
    seed: u64,
    history: Vec<HashEntry>,
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new(0)
    }
}

impl StateHasher {
    pub fn new(seed: u64) -> Self {
        let mut hasher = Self {
            current_hash: 0,
            current_tick: 0,
            seed,
            history: Vec::new(),
        };
        hasher.reset(seed);
        hasher
    }

    /// Starts a new chain from `seed`, dropping all history
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.current_hash = FNV_OFFSET_BASIS ^ seed;
        self.current_tick = 0;
        self.history.clear();
    }

    pub fn advance_tick(&mut self, tick: Tick, state: &[u8], input: &[u8]) -> u64 {
        let mut hash = hash_combine(self.current_hash, &tick.to_le_bytes());
        hash = hash_combine(hash, state);
        hash = hash_combine(hash, input);

        self.current_hash = hash;
        self.current_tick = tick;
        self.history.push(HashEntry { tick, hash });
        hash
    }

    pub fn current_hash(&self) -> u64 {
        self.current_hash
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn history(&self) -> &[HashEntry] {
        &self.history
    }

    /// Hash recorded for `tick`, if the ladder has reached it
    pub fn hash_at_tick(&self, tick: Tick) -> Option<u64> {
        self.history
            .iter()
            .find(|entry| entry.tick == tick)
            .map(|entry| entry.hash)
    }

    /// First tick at which the two histories disagree, comparing pairwise up
    /// to the shorter history. `None` if the overlap is identical.
    pub fn find_divergence(&self, other: &StateHasher) -> Option<Tick> {
        self.history
            .iter()
            .zip(other.history.iter())
            .find(|(mine, theirs)| mine.hash != theirs.hash)
            .map(|(mine, _)| mine.tick)
    }

    /// Drops every rung at or after `tick` so a replay from `tick` extends the
    /// ladder from the right place
    pub fn rewind_to(&mut self, tick: Tick) {
        self.history.retain(|entry| entry.tick < tick);
        match self.history.last() {
            Some(entry) => {
                self.current_hash = entry.hash;
                self.current_tick = entry.tick;
            }
            None => {
                self.current_hash = FNV_OFFSET_BASIS ^ self.seed;
                self.current_tick = 0;
            }
        }
        debug!(
            "StateHasher: rewound to tick {}, {} entries kept",
            tick,
            self.history.len()
        );
    }
}

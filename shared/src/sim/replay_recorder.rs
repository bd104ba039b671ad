use std::{fs, io, path::Path};

use log::{info, warn};

use lockstep_serde::{ByteReader, ByteWrite, ByteWriter, Serde};

use crate::{
    constants::{REPLAY_MAGIC, REPLAY_VERSION},
    sim::error::ReplayError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayHeader {
    pub magic: u32,
    pub version: u32,
    pub tick_rate: u32,
    pub frame_count: u32,
    pub seed: u32,
}

impl Default for ReplayHeader {
    fn default() -> Self {
        Self {
            magic: REPLAY_MAGIC,
            version: REPLAY_VERSION,
            tick_rate: 30,
            frame_count: 0,
            seed: 0,
        }
    }
}

/// One tick of recorded input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayFrame {
    pub tick: u32,
    pub input: Vec<u8>,
    /// Hash ladder value after this tick, 0 when not recorded
    pub state_hash: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayState {
    Idle,
    Recording,
    Playing,
}

/// Records per-tick input and hash ladder values, and reads them back.
///
/// File layout (little-endian): `[magic][version][tickRate][frameCount][seed]`
/// then per frame `[tick][size][input bytes][stateHash]`. Version 1 files
/// carry no per-frame hash.
pub struct ReplayRecorder {
    state: ReplayState,
    header: ReplayHeader,
    frames: Vec<ReplayFrame>,
}

impl Default for ReplayRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayRecorder {
    pub fn new() -> Self {
        Self {
            state: ReplayState::Idle,
            header: ReplayHeader::default(),
            frames: Vec::new(),
        }
    }

    // Recording

    pub fn start_recording(&mut self, tick_rate: u32, seed: u32) {
        self.frames.clear();
        self.header = ReplayHeader {
            tick_rate,
            seed,
            ..ReplayHeader::default()
        };
        self.state = ReplayState::Recording;
        info!("ReplayRecorder: recording at {} Hz, seed {}", tick_rate, seed);
    }

    /// Appends a frame. Ignored unless recording.
    pub fn record_frame(&mut self, tick: u32, input: &[u8], state_hash: u64) {
        if self.state != ReplayState::Recording {
            return;
        }
        self.frames.push(ReplayFrame {
            tick,
            input: input.to_vec(),
            state_hash,
        });
        self.header.frame_count = self.frames.len() as u32;
    }

    pub fn stop_recording(&mut self) {
        self.state = ReplayState::Idle;
    }

    // Encoding

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.header.magic.ser(&mut writer);
        REPLAY_VERSION.ser(&mut writer);
        self.header.tick_rate.ser(&mut writer);
        (self.frames.len() as u32).ser(&mut writer);
        self.header.seed.ser(&mut writer);

        for frame in &self.frames {
            frame.tick.ser(&mut writer);
            (frame.input.len() as u32).ser(&mut writer);
            writer.write_bytes(&frame.input);
            frame.state_hash.ser(&mut writer);
        }
        writer.to_bytes()
    }

    /// Replaces the recorder contents with a decoded replay and enters `Playing`.
    /// On failure nothing changes.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), ReplayError> {
        let mut reader = ByteReader::new(bytes);

        let magic = read_header_u32(&mut reader)?;
        if magic != REPLAY_MAGIC {
            return Err(ReplayError::InvalidFormat {
                found: magic,
                expected: REPLAY_MAGIC,
            });
        }
        let version = read_header_u32(&mut reader)?;
        if version == 0 || version > REPLAY_VERSION {
            return Err(ReplayError::VersionMismatch {
                found: version,
                newest: REPLAY_VERSION,
            });
        }
        let header = ReplayHeader {
            magic,
            version,
            tick_rate: read_header_u32(&mut reader)?,
            frame_count: read_header_u32(&mut reader)?,
            seed: read_header_u32(&mut reader)?,
        };

        let mut frames = Vec::with_capacity((header.frame_count as usize).min(reader.remaining()));
        for index in 0..header.frame_count {
            let truncated = || ReplayError::Truncated {
                frame: index,
                frame_count: header.frame_count,
            };
            let tick = u32::de(&mut reader).map_err(|_| truncated())?;
            let size = u32::de(&mut reader).map_err(|_| truncated())?;
            let input = reader.read_bytes(size as usize).map_err(|_| truncated())?.to_vec();
            let state_hash = if version >= 2 {
                u64::de(&mut reader).map_err(|_| truncated())?
            } else {
                0
            };
            frames.push(ReplayFrame {
                tick,
                input,
                state_hash,
            });
        }

        self.header = header;
        self.frames = frames;
        self.state = ReplayState::Playing;
        Ok(())
    }

    // Files

    pub fn save_replay(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "ReplayRecorder: saved {} frames to {}",
            self.frames.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load_replay(&mut self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ReplayError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ReplayError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        self.load_bytes(&bytes).inspect_err(|error| {
            warn!("ReplayRecorder: failed to load {}: {}", path.display(), error);
        })?;
        info!(
            "ReplayRecorder: loaded {} frames from {}",
            self.frames.len(),
            path.display()
        );
        Ok(())
    }

    // Queries

    pub fn frame_at_tick(&self, tick: u32) -> Option<&ReplayFrame> {
        self.frames.iter().find(|frame| frame.tick == tick)
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Tick of the last frame, 0 when empty
    pub fn duration_ticks(&self) -> u32 {
        self.frames.last().map_or(0, |frame| frame.tick)
    }

    pub fn clear(&mut self) {
        self.state = ReplayState::Idle;
        self.header = ReplayHeader::default();
        self.frames.clear();
    }
}

fn read_header_u32(reader: &mut ByteReader) -> Result<u32, ReplayError> {
    u32::de(reader).map_err(|_| ReplayError::Truncated {
        frame: 0,
        frame_count: 0,
    })
}

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that can occur while saving or loading a world save.
///
/// `Ok(())` / `Ok(_)` stands for a successful save or load; every failure
/// kind is its own variant so callers can tell them apart.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The file could not be created, written or read
    #[error("I/O error on save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Nothing exists at the path
    #[error("Save file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The header does not start with the save magic
    #[error("Not a save file: magic {found:#010x}, expected {expected:#010x}")]
    InvalidFormat { found: u32, expected: u32 },

    /// The data ends before the header or a section it declares
    #[error("Save data truncated in {section}: needed {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// The metadata section is not valid UTF-8
    #[error("Save metadata is not valid UTF-8")]
    InvalidMetadata,

    /// The save was written by a different format version
    #[error("Save format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    /// The stored state hash does not match the payload
    #[error("Save state hash mismatch: stored {stored:#018x}, computed {computed:#018x}")]
    HashMismatch { stored: u64, computed: u64 },
}

/// Errors that can occur while reading or writing a replay
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error on replay file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Replay file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Not a replay file: magic {found:#010x}, expected {expected:#010x}")]
    InvalidFormat { found: u32, expected: u32 },

    #[error("Replay format version {found} is not supported (newest is {newest})")]
    VersionMismatch { found: u32, newest: u32 },

    /// The file ended inside the header or a frame
    #[error("Replay truncated at frame {frame} of {frame_count}")]
    Truncated { frame: u32, frame_count: u32 },
}

use lockstep_serde::SerdeErr;
use thiserror::Error;

use crate::{world::error::WorldError, Tick};

/// Errors that can occur in NetContext operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetContextError {
    /// A received packet's checksum does not match its payload. The packet is discarded.
    #[error("Packet for tick {tick} failed checksum: header {found:#010x}, payload {computed:#010x}")]
    InvalidChecksum { tick: u32, found: u32, computed: u32 },

    /// No snapshot was saved for the requested rollback tick
    #[error("No snapshot stored for tick {tick}")]
    SnapshotNotFound { tick: Tick },

    /// The stored snapshot could not be restored into the store
    #[error("Failed to restore snapshot for tick {tick}: {source}")]
    RestoreFailed {
        tick: Tick,
        #[source]
        source: WorldError,
    },

    /// The payload does not fit the 16-bit size field
    #[error("Packet payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    /// Packet bytes could not be decoded
    #[error("Failed to decode packet: {0}")]
    PacketDecode(#[from] SerdeErr),
}

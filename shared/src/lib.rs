//! # Lockstep Shared
//! Deterministic simulation core: entity/component storage, fixed-step
//! scheduling, hash ladders, snapshots, saves, packet framing, rollback and
//! replay, rule-driven replication and connection hardening.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use lockstep_serde::{
    ByteCounter, ByteReader, ByteWrite, ByteWriter, ConstByteLength, Serde, SerdeErr,
};

mod backends;
mod connection;
mod constants;
mod sim;
mod types;
mod world;

pub use backends::FramePacer;
pub use connection::{
    checksum::{compute_checksum, validate_checksum},
    error::NetContextError,
    hardening::{ConnectionQuality, ConnectionState, ConnectionStats, NetHardening, StateCallback},
    hardening_config::{NetHardeningConfig, PacketLossSimConfig},
    input_frame::InputFrame,
    net_config::NetConfig,
    net_context::{InputApplyCallback, NetContext, NetMode, NetPeer, PacketDestination},
    packet::{Packet, MAX_PAYLOAD_BYTES, PACKET_HEADER_BYTES},
};
pub use constants::{
    DEFAULT_TICK_RATE, FNV_OFFSET_BASIS, FNV_PRIME, PACKET_SCHEMA_VERSION, REPLAY_MAGIC,
    REPLAY_VERSION, SAVE_MAGIC, SAVE_VERSION,
};
pub use sim::{
    error::{ReplayError, SaveError},
    replay_recorder::{ReplayFrame, ReplayHeader, ReplayRecorder, ReplayState},
    save_system::{
        decode as decode_save, decode_header as decode_save_header, encode as encode_save,
        SaveData, SaveFile, SaveHeader, SaveSystem, SAVE_HEADER_BYTES,
    },
    sim_mirror::{DesyncCallback, MirrorDesyncEvent, SimMirror, Simulation},
    state_hasher::{hash_combine, point_hash, HashEntry, StateHasher},
    tick_scheduler::TickScheduler,
    world_state::{DerivedRebuildCallback, StateBlockInfo, StateCategory, WorldSnapshot, WorldState},
};
pub use types::{HostType, PeerId, Tick, TypeTag};
pub use world::{
    component::{
        category::{assert_simulation_safe, is_simulation_safe, StateCategorized},
        component_kinds::{ComponentKind, ComponentKinds},
        serializer::{ComponentBox, ComponentSerializer, FnSerializer, SerdeSerializer},
        Component,
    },
    entity::EntityId,
    error::WorldError,
    replication::{
        DeltaCallback, ReplicationDirection, ReplicationError, ReplicationFrequency,
        ReplicationManager, ReplicationRule, DELTA_HEADER_BYTES,
    },
    world_store::{TickCallback, WorldStore, WORLD_HEADER_BYTES},
};

/// Version of the packet framing. Two processes must agree on it to interoperate.
pub const PACKET_SCHEMA_VERSION: u32 = 1;

/// "ASAV"
pub const SAVE_MAGIC: u32 = 0x4153_4156;
pub const SAVE_VERSION: u32 = 1;

/// "RPLY"
pub const REPLAY_MAGIC: u32 = 0x5250_4C59;
pub const REPLAY_VERSION: u32 = 2;

/// FNV-1a 64-bit offset basis, the starting point of every hash ladder
pub const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
pub const FNV_PRIME: u64 = 1_099_511_628_211;

pub const DEFAULT_TICK_RATE: u32 = 30;

use std::fmt;

use lockstep_serde::{ByteReader, ByteWrite, ConstByteLength, Serde, SerdeErr};

/// Identifies an entity for the lifetime of a `WorldStore`. Ids start at 1
/// and are never handed out twice by the same store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Never allocated and never accepted from world data
    pub const RESERVED: Self = Self(u32::MAX);

    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl Serde for EntityId {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u32::de(reader)?))
    }

    fn byte_length(&self) -> u32 {
        <Self as ConstByteLength>::const_byte_length()
    }
}

impl ConstByteLength for EntityId {
    fn const_byte_length() -> u32 {
        4
    }
}

//! Components shared by the end-to-end scenarios

use lockstep_serde::{ByteReader, ByteWrite, ConstByteLength, Serde, SerdeErr};
use lockstep_shared::{TypeTag, WorldStore};

pub const POSITION_TAG: TypeTag = 1;
pub const VELOCITY_TAG: TypeTag = 2;
pub const HEALTH_TAG: TypeTag = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Serde for Position {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
        })
    }

    fn byte_length(&self) -> u32 {
        Self::const_byte_length()
    }
}

impl ConstByteLength for Position {
    fn const_byte_length() -> u32 {
        8
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Velocity {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

impl Serde for Velocity {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.dx.ser(writer);
        self.dy.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            dx: f32::de(reader)?,
            dy: f32::de(reader)?,
        })
    }

    fn byte_length(&self) -> u32 {
        Self::const_byte_length()
    }
}

impl ConstByteLength for Velocity {
    fn const_byte_length() -> u32 {
        8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health(pub u32);

impl Serde for Health {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u32::de(reader)?))
    }

    fn byte_length(&self) -> u32 {
        4
    }
}

pub fn register_components(store: &mut WorldStore) {
    store.register_component::<Position>(POSITION_TAG);
    store.register_component::<Velocity>(VELOCITY_TAG);
    store.register_component::<Health>(HEALTH_TAG);
}

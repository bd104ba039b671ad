use lockstep_serde::{ByteReader, ByteWrite, ByteWriter, ConstByteLength, Serde, SerdeErr};

use crate::PeerId;

/// One player's input for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    pub tick: u32,
    pub player_id: PeerId,
    pub move_x: f32,
    pub move_y: f32,
}

impl InputFrame {
    pub fn new(tick: u32, player_id: PeerId, move_x: f32, move_y: f32) -> Self {
        Self {
            tick,
            player_id,
            move_x,
            move_y,
        }
    }

    /// Encoded form, as folded into the hash ladder
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(Self::const_byte_length() as usize);
        self.ser(&mut writer);
        writer.to_bytes()
    }
}

impl Serde for InputFrame {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.tick.ser(writer);
        self.player_id.ser(writer);
        self.move_x.ser(writer);
        self.move_y.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            tick: u32::de(reader)?,
            player_id: PeerId::de(reader)?,
            move_x: f32::de(reader)?,
            move_y: f32::de(reader)?,
        })
    }

    fn byte_length(&self) -> u32 {
        Self::const_byte_length()
    }
}

impl ConstByteLength for InputFrame {
    fn const_byte_length() -> u32 {
        16
    }
}

use lockstep_serde::{ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr};

use super::{checksum::compute_checksum, error::NetContextError};

/// Size of the `{type, size, tick, checksum}` header
pub const PACKET_HEADER_BYTES: usize = 12;
pub const MAX_PAYLOAD_BYTES: usize = u16::MAX as usize;

/// Wire layout: `{type:u16, size:u16, tick:u32, checksum:u32, payload}`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    pub packet_type: u16,
    /// Payload length in bytes
    pub size: u16,
    pub tick: u32,
    /// CRC-32 of the payload
    pub checksum: u32,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Builds a packet with its size and checksum filled in
    pub fn new(packet_type: u16, tick: u32, payload: Vec<u8>) -> Result<Self, NetContextError> {
        let size = u16::try_from(payload.len()).map_err(|_| NetContextError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_BYTES,
        })?;
        Ok(Self {
            packet_type,
            size,
            tick,
            checksum: compute_checksum(&payload),
            payload,
        })
    }

    /// Recomputes `size` and `checksum` from the payload
    pub fn seal(&mut self) -> Result<(), NetContextError> {
        self.size = u16::try_from(self.payload.len()).map_err(|_| NetContextError::PayloadTooLarge {
            size: self.payload.len(),
            max: MAX_PAYLOAD_BYTES,
        })?;
        self.checksum = compute_checksum(&self.payload);
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(PACKET_HEADER_BYTES + self.payload.len());
        self.ser(&mut writer);
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetContextError> {
        Ok(Self::de(&mut ByteReader::new(bytes))?)
    }
}

impl Serde for Packet {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.packet_type.ser(writer);
        self.size.ser(writer);
        self.tick.ser(writer);
        self.checksum.ser(writer);
        writer.write_bytes(&self.payload);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let packet_type = u16::de(reader)?;
        let size = u16::de(reader)?;
        let tick = u32::de(reader)?;
        let checksum = u32::de(reader)?;
        let payload = reader.read_bytes(usize::from(size))?.to_vec();
        Ok(Self {
            packet_type,
            size,
            tick,
            checksum,
            payload,
        })
    }

    fn byte_length(&self) -> u32 {
        (PACKET_HEADER_BYTES + self.payload.len()) as u32
    }
}

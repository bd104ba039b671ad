use super::packet::Packet;

/// Standard reflected CRC-32 (polynomial 0xEDB88320) over `payload`.
/// An empty payload checksums to 0.
pub fn compute_checksum(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// True if the packet's checksum field matches its payload
pub fn validate_checksum(packet: &Packet) -> bool {
    packet.checksum == compute_checksum(&packet.payload)
}

/// Destination for encoded bytes
pub trait ByteWrite {
    fn write_byte(&mut self, byte: u8);
    fn write_bytes(&mut self, bytes: &[u8]);
    fn is_counter(&self) -> bool;
    fn count_bytes(&mut self, bytes: u32);
}

/// A growable `ByteWrite` backed by a `Vec<u8>`.
/// There is no MTU cap: snapshots and save payloads are written through the
/// same writer as packets.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(256),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn bytes_written(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Overwrites four bytes at `position` with `value`, little-endian.
    /// Used to patch a count that is only known after its items were written.
    /// Returns false if the slot lies outside what has been written.
    pub fn patch_u32(&mut self, position: usize, value: u32) -> bool {
        let Some(slot) = self.buffer.get_mut(position..position + 4) else {
            return false;
        };
        slot.copy_from_slice(&value.to_le_bytes());
        true
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWrite for ByteWriter {
    fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn is_counter(&self) -> bool {
        false
    }

    fn count_bytes(&mut self, _bytes: u32) {
        // ByteWriter writes real bytes, nothing to count
    }
}

/// A `ByteWrite` that discards everything and only tallies length
pub struct ByteCounter {
    count: u32,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Default for ByteCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteWrite for ByteCounter {
    fn write_byte(&mut self, _byte: u8) {
        self.count += 1;
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.count += bytes.len() as u32;
    }

    fn is_counter(&self) -> bool {
        true
    }

    fn count_bytes(&mut self, bytes: u32) {
        self.count += bytes;
    }
}

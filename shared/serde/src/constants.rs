/// Width of every length prefix and every `u32` field on the wire.
pub const U32_BYTES: usize = 4;

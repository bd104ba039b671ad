use crate::{
    byte_reader::ByteReader,
    byte_writer::ByteWrite,
    error::SerdeErr,
    serde::{ConstByteLength, Serde},
};

// Integers & floats, always little-endian

macro_rules! impl_serde_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn ByteWrite) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    let bytes = reader.read_array::<{ std::mem::size_of::<$ty>() }>()?;
                    Ok(<$ty>::from_le_bytes(bytes))
                }

                fn byte_length(&self) -> u32 {
                    <Self as ConstByteLength>::const_byte_length()
                }
            }

            impl ConstByteLength for $ty {
                fn const_byte_length() -> u32 {
                    std::mem::size_of::<$ty>() as u32
                }
            }
        )*
    };
}

impl_serde_le!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

// Bool

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerdeErr::InvalidValue { type_name: "bool" }),
        }
    }

    fn byte_length(&self) -> u32 {
        1
    }
}

impl ConstByteLength for bool {
    fn const_byte_length() -> u32 {
        1
    }
}

// Option

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.is_some().ser(writer);
        if let Some(value) = self {
            value.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn byte_length(&self) -> u32 {
        1 + self.as_ref().map_or(0, Serde::byte_length)
    }
}

// Sequences carry a u32 length prefix

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        (self.len() as u32).ser(writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = u32::de(reader)? as usize;
        // Cap the preallocation: the length prefix is untrusted input
        let mut output = Vec::with_capacity(length.min(reader.remaining()));
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }

    fn byte_length(&self) -> u32 {
        4 + self.iter().map(Serde::byte_length).sum::<u32>()
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        (self.len() as u32).ser(writer);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = u32::de(reader)? as usize;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| SerdeErr::InvalidValue { type_name: "String" })
    }

    fn byte_length(&self) -> u32 {
        4 + self.len() as u32
    }
}

impl<T: Serde + Default + Copy, const N: usize> Serde for [T; N] {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut output = [T::default(); N];
        for slot in output.iter_mut() {
            *slot = T::de(reader)?;
        }
        Ok(output)
    }

    fn byte_length(&self) -> u32 {
        self.iter().map(Serde::byte_length).sum()
    }
}
